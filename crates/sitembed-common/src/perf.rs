//! Timing helpers for fetch instrumentation.
//!
//! The embeds wrap each comment fetch and snippet round trip in a
//! [`TimingGuard`] so slow remotes show up in the debug log.

/// Millisecond clock the fetch timings are measured against.
///
/// Reads the page's `Performance` clock when running in the browser, so
/// timings line up with the devtools network panel; native test builds
/// fall back to a monotonic clock started on first use.
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub fn now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

#[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
pub fn now() -> f64 {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    let start = START.get_or_init(Instant::now);
    start.elapsed().as_secs_f64() * 1000.0
}

/// Logs the elapsed time at debug level when dropped.
pub struct TimingGuard {
    label: &'static str,
    start: f64,
}

impl TimingGuard {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        now() - self.start
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        tracing::debug!(elapsed_ms = self.elapsed_ms(), "{}", self.label);
    }
}
