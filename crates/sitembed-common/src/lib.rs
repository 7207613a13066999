//! Shared pieces for the sitembed widgets: errors, configuration and the
//! per-page result cache.

pub mod cache;
pub mod config;
pub mod error;
#[cfg(feature = "perf")]
pub mod perf;

pub use crate::cache::SharedCache;
pub use crate::config::EmbedConfig;
pub use crate::error::{EmbedError, LineRangeError};
