//! WASM bindings for the sitembed widgets.
//!
//! Exposes to the page:
//!
//! - `configure(options)`: site settings, see [`EmbedConfig`]
//! - `createSpinner()`: a standalone loading indicator
//! - `embed_comments(threadId)`: issue comments into the comment section
//! - `embed_gist(snippetId, file, lines, containerId)`: one snippet file,
//!   optionally trimmed to line ranges
//!
//! Everything runs on the page's event loop; page-lifetime state lives in
//! thread-locals.

use std::cell::RefCell;

use sitembed_common::EmbedConfig;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

pub mod comments;
pub mod dom;
pub mod jsonp;
pub mod snippet;
pub mod spinner;

pub use comments::embed_comments;
pub use snippet::{SnippetEmbedder, embed_gist};

thread_local! {
    static CONFIG: RefCell<EmbedConfig> = RefCell::new(EmbedConfig::default());
}

/// Snapshot of the current settings.
pub fn config() -> EmbedConfig {
    CONFIG.with(|c| c.borrow().clone())
}

/// Install panic and logging hooks.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    #[cfg(all(target_family = "wasm", target_os = "unknown"))]
    {
        use tracing::Level;
        use tracing::subscriber::set_global_default;
        use tracing_subscriber::Registry;
        use tracing_subscriber::layer::SubscriberExt;

        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };

        let wasm_layer = tracing_wasm::WASMLayer::new(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(console_level)
                .build(),
        );

        let _ = set_global_default(Registry::default().with(wasm_layer));
    }
}

/// Replace the site settings.
///
/// Accepts a plain object with any subset of the camelCase
/// [`EmbedConfig`] keys; missing keys take their defaults. `undefined`
/// resets everything.
#[wasm_bindgen]
pub fn configure(options: JsValue) -> Result<(), JsError> {
    let config = if options.is_undefined() || options.is_null() {
        EmbedConfig::default()
    } else {
        serde_wasm_bindgen::from_value::<EmbedConfig>(options)
            .map_err(|e| JsError::new(&format!("Invalid embed options: {}", e)))?
    };
    tracing::debug!(?config, "embed configuration updated");
    CONFIG.with(|c| *c.borrow_mut() = config);
    Ok(())
}

/// A new loading indicator using the configured image.
#[wasm_bindgen(js_name = createSpinner)]
pub fn create_spinner() -> Result<HtmlImageElement, JsError> {
    let config = config();
    let document = dom::document().map_err(dom::to_js)?;
    spinner::spinner(&document, &config.spinner_src).map_err(dom::to_js)
}
