//! Issue comments rendered into the page's comment section.

use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use sitembed_common::perf::TimingGuard;
use sitembed_common::{EmbedConfig, EmbedError};
use sitembed_renderer::{CommentRecord, Localize, render_comments, render_failure};
use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::dom::{self, to_js};

const HTML_JSON: &str = "application/vnd.github.html+json";

/// Fetch the comments of issue `thread_id` and append them to the comment
/// container.
///
/// Throws when the container is missing; every later failure is rendered
/// into the container as a single line.
#[wasm_bindgen]
pub fn embed_comments(thread_id: JsValue) -> Result<(), JsError> {
    let config = crate::config();
    let thread_id = thread_id_from_js(&thread_id).map_err(to_js)?;

    let document = dom::document().map_err(to_js)?;
    let container = dom::container(&document, &config.comment_container_id).map_err(|e| {
        tracing::error!("comment embed: {e}");
        to_js(e)
    })?;

    let spinner = crate::spinner::spinner(&document, &config.spinner_src).map_err(to_js)?;
    container
        .append_child(&spinner)
        .map_err(|e| to_js(dom::dom_err(e)))?;

    wasm_bindgen_futures::spawn_local(async move {
        let rendered = match fetch_comments(&config, &thread_id, &spinner).await {
            Ok(comments) => {
                tracing::debug!(thread = %thread_id, count = comments.len(), "rendering comments");
                render_comments(&comments, &config, &BrowserLocale)
            }
            Err(e) => Err(e),
        };
        // Requests that never left (bad config) still hold the spinner.
        spinner.remove();

        let html = rendered.or_else(|e| {
            tracing::warn!(thread = %thread_id, "comment embed failed: {e}");
            render_failure(&e)
        });
        if let Err(e) = html.and_then(|html| dom::append_html(&container, &html)) {
            tracing::error!(thread = %thread_id, "could not render comments: {e}");
        }
    });
    Ok(())
}

async fn fetch_comments(
    config: &EmbedConfig,
    thread_id: &str,
    spinner: &Element,
) -> Result<Vec<CommentRecord>, EmbedError> {
    let url = config.comments_url(thread_id)?;
    let _timing = TimingGuard::new("comment fetch");

    let response = reqwest::Client::new()
        .get(url)
        .header(ACCEPT, HTML_JSON)
        .send()
        .await;
    // The status is known (or the request failed); the body may still be in flight.
    spinner.remove();

    let response = response.map_err(|e| EmbedError::Transport(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(EmbedError::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
        });
    }

    response
        .json::<Vec<CommentRecord>>()
        .await
        .map_err(|e| EmbedError::Decode(e.to_string()))
}

/// Issue numbers arrive either as JS numbers or strings.
pub fn thread_id_from_js(value: &JsValue) -> Result<String, EmbedError> {
    if let Some(s) = value.as_string() {
        if !s.is_empty() {
            return Ok(s);
        }
    } else if let Some(n) = value.as_f64() {
        if n.fract() == 0.0 && n >= 0.0 && n <= u64::MAX as f64 {
            return Ok(format!("{}", n as u64));
        }
    }
    Err(EmbedError::Config(format!(
        "thread id must be a non-empty string or a whole number, got {value:?}"
    )))
}

/// Formats timestamps with the browser's locale, like `Date#toLocaleString`.
pub struct BrowserLocale;

impl Localize for BrowserLocale {
    fn localize(&self, at: &DateTime<Utc>) -> String {
        let date = js_sys::Date::new(&JsValue::from_f64(at.timestamp_millis() as f64));
        date.to_locale_string("default", &JsValue::UNDEFINED).into()
    }
}
