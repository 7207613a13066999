//! Code-snippet embeds, memoized per (snippet, file).

use std::rc::Rc;

use futures_util::future::{FutureExt, LocalBoxFuture, Shared};
use sitembed_common::perf::TimingGuard;
use sitembed_common::{EmbedConfig, EmbedError, SharedCache};
use sitembed_renderer::{LineRange, LineRanges, SnippetKey, SnippetResponse, render_failure};
use wasm_bindgen::prelude::*;
use web_sys::{Document, DocumentFragment, Element, HtmlElement, HtmlLinkElement};

use crate::dom::{self, dom_err, to_js};
use crate::jsonp::JsonpBridge;

pub type SnippetResult = Result<Rc<SnippetResponse>, EmbedError>;
pub type SnippetFetch = Shared<LocalBoxFuture<'static, SnippetResult>>;

/// Template chrome dropped from every embed.
const CHROME_SELECTOR: &str = ".gist-meta, .blob-num";

thread_local! {
    static SNIPPETS: SnippetEmbedder = SnippetEmbedder::new();
}

/// Scripts injected by the page-wide embedder so far.
#[doc(hidden)]
pub fn page_fetches_issued() -> u64 {
    SNIPPETS.with(|snippets| snippets.fetches_issued())
}

/// Owns the page-lifetime snippet cache and the bridge used to fill it.
pub struct SnippetEmbedder {
    cache: SharedCache<SnippetKey, LocalBoxFuture<'static, SnippetResult>>,
    bridge: Rc<JsonpBridge>,
}

impl SnippetEmbedder {
    pub fn new() -> Self {
        Self {
            cache: SharedCache::new(),
            bridge: Rc::new(JsonpBridge::new()),
        }
    }

    /// The shared fetch for `key`, started lazily on first poll.
    ///
    /// At most one fetch is ever created per key; success and failure are
    /// both final for the page session.
    pub fn request(&self, key: SnippetKey, config: &EmbedConfig) -> SnippetFetch {
        tracing::debug!(%key, shared = self.cache.contains(&key), "snippet requested");
        let bridge = self.bridge.clone();
        let config = config.clone();
        let fetch_key = key.clone();
        self.cache.get_or_create(key, move || {
            async move { fetch_snippet(&bridge, &config, &fetch_key).await.map(Rc::new) }
                .boxed_local()
        })
    }

    #[doc(hidden)]
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }

    #[doc(hidden)]
    pub fn fetches_issued(&self) -> u64 {
        self.bridge.issued()
    }
}

impl Default for SnippetEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

async fn fetch_snippet(
    bridge: &JsonpBridge,
    config: &EmbedConfig,
    key: &SnippetKey,
) -> Result<SnippetResponse, EmbedError> {
    let _timing = TimingGuard::new("snippet fetch");
    tracing::debug!(%key, "fetching snippet");
    let value = bridge
        .request(
            |callback| config.snippet_url(&key.snippet_id, &key.file, callback),
            config.snippet_timeout_ms,
        )
        .await?;
    serde_wasm_bindgen::from_value(value).map_err(|e| EmbedError::Decode(e.to_string()))
}

/// Embed `file` from snippet `snippet_id` into the element `container_id`,
/// keeping only `lines` when given.
///
/// `lines` is `undefined`, `null`, or an array of `[start, end]` / `[start]`
/// row ranges. Throws when the container is missing. Malformed ranges and
/// fetch failures are rendered into the container.
#[wasm_bindgen]
pub fn embed_gist(
    snippet_id: &str,
    file: &str,
    lines: JsValue,
    container_id: &str,
) -> Result<(), JsError> {
    let config = crate::config();
    let document = dom::document().map_err(to_js)?;
    let container = dom::container(&document, container_id).map_err(|e| {
        tracing::error!("snippet embed: {e}");
        to_js(e)
    })?;

    let ranges = match line_ranges_from_js(lines) {
        Ok(ranges) => ranges,
        Err(e) => {
            tracing::warn!(container = container_id, "rejected line ranges: {e}");
            let html = render_failure(&e).map_err(to_js)?;
            return dom::append_html(&container, &html).map_err(to_js);
        }
    };

    let spinner = crate::spinner::spinner(&document, &config.spinner_src).map_err(to_js)?;
    container
        .append_child(&spinner)
        .map_err(|e| to_js(dom_err(e)))?;

    let key = SnippetKey::new(snippet_id, file);
    let fetch = SNIPPETS.with(|snippets| snippets.request(key.clone(), &config));

    wasm_bindgen_futures::spawn_local(async move {
        let rendered = fetch
            .await
            .and_then(|response| build_snippet(&document, &response, &ranges));
        spinner.remove();

        let result = match rendered {
            Ok((link, fragment)) => container
                .append_child(&link)
                .and_then(|_| container.append_child(&fragment))
                .map(|_| ())
                .map_err(dom_err),
            Err(e) => {
                tracing::warn!(%key, "snippet embed failed: {e}");
                render_failure(&e).and_then(|html| dom::append_html(&container, &html))
            }
        };
        if let Err(e) = result {
            tracing::error!(%key, "could not render snippet: {e}");
        }
    });
    Ok(())
}

/// Stylesheet link plus the cleaned, trimmed snippet markup.
pub fn build_snippet(
    document: &Document,
    response: &SnippetResponse,
    ranges: &LineRanges,
) -> Result<(HtmlLinkElement, DocumentFragment), EmbedError> {
    let link = document
        .create_element("link")
        .map_err(dom_err)?
        .dyn_into::<HtmlLinkElement>()
        .map_err(|_| EmbedError::Dom("created <link> is not a link element".into()))?;
    link.set_rel("stylesheet");
    link.set_href(&response.stylesheet);

    let fragment = snippet_fragment(document, &response.div, ranges)?;
    Ok((link, fragment))
}

/// Parse snippet markup into a detached fragment, strip the template
/// chrome, and drop rows outside `ranges`.
pub fn snippet_fragment(
    document: &Document,
    html: &str,
    ranges: &LineRanges,
) -> Result<DocumentFragment, EmbedError> {
    let fragment = document
        .create_range()
        .map_err(dom_err)?
        .create_contextual_fragment(html)
        .map_err(dom_err)?;

    let chrome = fragment.query_selector_all(CHROME_SELECTOR).map_err(dom_err)?;
    for i in 0..chrome.length() {
        if let Some(el) = chrome.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
            el.remove();
        }
    }

    if let Some(data) = fragment.query_selector(".gist-data").map_err(dom_err)? {
        if let Some(data) = data.dyn_ref::<HtmlElement>() {
            data.style()
                .set_property("border-bottom", "initial")
                .map_err(dom_err)?;
        }
    }

    if !ranges.is_empty() {
        let rows = fragment.query_selector_all("tbody > tr").map_err(dom_err)?;
        let keep = ranges.retained(rows.length() as usize)?;
        for (i, keep) in keep.into_iter().enumerate() {
            if keep {
                continue;
            }
            if let Some(row) = rows.item(i as u32).and_then(|n| n.dyn_into::<Element>().ok()) {
                row.remove();
            }
        }
    }

    Ok(fragment)
}

/// `undefined` and `null` mean "keep every line".
pub fn line_ranges_from_js(lines: JsValue) -> Result<LineRanges, EmbedError> {
    if lines.is_undefined() || lines.is_null() {
        return Ok(LineRanges::default());
    }
    let ranges: Vec<LineRange> = serde_wasm_bindgen::from_value(lines)
        .map_err(|e| EmbedError::Config(format!("invalid line ranges: {e}")))?;
    Ok(LineRanges::new(ranges)?)
}
