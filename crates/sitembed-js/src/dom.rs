//! Small DOM lookups shared by the embeds.

use sitembed_common::EmbedError;
use wasm_bindgen::{JsCast, JsError, JsValue};
use web_sys::{Document, Element};

pub fn document() -> Result<Document, EmbedError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| EmbedError::Dom("no document available".into()))
}

/// The host-page element an embed renders into.
pub fn container(document: &Document, id: &str) -> Result<Element, EmbedError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| EmbedError::MissingContainer(id.to_owned()))
}

/// Append markup at the end of `element`'s children.
pub fn append_html(element: &Element, html: &str) -> Result<(), EmbedError> {
    element
        .insert_adjacent_html("beforeend", html)
        .map_err(dom_err)
}

pub fn dom_err(value: JsValue) -> EmbedError {
    let message = value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"));
    EmbedError::Dom(message)
}

/// Error handed back across the binding boundary.
pub fn to_js(err: EmbedError) -> JsError {
    JsError::new(&err.to_string())
}
