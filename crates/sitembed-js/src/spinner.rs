//! Loading indicator shown while an embed waits on the network.

use sitembed_common::EmbedError;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlImageElement};

use crate::dom::dom_err;

/// A fresh centered block `<img>` pointing at `src`.
///
/// Every call builds a new element, so removing one spinner never touches
/// another.
pub fn spinner(document: &Document, src: &str) -> Result<HtmlImageElement, EmbedError> {
    let img = document
        .create_element("img")
        .map_err(dom_err)?
        .dyn_into::<HtmlImageElement>()
        .map_err(|_| EmbedError::Dom("created <img> is not an image element".into()))?;
    img.set_src(src);

    let style = img.style();
    style.set_property("display", "block").map_err(dom_err)?;
    style.set_property("margin", "auto").map_err(dom_err)?;
    Ok(img)
}
