//! Script-tag callback bridge for cross-origin JSONP endpoints.
//!
//! Each request gets its own generated global name, so the page-global
//! namespace is only touched for the duration of one request and never
//! depends on caller-supplied ids. A request ends when the callback fires,
//! the script fails to load, or the timeout elapses, whichever comes first.

use std::cell::{Cell, RefCell};
use std::pin::pin;
use std::rc::Rc;

use futures_util::future::{Either, select};
use gloo_timers::future::TimeoutFuture;
use sitembed_common::EmbedError;
use tokio::sync::oneshot;
use url::Url;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlScriptElement};

use crate::dom::{self, dom_err};

pub const CALLBACK_PREFIX: &str = "__sitembed_jsonp_";

type Outcome = Result<JsValue, EmbedError>;
type PendingSender = Rc<RefCell<Option<oneshot::Sender<Outcome>>>>;

thread_local! {
    // Shared by every bridge so generated globals never collide on a page.
    static NEXT_CALLBACK: Cell<u64> = const { Cell::new(0) };
}

#[derive(Debug, Default)]
pub struct JsonpBridge {
    issued: Cell<u64>,
}

impl JsonpBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_callback(&self) -> String {
        self.issued.set(self.issued.get() + 1);
        let id = NEXT_CALLBACK.with(|next| next.replace(next.get() + 1));
        format!("{CALLBACK_PREFIX}{id}")
    }

    /// Number of requests this bridge has issued.
    pub fn issued(&self) -> u64 {
        self.issued.get()
    }

    /// Inject a script whose URL is built by `url_for` from the generated
    /// callback name, and wait for the remote to call it.
    pub async fn request(
        &self,
        url_for: impl FnOnce(&str) -> Result<Url, EmbedError>,
        timeout_ms: u32,
    ) -> Result<JsValue, EmbedError> {
        let callback = self.next_callback();
        let url = url_for(&callback)?;

        let window = web_sys::window().ok_or_else(|| EmbedError::Dom("no window".into()))?;
        let document = dom::document()?;

        let (tx, rx) = oneshot::channel::<Outcome>();
        let tx: PendingSender = Rc::new(RefCell::new(Some(tx)));

        let on_data = {
            let tx = tx.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(Ok(value));
                }
            })
        };
        let on_error = {
            let tx = tx.clone();
            let src = url.to_string();
            Closure::<dyn FnMut(Event)>::new(move |_: Event| {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(Err(EmbedError::ScriptLoad(src.clone())));
                }
            })
        };

        let key = JsValue::from_str(&callback);
        js_sys::Reflect::set(&window, &key, on_data.as_ref()).map_err(dom_err)?;

        let script = document
            .create_element("script")
            .map_err(dom_err)?
            .dyn_into::<HtmlScriptElement>()
            .map_err(|_| EmbedError::Dom("created <script> is not a script element".into()))?;
        script.set_async(true);
        script.set_src(url.as_str());
        script.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        tracing::debug!(%callback, src = %url, "injecting callback script");
        let attached = match document.head() {
            Some(head) => head.append_child(&script),
            None => document
                .document_element()
                .ok_or_else(|| EmbedError::Dom("document has no root element".into()))?
                .append_child(&script),
        };

        let outcome = match attached {
            Err(e) => Err(dom_err(e)),
            Ok(_) => {
                let rx = pin!(rx);
                let timeout = pin!(TimeoutFuture::new(timeout_ms));
                match select(rx, timeout).await {
                    Either::Left((Ok(outcome), _)) => outcome,
                    Either::Left((Err(_), _)) => {
                        Err(EmbedError::Transport("callback channel closed".into()))
                    }
                    Either::Right(((), _)) => {
                        tracing::warn!(%callback, timeout_ms, "callback script timed out");
                        Err(EmbedError::Timeout(timeout_ms))
                    }
                }
            }
        };

        // A late response after a timeout lands on a no-op instead of a
        // missing global.
        let released = match &outcome {
            Err(EmbedError::Timeout(_)) => {
                js_sys::Reflect::set(&window, &key, &js_sys::Function::new_no_args(""))
            }
            _ => js_sys::Reflect::delete_property(&window, &key),
        };
        match released {
            Ok(true) => {}
            Ok(false) => tracing::debug!(%callback, "callback global was not released"),
            Err(e) => tracing::debug!(%callback, "releasing callback global threw: {e:?}"),
        }
        script.set_onerror(None);
        script.remove();
        drop(on_data);
        drop(on_error);

        outcome
    }
}
