//! Page-lifetime cache of shared in-flight results.
//!
//! Each key maps to a [`Shared`] future. The first caller for a key creates
//! the future; every later caller (whether the future is still pending or
//! already complete) gets a clone of the same handle, so the underlying work
//! runs at most once per key. Entries are never evicted.
//!
//! The cache is single-threaded by construction (`RefCell`), matching the
//! browser event loop it lives on.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use futures_util::future::{FutureExt, Shared};

pub struct SharedCache<K, F: Future> {
    entries: RefCell<HashMap<K, Shared<F>>>,
}

impl<K, F> SharedCache<K, F>
where
    K: Hash + Eq,
    F: Future,
    F::Output: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Return the shared result for `key`, calling `factory` only on a miss.
    ///
    /// The entry is stored before the future is ever polled, so concurrent
    /// callers collapse onto the same pending result.
    pub fn get_or_create(&self, key: K, factory: impl FnOnce() -> F) -> Shared<F> {
        let mut entries = self.entries.borrow_mut();
        entries
            .entry(key)
            .or_insert_with(|| factory().shared())
            .clone()
    }

    /// Whether `key` already has an entry, pending or complete.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.borrow().contains_key(key)
    }

    #[cfg(test)]
    fn peek(&self, key: &K) -> Option<F::Output> {
        self.entries.borrow().get(key).and_then(|s| s.peek().cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<K, F> Default for SharedCache<K, F>
where
    K: Hash + Eq,
    F: Future,
    F::Output: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::{BoxFuture, join};
    use std::cell::Cell;
    use tokio::sync::oneshot;

    type Fut = BoxFuture<'static, Result<String, String>>;

    #[tokio::test]
    async fn one_factory_call_per_key() {
        let cache: SharedCache<&str, Fut> = SharedCache::new();
        let calls = Cell::new(0);

        let make = || {
            calls.set(calls.get() + 1);
            async { Ok::<_, String>("payload".to_string()) }.boxed()
        };

        let a = cache.get_or_create("gist_a.rs", make);
        let b = cache.get_or_create("gist_a.rs", make);
        let (a, b) = join(a, b).await;

        assert_eq!(calls.get(), 1);
        assert_eq!(a, Ok("payload".to_string()));
        assert_eq!(a, b);

        // Completed entries are reused too.
        let c = cache.get_or_create("gist_a.rs", make).await;
        assert_eq!(calls.get(), 1);
        assert_eq!(c, a);
    }

    #[tokio::test]
    async fn pending_entry_is_shared_before_it_resolves() {
        let cache: SharedCache<String, Fut> = SharedCache::new();
        let (tx, rx) = oneshot::channel::<String>();

        let first = cache.get_or_create("k".into(), || {
            async move { rx.await.map_err(|e| e.to_string()) }.boxed()
        });
        assert!(cache.contains(&"k".to_string()));
        assert_eq!(cache.peek(&"k".to_string()), None);

        let second = cache.get_or_create("k".into(), || {
            async { Err("second factory must not run".to_string()) }.boxed()
        });

        tx.send("resolved".into()).unwrap();
        let (first, second) = join(first, second).await;
        assert_eq!(first, Ok("resolved".to_string()));
        assert_eq!(second, Ok("resolved".to_string()));
        assert_eq!(cache.peek(&"k".to_string()), Some(Ok("resolved".to_string())));
    }

    #[tokio::test]
    async fn failures_stay_cached() {
        let cache: SharedCache<&str, Fut> = SharedCache::new();
        let calls = Cell::new(0);
        let make = || {
            calls.set(calls.get() + 1);
            async { Err::<String, _>("timeout".to_string()) }.boxed()
        };

        assert!(cache.get_or_create("k", make).await.is_err());
        assert!(cache.get_or_create("k", make).await.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn distinct_keys_get_distinct_entries() {
        let cache: SharedCache<&str, Fut> = SharedCache::default();
        assert!(cache.is_empty());
        let _ = cache.get_or_create("a", || async { Ok("a".to_string()) }.boxed());
        let _ = cache.get_or_create("b", || async { Ok("b".to_string()) }.boxed());
        assert_eq!(cache.len(), 2);
    }
}
