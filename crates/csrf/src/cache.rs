//! Single-flight CSRF token cache
//!
//! Holds at most one token and at most one in-flight fetch. The slot is
//! guarded by a `std::sync::Mutex` that is only ever held for synchronous
//! check-and-set sections, never across an `.await`:
//!
//! - `get_token`: cached token → return it; fetch in flight → join it;
//!   otherwise install a new shared fetch *under the lock* and await it.
//! - `refresh_token`: drop the cached token, then join or start a fetch.
//! - `clear_cache`: drop token and in-flight fetch, bump the epoch.
//!
//! The fetch future itself writes the result back into the slot when it
//! settles. A fetch that settles after `clear_cache` carries a stale epoch and
//! is discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, info, warn};
use transport::Transport;

use crate::constants::TOKEN_PATH;
use crate::error::Result;
use crate::token::{CsrfToken, fetch_token};

type PendingFetch = Shared<BoxFuture<'static, Result<CsrfToken>>>;

#[derive(Default)]
struct Slot {
    token: Option<CsrfToken>,
    pending: Option<PendingFetch>,
    epoch: u64,
}

struct Inner {
    slot: Mutex<Slot>,
    transport: Arc<dyn Transport>,
    token_url: String,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write a settled fetch back into the slot, unless the cache was cleared
    /// while it was in flight.
    fn settle(&self, epoch: u64, result: &Result<CsrfToken>) {
        let mut slot = self.lock();
        if slot.epoch != epoch {
            debug!(
                fetch_epoch = epoch,
                current_epoch = slot.epoch,
                "discarding token fetched before cache was cleared"
            );
            return;
        }
        slot.pending = None;
        match result {
            Ok(token) => {
                slot.token = Some(token.clone());
                metrics::counter!("csrf_token_fetches_total", "outcome" => "success").increment(1);
                info!("csrf token fetched");
            }
            Err(e) => {
                metrics::counter!("csrf_token_fetches_total", "outcome" => "failure").increment(1);
                warn!(error = %e, "csrf token fetch failed");
            }
        }
    }
}

/// Process-wide CSRF token holder. Cheap to clone; clones share one slot.
#[derive(Clone)]
pub struct TokenCache {
    inner: Arc<Inner>,
}

impl TokenCache {
    /// Create a cache fetching from `{base_url}/api/csrf-token`.
    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self::with_token_url(transport, format!("{base_url}{TOKEN_PATH}"))
    }

    /// Create a cache fetching from an explicit token URL.
    pub fn with_token_url(transport: Arc<dyn Transport>, token_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot::default()),
                transport,
                token_url: token_url.into(),
            }),
        }
    }

    pub fn token_url(&self) -> &str {
        &self.inner.token_url
    }

    /// Return the cached token, or fetch one.
    ///
    /// Callers arriving while a fetch is in flight share that fetch and
    /// receive the identical result, success or error.
    pub async fn get_token(&self) -> Result<CsrfToken> {
        let pending = {
            let mut slot = self.inner.lock();
            if let Some(token) = &slot.token {
                debug!("csrf token cache hit");
                return Ok(token.clone());
            }
            self.join_or_start(&mut slot)
        };
        pending.await
    }

    /// Force a fresh fetch, replacing the cached token on success.
    ///
    /// The cached token is dropped immediately, so `get_token` calls made
    /// while the refresh is in flight wait for the new value. A refresh that
    /// arrives while a fetch is already in flight joins it.
    pub async fn refresh_token(&self) -> Result<CsrfToken> {
        let pending = {
            let mut slot = self.inner.lock();
            slot.token = None;
            self.join_or_start(&mut slot)
        };
        pending.await
    }

    /// Drop the cached token and forget any in-flight fetch.
    ///
    /// An already-started request is not cancelled; its result is discarded.
    pub fn clear_cache(&self) {
        let mut slot = self.inner.lock();
        slot.token = None;
        slot.pending = None;
        slot.epoch = slot.epoch.wrapping_add(1);
        debug!(epoch = slot.epoch, "csrf token cache cleared");
    }

    /// Whether a token is currently cached (no fetch is triggered).
    pub fn has_token(&self) -> bool {
        self.inner.lock().token.is_some()
    }

    /// Must be called with the slot lock held: this is the check-and-mark
    /// that makes concurrent callers share one fetch.
    fn join_or_start(&self, slot: &mut Slot) -> PendingFetch {
        if let Some(pending) = &slot.pending {
            debug!("joining in-flight csrf token fetch");
            return pending.clone();
        }

        let epoch = slot.epoch;
        let inner = Arc::clone(&self.inner);
        let fetch = async move {
            debug!(url = %inner.token_url, "fetching csrf token");
            let result = fetch_token(inner.transport.as_ref(), &inner.token_url).await;
            inner.settle(epoch, &result);
            result
        }
        .boxed()
        .shared();

        slot.pending = Some(fetch.clone());
        fetch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Duration;
    use transport::{HttpResponse, ScriptedTransport, TransportError};

    const BASE: &str = "http://api.test";
    const TOKEN_URL: &str = "http://api.test/api/csrf-token";

    fn token_response(value: &str) -> HttpResponse {
        HttpResponse::json(200, serde_json::json!({ "csrf_token": value }))
    }

    fn cache_with(transport: &Arc<ScriptedTransport>) -> TokenCache {
        TokenCache::new(transport.clone(), BASE)
    }

    #[test]
    fn token_url_is_base_plus_path() {
        let transport = Arc::new(ScriptedTransport::new());
        let cache = cache_with(&transport);
        assert_eq!(cache.token_url(), TOKEN_URL);
    }

    #[tokio::test]
    async fn first_call_fetches_then_caches() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(TOKEN_URL, token_response("abc"));
        let cache = cache_with(&transport);

        assert!(!cache.has_token());
        let first = cache.get_token().await.unwrap();
        let second = cache.get_token().await.unwrap();

        assert_eq!(first.expose(), "abc");
        assert_eq!(first, second);
        assert!(cache.has_token());
        assert_eq!(transport.calls_to(TOKEN_URL), 1, "second call must hit the cache");
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_latency(Duration::from_millis(20));
        transport.respond(TOKEN_URL, token_response("shared"));
        let cache = cache_with(&transport);

        let (a, b, c) = tokio::join!(cache.get_token(), cache.get_token(), cache.get_token());

        assert_eq!(transport.calls_to(TOKEN_URL), 1);
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert_eq!(a.expose(), "shared");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_across_threads_share_one_fetch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_latency(Duration::from_millis(50));
        transport.respond(TOKEN_URL, token_response("threaded"));
        let cache = cache_with(&transport);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_token().await })
            })
            .collect();

        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.expose(), "threaded");
        }
        assert_eq!(transport.calls_to(TOKEN_URL), 1);
    }

    #[tokio::test]
    async fn failure_rejects_all_waiters_and_frees_the_slot() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_latency(Duration::from_millis(20));
        transport.respond(TOKEN_URL, HttpResponse::new(500, "boom"));
        let cache = cache_with(&transport);

        let (a, b) = tokio::join!(cache.get_token(), cache.get_token());
        let expected = Error::Rejected {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(a.unwrap_err(), expected);
        assert_eq!(b.unwrap_err(), expected);
        assert_eq!(transport.calls_to(TOKEN_URL), 1);
        assert!(!cache.has_token());

        // The in-flight marker was cleared, so the next call fetches again
        transport.respond(TOKEN_URL, token_response("recovered"));
        let token = cache.get_token().await.unwrap();
        assert_eq!(token.expose(), "recovered");
        assert_eq!(transport.calls_to(TOKEN_URL), 2);
    }

    #[tokio::test]
    async fn refresh_bypasses_warm_cache() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond(TOKEN_URL, token_response("old"))
            .respond(TOKEN_URL, token_response("new"));
        let cache = cache_with(&transport);

        assert_eq!(cache.get_token().await.unwrap().expose(), "old");
        let refreshed = cache.refresh_token().await.unwrap();
        assert_eq!(refreshed.expose(), "new");
        assert_eq!(transport.calls_to(TOKEN_URL), 2);

        let after = cache.get_token().await.unwrap();
        assert_eq!(after.expose(), "new");
        assert_eq!(transport.calls_to(TOKEN_URL), 2);
    }

    #[tokio::test]
    async fn get_during_refresh_sees_new_value() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond(TOKEN_URL, token_response("old"))
            .respond(TOKEN_URL, token_response("new"));
        let cache = cache_with(&transport);
        cache.get_token().await.unwrap();

        transport.set_latency(Duration::from_millis(20));
        let (refreshed, got) = tokio::join!(cache.refresh_token(), cache.get_token());

        assert_eq!(refreshed.unwrap().expose(), "new");
        assert_eq!(got.unwrap().expose(), "new");
        assert_eq!(transport.calls_to(TOKEN_URL), 2);
    }

    #[tokio::test]
    async fn concurrent_refreshes_coalesce() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_latency(Duration::from_millis(20));
        transport.respond(TOKEN_URL, token_response("fresh"));
        let cache = cache_with(&transport);

        let (a, b) = tokio::join!(cache.refresh_token(), cache.refresh_token());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(transport.calls_to(TOKEN_URL), 1);
    }

    #[tokio::test]
    async fn clear_cache_forces_refetch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond(TOKEN_URL, token_response("first"))
            .respond(TOKEN_URL, token_response("second"));
        let cache = cache_with(&transport);

        cache.get_token().await.unwrap();
        cache.clear_cache();
        assert!(!cache.has_token());

        let token = cache.get_token().await.unwrap();
        assert_eq!(token.expose(), "second");
        assert_eq!(transport.calls_to(TOKEN_URL), 2);
    }

    #[tokio::test]
    async fn fetch_orphaned_by_clear_is_not_stored() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_latency(Duration::from_millis(20));
        transport
            .respond(TOKEN_URL, token_response("orphan"))
            .respond(TOKEN_URL, token_response("current"));
        let cache = cache_with(&transport);

        let orphan = cache.get_token();
        let clear_then_get = async {
            tokio::task::yield_now().await;
            cache.clear_cache();
            cache.get_token().await
        };
        let (orphan, current) = tokio::join!(orphan, clear_then_get);

        // The caller that started the orphaned fetch still gets its result
        assert_eq!(orphan.unwrap().expose(), "orphan");
        assert_eq!(current.unwrap().expose(), "current");
        assert_eq!(transport.calls_to(TOKEN_URL), 2);

        // Only the post-clear fetch landed in the slot
        assert_eq!(cache.get_token().await.unwrap().expose(), "current");
        assert_eq!(transport.calls_to(TOKEN_URL), 2);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_transport_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail(TOKEN_URL, TransportError::Connect("refused".into()));
        let cache = cache_with(&transport);

        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    }
}
