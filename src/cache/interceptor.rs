// Read-through response cache for GET requests.
// Serves stored bodies for repeated reads and records successful responses as they stream past.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{StreamExt, future, stream};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::Result;
use crate::http::{EventStream, Handler, HttpEvent, HttpRequest, HttpResponse};

use super::key::RequestKey;
use super::store::CacheStore;

/// Counters collected by the interceptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    /// Reads answered from the store.
    pub hits: u64,
    /// Reads forwarded because no entry existed.
    pub misses: u64,
    /// Requests forwarded without consulting the store.
    pub bypassed: u64,
    /// Successful responses written to the store.
    pub stored: u64,
}

impl CacheMetrics {
    /// Fraction of reads served from the store.
    pub fn hit_ratio(&self) -> f64 {
        let reads = self.hits + self.misses;
        if reads == 0 {
            0.0
        } else {
            self.hits as f64 / reads as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    bypassed: AtomicU64,
    stored: AtomicU64,
}

/// Handler that wraps another handler with a per-URL response cache.
///
/// Only GET requests are cached, keyed by [`RequestKey`]. Entries never expire.
/// Write requests pass straight through and do not invalidate anything.
/// Concurrent misses on one key are all forwarded, and the last successful
/// completion wins.
#[derive(Debug, Clone)]
pub struct CacheInterceptor<H> {
    next: H,
    store: CacheStore,
    enabled: bool,
    counters: Arc<Counters>,
}

impl<H: Handler> CacheInterceptor<H> {
    /// Wrap a handler with an empty cache.
    pub fn new(next: H) -> Self {
        Self::with_store(next, CacheStore::new())
    }

    /// Wrap a handler with an existing, possibly shared, store.
    pub fn with_store(next: H, store: CacheStore) -> Self {
        Self {
            next,
            store,
            enabled: true,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn from_config(next: H, config: &Config) -> Self {
        let mut interceptor = Self::new(next);
        interceptor.set_enabled(config.cache_enabled);
        interceptor
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &H {
        &self.next
    }

    /// Drop every stored entry.
    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            bypassed: self.counters.bypassed.load(Ordering::Relaxed),
            stored: self.counters.stored.load(Ordering::Relaxed),
        }
    }
}

impl<H: Handler> Handler for CacheInterceptor<H> {
    fn handle(&self, request: HttpRequest) -> EventStream {
        if !self.enabled || !request.is_read() {
            self.counters.bypassed.fetch_add(1, Ordering::Relaxed);
            debug!(method = %request.method, url = %request.url, "cache bypass");
            return self.next.handle(request);
        }

        let key = RequestKey::from_request(&request);

        if let Some(entry) = self.store.get(&key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "cache hit");
            let event: Result<HttpEvent> = Ok(HttpEvent::Response(HttpResponse::ok(entry.body)));
            return Box::pin(stream::once(future::ready(event)));
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "cache miss");

        let store = self.store.clone();
        let counters = self.counters.clone();

        Box::pin(self.next.handle(request).inspect(move |event| {
            if let Ok(HttpEvent::Response(response)) = event {
                if response.is_success() {
                    store.insert(key.clone(), response.body.clone());
                    counters.stored.fetch_add(1, Ordering::Relaxed);
                    trace!(key = %key, "stored response");
                }
            }
        }))
    }
}
