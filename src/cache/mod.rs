// Cache module for in-process response caching.
// Keys read requests by URL and serves stored bodies without touching the network.

pub mod interceptor;
pub mod key;
pub mod store;

pub use interceptor::{CacheInterceptor, CacheMetrics};
pub use key::RequestKey;
pub use store::{CacheEntry, CacheStore};
