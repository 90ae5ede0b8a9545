//! Bounded TTL cache for source answers, backed by moka.
//!
//! Answers are kept for a day by default and at most [`DEFAULT_CAPACITY`]
//! queries are remembered per source. Only non-empty successes are stored, so
//! a directory that was down is asked again on the next lookup.

use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache;

use crate::{Source, SourceFut};

/// Default time-to-live.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Default number of distinct queries kept per source.
pub const DEFAULT_CAPACITY: u64 = 1024;

/// How long answers live and how many are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub capacity: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CachePolicy {
    pub(crate) fn build<K, V>(&self) -> Cache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        Cache::builder()
            .max_capacity(self.capacity)
            .time_to_live(self.ttl)
            .build()
    }
}

/// Wraps a source so repeated queries within the TTL skip the network.
pub struct Cached<S, Q: ?Sized + ToOwned, T> {
    inner: S,
    cache: Cache<Q::Owned, Vec<T>>,
}

impl<S, Q, T> Cached<S, Q, T>
where
    Q: ?Sized + ToOwned,
    Q::Owned: Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(inner: S, policy: CachePolicy) -> Self {
        Self {
            inner,
            cache: policy.build(),
        }
    }
}

impl<S, Q, T> Source<Q, T> for Cached<S, Q, T>
where
    S: Source<Q, T>,
    Q: ?Sized + ToOwned + Hash + Eq + Sync,
    Q::Owned: Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn is_embedded(&self) -> bool {
        self.inner.is_embedded()
    }

    fn query<'a>(&'a self, ctx: &'a Q) -> SourceFut<'a, Vec<T>> {
        Box::pin(async move {
            if let Some(hit) = self.cache.get(ctx).await {
                tracing::debug!(source = self.inner.name(), "Cache hit");
                return Ok(hit);
            }

            let values = self.inner.query(ctx).await?;
            if !values.is_empty() {
                self.cache.insert(ctx.to_owned(), values.clone()).await;
            }
            Ok(values)
        })
    }
}
