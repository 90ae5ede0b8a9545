//! Location and institution directory clients with priority fallback.
//!
//! # Architecture
//!
//! Every directory is a [`Source`]: a black-box asynchronous provider of a
//! list of values for some query context. Sources are registered in a
//! [`SourceChain`] with a priority; the chain asks them in order and stops at
//! the first non-empty answer.
//!
//! | Module | Directory |
//! |--------|-----------|
//! | [`countries`] | State and city names (countriesnow.space) |
//! | [`geocoder`] | Universities/colleges inside a named area (Overpass) |
//! | [`universities`] | Country-wide university list filtered by name (Hipolabs) |
//! | [`internal`] | The portal's own `/api/...` endpoints |
//! | [`pincode`] | Postal PIN code to state/district |
//! | [`embedded`] | Static tables that never fail |
//! | [`cache`] | Bounded TTL wrapper for any source |
//!
//! # Error Handling
//!
//! Sources fail soft. A transport failure, an empty answer and an unexpected
//! payload are all [`SourceError`]s, and the chain treats each of them as
//! "try the next source". Nothing here panics on bad input from the network.

pub mod cache;
pub mod countries;
pub mod embedded;
pub mod geocoder;
pub mod http;
pub mod internal;
pub mod pincode;
pub mod retry;
pub mod universities;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use enrol_types;
use enrol_types::{PinCode, PostalLocation, SourceError};

/// Future returned by every source.
pub type SourceFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// A provider of candidate values for a query context `Q`.
///
/// An empty answer should be reported as `Err(SourceError::Empty)`, but the
/// chain also treats `Ok(vec![])` as empty.
pub trait Source<Q: ?Sized, T = String>: Send + Sync {
    /// Short stable name used in logs.
    fn name(&self) -> &'static str;

    fn query<'a>(&'a self, ctx: &'a Q) -> SourceFut<'a, Vec<T>>;

    /// True for static tables compiled into the binary.
    fn is_embedded(&self) -> bool {
        false
    }
}

/// Resolves a postal code to a state and district.
pub trait PostalSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn lookup<'a>(&'a self, code: &'a PinCode) -> SourceFut<'a, PostalLocation>;
}

/// One source that did not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: &'static str,
    pub error: SourceError,
}

/// Result of walking a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome<T> {
    Found {
        source: &'static str,
        embedded: bool,
        values: Vec<T>,
        /// Sources tried before the one that answered.
        skipped: Vec<SourceFailure>,
    },
    Exhausted {
        failures: Vec<SourceFailure>,
    },
}

impl<T> ChainOutcome<T> {
    /// The values found, or an empty list.
    pub fn into_values(self) -> Vec<T> {
        match self {
            ChainOutcome::Found { values, .. } => values,
            ChainOutcome::Exhausted { .. } => Vec::new(),
        }
    }

    pub fn source(&self) -> Option<&'static str> {
        match self {
            ChainOutcome::Found { source, .. } => Some(*source),
            ChainOutcome::Exhausted { .. } => None,
        }
    }
}

struct ChainEntry<Q: ?Sized, T> {
    priority: i32,
    source: Arc<dyn Source<Q, T>>,
}

/// Sources for one query type, asked in ascending priority order.
///
/// Sources with equal priority keep their registration order.
pub struct SourceChain<Q: ?Sized, T = String> {
    entries: Vec<ChainEntry<Q, T>>,
}

impl<Q: ?Sized, T> Default for SourceChain<Q, T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<Q: ?Sized, T> fmt::Debug for SourceChain<Q, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.priority, e.source.name())))
            .finish()
    }
}

impl<Q, T> SourceChain<Q, T>
where
    Q: ?Sized + Sync,
    T: Send,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source. Builder form of [`SourceChain::push`].
    #[must_use]
    pub fn with(mut self, priority: i32, source: impl Source<Q, T> + 'static) -> Self {
        self.push(priority, Arc::new(source));
        self
    }

    pub fn push(&mut self, priority: i32, source: Arc<dyn Source<Q, T>>) {
        let at = self
            .entries
            .iter()
            .position(|e| e.priority > priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, ChainEntry { priority, source });
    }

    /// Source names in the order they will be asked.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.source.name()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Asks each source in turn and returns the first non-empty answer.
    ///
    /// Never fails: every error is recorded and the next source is tried.
    pub async fn first_non_empty(&self, ctx: &Q) -> ChainOutcome<T> {
        let mut failures = Vec::new();

        for entry in &self.entries {
            let name = entry.source.name();
            let error = match entry.source.query(ctx).await {
                Ok(values) if !values.is_empty() => {
                    tracing::debug!(source = name, count = values.len(), "Source answered");
                    return ChainOutcome::Found {
                        source: name,
                        embedded: entry.source.is_embedded(),
                        values,
                        skipped: failures,
                    };
                }
                Ok(_) => SourceError::Empty,
                Err(error) => error,
            };

            tracing::debug!(source = name, kind = error.kind(), %error, "Source failed, trying next");
            failures.push(SourceFailure {
                source: name,
                error,
            });
        }

        ChainOutcome::Exhausted { failures }
    }
}
