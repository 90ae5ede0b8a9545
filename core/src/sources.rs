//! Source chains for every level, wired from configuration.

use std::fmt;
use std::hash::Hash;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use enrol_config::EnrolConfig;
use enrol_providers::cache::{CachePolicy, Cached};
use enrol_providers::countries::{CountriesNowCities, CountriesNowStates};
use enrol_providers::embedded::{StaticCities, StaticDegrees};
use enrol_providers::geocoder::{AreaScope, GeocodedInstitutions};
use enrol_providers::http::{HttpFetcher, HttpSettings};
use enrol_providers::internal::InternalDirectory;
use enrol_providers::pincode::PincodeLookup;
use enrol_providers::retry::RetryPolicy;
use enrol_providers::universities::UniversityDirectory;
use enrol_providers::{PostalSource, Source, SourceChain};
use enrol_types::{DegreeLevel, InstitutionQuery};
use thiserror::Error;

use crate::catalog::{CatalogError, LocalCatalog};

/// Chain positions. Lower runs first.
pub mod priority {
    pub const EXTERNAL: i32 = 0;
    pub const EXTERNAL_BROAD: i32 = 10;
    pub const PUBLIC_DIRECTORY: i32 = 20;
    pub const LOCAL_CATALOG: i32 = 30;
    pub const INTERNAL: i32 = 40;
    pub const EMBEDDED: i32 = 100;
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Everything the resolver can ask.
#[derive(Default)]
pub struct Sources {
    pub states: SourceChain<()>,
    pub cities: SourceChain<str>,
    pub institutions: SourceChain<InstitutionQuery>,
    pub degrees: SourceChain<DegreeLevel>,
    pub years: SourceChain<(), i32>,
    /// `None` disables postal autofill.
    pub postal: Option<Arc<dyn PostalSource>>,
}

impl fmt::Debug for Sources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sources")
            .field("states", &self.states)
            .field("cities", &self.cities)
            .field("institutions", &self.institutions)
            .field("degrees", &self.degrees)
            .field("years", &self.years)
            .field("postal", &self.postal.as_ref().map(|p| p.name()))
            .finish()
    }
}

fn enabled(url: &str) -> bool {
    !url.trim().is_empty()
}

/// Registers `source`, behind a cache when `cache` is set.
fn register<Q, T, S>(
    chain: &mut SourceChain<Q, T>,
    priority: i32,
    source: S,
    cache: Option<CachePolicy>,
) where
    S: Source<Q, T> + 'static,
    Q: ?Sized + ToOwned + Hash + Eq + Sync + 'static,
    Q::Owned: Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    match cache {
        Some(policy) => chain.push(priority, Arc::new(Cached::<S, Q, T>::new(source, policy))),
        None => chain.push(priority, Arc::new(source)),
    }
}

impl Sources {
    /// Only the embedded tables; every lookup falls through to them.
    #[must_use]
    pub fn embedded() -> Self {
        let mut sources = Self::default();
        sources
            .cities
            .push(priority::EMBEDDED, Arc::new(StaticCities));
        sources
            .degrees
            .push(priority::EMBEDDED, Arc::new(StaticDegrees));
        sources
    }

    /// Builds every chain from `config`.
    ///
    /// A source whose URL is blank is left out. Embedded tables are always
    /// registered last.
    pub fn from_config(config: &EnrolConfig) -> Result<Self, SetupError> {
        let settings = HttpSettings {
            connect_timeout: Duration::from_secs(config.http.connect_timeout_secs),
            timeout: Duration::from_secs(config.http.timeout_secs),
            user_agent: config.http.user_agent.clone(),
            retry: RetryPolicy::default().with_max_retries(config.http.max_retries),
            max_body_bytes: config.http.max_body_bytes,
        };
        let fetcher = HttpFetcher::new(&settings)?;
        let cache = config.cache.enabled.then(|| CachePolicy {
            ttl: Duration::from_secs(config.cache.ttl_secs),
            capacity: config.cache.max_entries,
        });
        let country = config.region.country.as_str();
        let urls = &config.sources;

        let mut sources = Self::embedded();

        if enabled(&urls.countries_base) {
            register(
                &mut sources.states,
                priority::EXTERNAL,
                CountriesNowStates::new(fetcher.clone(), &urls.countries_base, country),
                cache,
            );
            register(
                &mut sources.cities,
                priority::EXTERNAL,
                CountriesNowCities::new(fetcher.clone(), &urls.countries_base, country),
                cache,
            );
        }

        if enabled(&urls.geocoder_base) {
            for (priority, scope) in [
                (priority::EXTERNAL, AreaScope::City),
                (priority::EXTERNAL_BROAD, AreaScope::State),
            ] {
                register(
                    &mut sources.institutions,
                    priority,
                    GeocodedInstitutions::new(fetcher.clone(), &urls.geocoder_base, scope),
                    cache,
                );
            }
        }

        if enabled(&urls.universities_url) {
            // Keeps its own copy of the country list; no per-query cache.
            let directory = UniversityDirectory::with_cache(
                fetcher.clone(),
                &urls.universities_url,
                country,
                cache,
            );
            sources
                .institutions
                .push(priority::PUBLIC_DIRECTORY, Arc::new(directory));
        }

        if let Some(path) = urls.local_catalog.as_deref().filter(|p| enabled(p)) {
            let catalog = LocalCatalog::load(Path::new(path))?;
            sources
                .institutions
                .push(priority::LOCAL_CATALOG, Arc::new(catalog));
        }

        if enabled(&urls.internal_base) {
            let internal = InternalDirectory::new(fetcher.clone(), &urls.internal_base);
            register(&mut sources.cities, priority::INTERNAL, internal.cities(), cache);
            register(
                &mut sources.institutions,
                priority::INTERNAL,
                internal.institutions(),
                cache,
            );
            register(&mut sources.degrees, priority::INTERNAL, internal.degrees(), cache);
            register(&mut sources.years, priority::INTERNAL, internal.years(), cache);
        }

        if enabled(&urls.pincode_base) {
            sources.postal = Some(Arc::new(PincodeLookup::new(
                fetcher,
                &urls.pincode_base,
                country,
            )));
        }

        tracing::debug!(?sources, "Configured sources");
        Ok(sources)
    }
}
