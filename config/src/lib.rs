//! Configuration for the enrol resolver.
//!
//! Loaded from `$ENROL_CONFIG` if set, otherwise `~/.enrol/config.toml`.
//! A missing file is not an error: every section has defaults that point at
//! the public directories a registration portal draws on.
//!
//! ```toml
//! [region]
//! country = "India"
//! injected_ug_degree = "BCA"
//! year_floor = 1980
//!
//! [sources]
//! internal_base = "https://portal.example.edu"
//! local_catalog = "${HOME}/.enrol/institutions"
//!
//! [http]
//! timeout_secs = 10
//! max_retries = 1
//!
//! [cache]
//! enabled = true
//! ttl_secs = 86400
//! max_entries = 1024
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};
use thiserror::Error;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "ENROL_CONFIG";

const fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct EnrolConfig {
    #[serde(default)]
    pub region: RegionConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Country scope and the small amount of locally owned data.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub country: String,
    /// Degree always offered at undergraduate level, even if the catalog omits it.
    pub injected_ug_degree: String,
    /// Oldest graduation year offered when the year list is generated locally.
    pub year_floor: i32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            country: "India".to_string(),
            injected_ug_degree: "BCA".to_string(),
            year_floor: 1980,
        }
    }
}

/// Where each external directory lives.
///
/// Any URL may be set to an empty string to disable that source.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// countriesnow.space API root (states and cities).
    pub countries_base: String,
    /// Overpass API root for geocoded amenity search.
    pub geocoder_base: String,
    /// Hipolabs university search endpoint.
    pub universities_url: String,
    /// Postal PIN code lookup root.
    pub pincode_base: String,
    /// The portal's own `/api/...` endpoints.
    pub internal_base: String,
    /// Institution dataset served in-process instead of calling the portal's
    /// institution endpoint: a CSV export, a JSON array of `{name, state,
    /// city}` rows, or a directory holding several of them.
    pub local_catalog: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            countries_base: "https://countriesnow.space/api/v0.1".to_string(),
            geocoder_base: "https://overpass-api.de".to_string(),
            universities_url: "https://universities.hipolabs.com/search".to_string(),
            pincode_base: "https://api.postalpincode.in".to_string(),
            internal_base: String::new(),
            local_catalog: None,
        }
    }
}

impl SourcesConfig {
    /// Applies `${VAR}` expansion to every string field.
    fn expand(&mut self) {
        for field in [
            &mut self.countries_base,
            &mut self.geocoder_base,
            &mut self.universities_url,
            &mut self.pincode_base,
            &mut self.internal_base,
        ] {
            *field = expand_env_vars(field);
        }
        if let Some(path) = self.local_catalog.as_mut() {
            *path = expand_env_vars(path);
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Larger response bodies are refused while still downloading.
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            timeout_secs: 10,
            user_agent: concat!("enrol/", env!("CARGO_PKG_VERSION")).to_string(),
            max_retries: 1,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Distinct queries remembered per source before the least useful go.
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

const fn default_ttl_secs() -> u64 {
    60 * 60 * 24
}

const fn default_max_entries() -> u64 {
    1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

/// Replaces `${VAR}` with the variable's value; unset variables become empty.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                out.push_str(&env::var(&after[..end]).unwrap_or_default());
                rest = &after[end + 1..];
            }
            Some(_) => {
                // `${}` is kept verbatim
                out.push_str("${}");
                rest = &after[1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

impl EnrolConfig {
    /// Loads the config from its default location.
    ///
    /// Returns `Ok(None)` when no config file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "Failed to read config");
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        Self::parse(&content).map_err(|err| {
            tracing::warn!(path = %path.display(), %err, "Failed to parse config");
            ConfigError::Parse {
                path: path.to_path_buf(),
                source: err,
            }
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        config.sources.expand();
        config.http.user_agent = expand_env_vars(&config.http.user_agent);
        Ok(config)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(explicit));
    }
    dirs::home_dir().map(|home| home.join(".enrol").join("config.toml"))
}
