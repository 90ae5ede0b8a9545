//! In-process institution catalog.
//!
//! Serves the same role as the portal's institution endpoint without a
//! network hop: rows from local datasets (AISHE/AICTE/UGC CSV exports, or the
//! same rows as JSON) first, then a short curated list for popular cities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use enrol_providers::{Source, SourceFut};
use enrol_types::{InstitutionQuery, SourceError};
use serde::Deserialize;
use thiserror::Error;

/// Upper bound on names returned for one query.
pub const MAX_RESULTS: usize = 300;

/// One dataset row. Column aliases cover the common export headers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogRow {
    #[serde(alias = "institution", alias = "Institute Name")]
    pub name: String,
    #[serde(default, alias = "State", alias = "STATE")]
    pub state: String,
    #[serde(default, alias = "District", alias = "CITY")]
    pub city: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to parse catalog at {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },
}

type CuratedEntry = (&'static str, &'static str, &'static [&'static str]);

const CURATED: &[CuratedEntry] = &[
    (
        "Karnataka",
        "Bengaluru",
        &[
            "Indian Institute of Science",
            "RV College of Engineering",
            "BMS College of Engineering",
            "PES University",
            "Dayananda Sagar College of Engineering",
        ],
    ),
    (
        "Maharashtra",
        "Pune",
        &[
            "College of Engineering Pune",
            "MIT World Peace University",
            "Symbiosis Institute of Technology",
            "Vishwakarma Institute of Technology",
        ],
    ),
    (
        "Tamil Nadu",
        "Chennai",
        &[
            "Anna University",
            "IIT Madras",
            "SSN College of Engineering",
            "SRM Institute of Science and Technology",
        ],
    ),
];

fn norm(s: &str) -> String {
    s.trim().to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct LocalCatalog {
    rows: Vec<CatalogRow>,
}

impl LocalCatalog {
    #[must_use]
    pub fn new(rows: Vec<CatalogRow>) -> Self {
        let rows = rows
            .into_iter()
            .filter(|r| !r.name.trim().is_empty())
            .collect();
        Self { rows }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Vec<CatalogRow>>(json).map(Self::new)
    }

    /// Rows from a CSV export with a header line. Extra columns are ignored.
    pub fn from_csv<R: io::Read>(input: R) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(input);
        reader
            .deserialize::<CatalogRow>()
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Loads one dataset file, or every `.csv` and `.json` file in a
    /// directory. Files ending in `.csv` are read as CSV, anything else as a
    /// JSON array.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let catalog = if path.is_dir() {
            let mut rows = Vec::new();
            for file in dataset_files(path)? {
                rows.extend(Self::load_file(&file)?.rows);
            }
            Self { rows }
        } else {
            Self::load_file(path)?
        };
        tracing::info!(path = %path.display(), rows = catalog.len(), "Loaded institution catalog");
        Ok(catalog)
    }

    fn load_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if has_extension(path, "csv") {
            Self::from_csv(content.as_bytes()).map_err(|source| CatalogError::Csv {
                path: path.to_path_buf(),
                source,
            })
        } else {
            Self::from_json(&content).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Names matching `query`, deduplicated, sorted and capped at [`MAX_RESULTS`].
    ///
    /// Dataset rows match when the query's state and city are each empty or
    /// contained (case-insensitively) in the row's field or in its name. When
    /// no row matches, the curated list for the exact city is used, or every
    /// curated list of the state.
    #[must_use]
    pub fn search(&self, query: &InstitutionQuery) -> Vec<String> {
        let state = norm(&query.state);
        let city = norm(&query.city);

        let mut names: Vec<&str> = self
            .rows
            .iter()
            .filter(|row| {
                let name = norm(&row.name);
                let ok_state =
                    state.is_empty() || norm(&row.state).contains(&state) || name.contains(&state);
                let ok_city =
                    city.is_empty() || norm(&row.city).contains(&city) || name.contains(&city);
                ok_state && ok_city
            })
            .map(|row| row.name.trim())
            .collect();

        if names.is_empty() {
            names = curated(&state, &city);
        }

        let mut names = filter_by_degree(names, &query.degree_name);
        names.sort_unstable();
        names.dedup();
        names.truncate(MAX_RESULTS);
        names.into_iter().map(ToString::to_string).collect()
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Dataset files in `dir`, in name order.
fn dataset_files(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let read_error = |source| CatalogError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if has_extension(&path, "csv") || has_extension(&path, "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn curated(state: &str, city: &str) -> Vec<&'static str> {
    if state.is_empty() {
        return Vec::new();
    }
    let exact: Vec<&'static str> = CURATED
        .iter()
        .filter(|(s, c, _)| norm(s) == state && norm(c) == city)
        .flat_map(|(_, _, names)| names.iter().copied())
        .collect();
    if !exact.is_empty() {
        return exact;
    }
    CURATED
        .iter()
        .filter(|(s, _, _)| norm(s) == state)
        .flat_map(|(_, _, names)| names.iter().copied())
        .collect()
}

/// Narrows by the degree's first word, unless that would leave nothing.
fn filter_by_degree<'a>(names: Vec<&'a str>, degree: &str) -> Vec<&'a str> {
    let keyword = degree
        .split_whitespace()
        .next()
        .map(norm)
        .unwrap_or_default();
    if keyword.is_empty() {
        return names;
    }
    let filtered: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| norm(n).contains(&keyword))
        .collect();
    if filtered.is_empty() { names } else { filtered }
}

impl Source<InstitutionQuery> for LocalCatalog {
    fn name(&self) -> &'static str {
        "local-catalog"
    }

    fn query<'a>(&'a self, ctx: &'a InstitutionQuery) -> SourceFut<'a, Vec<String>> {
        let names = self.search(ctx);
        Box::pin(async move {
            if names.is_empty() {
                Err(SourceError::Empty)
            } else {
                Ok(names)
            }
        })
    }
}
