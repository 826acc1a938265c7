//! Read-only document directory served by the API.
//!
//! Loaded once at startup from a JSON export of the document store:
//!
//! ```json
//! { "services": [..], "categories": [..], "faqs": [..], "cities": [..],
//!   "news": { "general": [..], "manchester": [..] }, "organisations": [..] }
//! ```
//!
//! Every section is optional. Service records keep their raw shape for the
//! wire and a normalized copy for filtering.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use ssn_core::ServiceWithDistance;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read directory file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse directory file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    services: Vec<Value>,
    #[serde(default)]
    categories: Vec<Value>,
    #[serde(default)]
    faqs: Vec<Value>,
    #[serde(default)]
    cities: Vec<Value>,
    #[serde(default)]
    news: HashMap<String, Vec<Value>>,
    #[serde(default)]
    organisations: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct DirectoryService {
    pub raw: Value,
    pub service: ServiceWithDistance,
}

#[derive(Debug, Default)]
pub struct Directory {
    pub services: Vec<DirectoryService>,
    pub categories: Vec<Value>,
    pub faqs: Vec<Value>,
    pub cities: Vec<Value>,
    /// Keyed by location slug; `general` holds the site-wide feed.
    pub news: HashMap<String, Vec<Value>>,
    pub organisations: Vec<Value>,
}

impl Directory {
    /// # Errors
    ///
    /// Returns [`DirectoryError::Io`] if the file cannot be read, or
    /// [`DirectoryError::Parse`] if it is not a directory document.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let content = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let directory = Self::from_json(&content).map_err(|source| DirectoryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(
            path = %path.display(),
            services = directory.services.len(),
            categories = directory.categories.len(),
            cities = directory.cities.len(),
            "directory loaded"
        );
        Ok(directory)
    }

    /// # Errors
    ///
    /// Returns the parse error when `content` is not a JSON object of the
    /// expected sections.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let file: DirectoryFile = serde_json::from_str(content)?;
        Ok(Self {
            services: file
                .services
                .into_iter()
                .map(|raw| DirectoryService {
                    service: ssn_client::normalize(&raw),
                    raw,
                })
                .collect(),
            categories: file.categories,
            faqs: file.faqs,
            cities: file.cities,
            news: file.news,
            organisations: file.organisations,
        })
    }

    /// Services whose organisation slug is `slug`, normalized.
    #[must_use]
    pub fn organisation_services(&self, slug: &str) -> Vec<ServiceWithDistance> {
        self.services
            .iter()
            .filter(|s| s.service.organisation.slug == slug)
            .map(|s| s.service.clone())
            .collect()
    }

    /// Raw organisation record keyed by `Key`, `key` or `slug`.
    #[must_use]
    pub fn organisation(&self, slug: &str) -> Option<&Value> {
        self.organisations.iter().find(|org| {
            ["slug", "key", "Key"]
                .iter()
                .any(|k| org.get(*k).and_then(Value::as_str) == Some(slug))
        })
    }
}
