//! Two-level service category taxonomy.
//!
//! Subcategory keys repeat across parents (`general` exists under several
//! categories), so every lookup is keyed by `(category, sub_category)`.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const BUNDLED_CATEGORIES: &str = include_str!("../config/categories.yaml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub sub_categories: Vec<SubCategory>,
}

impl Category {
    #[must_use]
    pub fn sub_category(&self, key: &str) -> Option<&SubCategory> {
        self.sub_categories.iter().find(|s| s.key == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTaxonomy {
    pub categories: Vec<Category>,
}

impl CategoryTaxonomy {
    /// Parses the taxonomy compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the bundled YAML is malformed or fails validation.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_yaml(BUNDLED_CATEGORIES)
    }

    /// Reads and validates a taxonomy YAML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the YAML is malformed or fails validation.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let taxonomy: CategoryTaxonomy = serde_yaml::from_str(content)?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.key.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "category key must be non-empty".to_string(),
                ));
            }
            if !seen.insert(category.key.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate category key: '{}'",
                    category.key
                )));
            }
            let mut seen_sub = HashSet::new();
            for sub in &category.sub_categories {
                if sub.key.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "category '{}' has a subcategory with an empty key",
                        category.key
                    )));
                }
                if !seen_sub.insert(sub.key.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "duplicate subcategory key '{}' under category '{}'",
                        sub.key, category.key
                    )));
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    #[must_use]
    pub fn category_name(&self, key: &str) -> Option<&str> {
        self.category(key).map(|c| c.name.as_str())
    }

    /// Resolves a subcategory display name within its parent category.
    #[must_use]
    pub fn sub_category_name(&self, category_key: &str, sub_category_key: &str) -> Option<&str> {
        self.category(category_key)
            .and_then(|c| c.sub_category(sub_category_key))
            .map(|s| s.name.as_str())
    }

    #[must_use]
    pub fn has_sub_category(&self, category_key: &str, sub_category_key: &str) -> bool {
        self.sub_category_name(category_key, sub_category_key)
            .is_some()
    }
}
