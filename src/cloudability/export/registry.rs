use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::cloudability::export::error::{ReportError, Result};

/// Category label applied to views that do not configure one explicitly.
pub const DEFAULT_CATEGORY: &str = "core";

/// Configuration of a single report view: which dimensions and metrics to
/// request, and the category label stamped onto every normalized row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewConfig {
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    /// Explicit category label for this view. Defaults to
    /// [`DEFAULT_CATEGORY`] when the registry file omits it.
    #[serde(default)]
    pub category: Option<String>,
}

impl ViewConfig {
    /// Returns the category label rows from this view are tagged with.
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }
}

/// Static mapping of provider → view name → [`ViewConfig`], loaded once per
/// run from a JSON file. Enumeration order is the map order, which is
/// deterministic (sorted by name).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ViewRegistry {
    providers: BTreeMap<String, BTreeMap<String, ViewConfig>>,
}

impl ViewRegistry {
    /// Loads the registry from a JSON document on disk. A malformed document
    /// fails the load; the export cannot proceed without a valid registry.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::MissingInput(path.to_path_buf()));
        }
        let source = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&source)?)
    }

    /// Iterates over the declared providers in enumeration order.
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Returns the views declared for a provider, in enumeration order.
    pub fn views_for(&self, provider: &str) -> Result<&BTreeMap<String, ViewConfig>> {
        self.providers
            .get(provider)
            .ok_or_else(|| ReportError::UnknownProvider(provider.to_string()))
    }

    /// Looks up the configuration of a single provider/view pair.
    pub fn config_for(&self, provider: &str, view: &str) -> Result<&ViewConfig> {
        self.views_for(provider)?
            .get(view)
            .ok_or_else(|| ReportError::UnknownView {
                provider: provider.to_string(),
                view: view.to_string(),
            })
    }

    /// Resolves the category label for a provider/view pair.
    pub fn category_for(&self, provider: &str, view: &str) -> Result<&str> {
        Ok(self.config_for(provider, view)?.category())
    }
}
