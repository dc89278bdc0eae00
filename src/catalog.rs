use crate::error::{ExploreError, Result};
use crate::source::{ExampleRef, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One entry of the catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub source: SourceKind,
    /// MIME type, or null to infer it from the dataset file.
    #[serde(rename = "type")]
    pub mime: Option<String>,
    pub file: String,
}

/// Example datasets keyed by display name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExampleCatalog {
    entries: BTreeMap<String, CatalogEntry>,
    /// Directory local datasets are resolved against.
    base_dir: Option<PathBuf>,
}

impl ExampleCatalog {
    pub fn from_json_str(json: &str, base_dir: Option<PathBuf>) -> Result<Self> {
        let entries: BTreeMap<String, CatalogEntry> = serde_json::from_str(json)?;
        Ok(Self { entries, base_dir })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json, path.parent().map(Path::to_path_buf))?;
        debug!(path = %path.display(), examples = catalog.len(), "loaded example catalog");
        Ok(catalog)
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<ExampleRef> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| ExploreError::UnknownExample(name.to_string()))?;
        Ok(ExampleRef {
            name: name.to_string(),
            source_kind: entry.source,
            mime: entry.mime.clone(),
            file: entry.file.clone(),
        })
    }
}
