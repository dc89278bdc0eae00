use crate::error::Result;
use crate::source::{self, DataSource, LoadOptions};
use polars::prelude::DataFrame;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// SHA-256 digest of everything that determines a parsed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Uploaded sources are keyed by content, not by name. Examples are keyed by their
    /// catalog entry and the directories it resolves against.
    pub fn for_source(source: &DataSource, options: &LoadOptions) -> Self {
        let mut hasher = Sha256::new();
        let mut field = |label: &str, bytes: &[u8]| {
            hasher.update(label.as_bytes());
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        };

        match source {
            DataSource::Uploaded { mime, bytes, .. } => {
                field("kind", b"uploaded");
                field("mime", mime.as_bytes());
                field("bytes", bytes);
            }
            DataSource::Example(example) => {
                field("kind", example.source_kind.as_str().as_bytes());
                field("mime", example.mime.as_deref().unwrap_or("").as_bytes());
                field("file", example.file.as_bytes());
                let datasets_dir = options
                    .datasets_dir
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                field("datasets_dir", datasets_dir.as_bytes());
                let catalog_dir = options
                    .catalog_dir
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                field("catalog_dir", catalog_dir.as_bytes());
            }
        }

        // Absent options hash as an empty field, present ones carry a leading tag byte.
        match options.delimiter {
            Some(d) => field("delimiter", &[1, d]),
            None => field("delimiter", &[]),
        }
        field("has_header", &[options.has_header as u8]);
        match options.infer_schema_length {
            Some(n) => {
                let mut tagged = vec![1];
                tagged.extend_from_slice(&(n as u64).to_le_bytes());
                field("infer_schema_length", &tagged);
            }
            None => field("infer_schema_length", &[]),
        }

        CacheKey(hasher.finalize().into())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Parsed tables by key. Entries are never invalidated; a new key is a new entry.
pub trait TableCache {
    fn get(&self, key: &CacheKey) -> Option<DataFrame>;
    fn insert(&mut self, key: CacheKey, table: DataFrame);
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    tables: HashMap<CacheKey, DataFrame>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

impl TableCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<DataFrame> {
        self.tables.get(key).cloned()
    }

    fn insert(&mut self, key: CacheKey, table: DataFrame) {
        self.tables.insert(key, table);
    }
}

/// Always misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl TableCache for NoCache {
    fn get(&self, _key: &CacheKey) -> Option<DataFrame> {
        None
    }

    fn insert(&mut self, _key: CacheKey, _table: DataFrame) {}
}

/// Load through the cache: parse on a miss and remember the result.
pub fn load_cached(
    cache: &mut dyn TableCache,
    source: &DataSource,
    options: &LoadOptions,
) -> Result<DataFrame> {
    let key = CacheKey::for_source(source, options);
    if let Some(df) = cache.get(&key) {
        debug!(key = %key, name = source.name(), "table cache hit");
        return Ok(df);
    }
    debug!(key = %key, name = source.name(), "table cache miss");
    let df = source::load(source, options)?;
    cache.insert(key, df.clone());
    Ok(df)
}
