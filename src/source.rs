//! Turning a data source (uploaded bytes or a catalog example) into a table.

use crate::config::FileLoadingConfig;
use crate::error::{ExploreError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MIME_CSV: &str = "text/csv";
pub const MIME_TSV: &str = "text/tab-separated-values";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_JSON: &str = "application/json";

/// Separator between parent and child keys of flattened JSON objects.
pub const JSON_KEY_SEPARATOR: char = '.';

/// Candidate separators tried when sniffing plain text.
const SNIFF_CANDIDATES: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Where an example dataset lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Named dataset from the vega datasets collection, looked up in `datasets_dir`.
    VegaDataset,
    /// File shipped next to the example catalog.
    LocalDataset,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::VegaDataset => "vega-dataset",
            SourceKind::LocalDataset => "local-dataset",
        }
    }
}

/// A dataset entry from the example catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExampleRef {
    pub name: String,
    pub source_kind: SourceKind,
    /// None for vega datasets, whose type follows from the file found on disk.
    pub mime: Option<String>,
    /// Dataset key (vega) or path relative to the catalog directory (local).
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataSource {
    Uploaded {
        name: String,
        mime: String,
        bytes: Vec<u8>,
    },
    Example(ExampleRef),
}

impl DataSource {
    /// Read a file from disk. The MIME type comes from `mime` or, when absent, the extension.
    pub fn from_path(path: &Path, mime: Option<&str>) -> Result<Self> {
        let mime = match mime {
            Some(m) => m.to_string(),
            None => mime_for_path(path)
                .ok_or_else(|| ExploreError::UnsupportedFormat(path.display().to_string()))?
                .to_string(),
        };
        let bytes = std::fs::read(path)?;
        Ok(DataSource::Uploaded {
            name: path.display().to_string(),
            mime,
            bytes,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            DataSource::Uploaded { name, .. } => name,
            DataSource::Example(example) => &example.name,
        }
    }
}

/// Parsing parameters shared by every source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadOptions {
    /// Overrides the per-type separator and sniffing.
    pub delimiter: Option<u8>,
    pub has_header: bool,
    pub infer_schema_length: Option<usize>,
    pub datasets_dir: Option<PathBuf>,
    /// Directory that local example files are resolved against.
    pub catalog_dir: Option<PathBuf>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            infer_schema_length: None,
            datasets_dir: None,
            catalog_dir: None,
        }
    }
}

impl LoadOptions {
    pub fn from_config(config: &FileLoadingConfig) -> Self {
        Self {
            delimiter: config.delimiter,
            has_header: config.has_header.unwrap_or(true),
            infer_schema_length: config.infer_schema_length,
            datasets_dir: config.datasets_dir.clone(),
            catalog_dir: config
                .catalog
                .as_ref()
                .and_then(|p| p.parent())
                .map(Path::to_path_buf),
        }
    }
}

/// MIME type for a file extension, or None when the extension is not a supported table type.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Some(MIME_CSV),
        "tsv" | "tab" => Some(MIME_TSV),
        "txt" => Some(MIME_TEXT),
        "json" => Some(MIME_JSON),
        _ => None,
    }
}

/// Guess the separator from the first line: the candidate occurring most often outside quotes.
/// Returns `fallback` when no candidate appears.
pub fn sniff_delimiter(bytes: &[u8], fallback: u8) -> u8 {
    let mut counts = [0usize; SNIFF_CANDIDATES.len()];
    let mut in_quotes = false;
    for &b in bytes {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'\n' | b'\r' if !in_quotes => break,
            _ if !in_quotes => {
                if let Some(i) = SNIFF_CANDIDATES.iter().position(|&c| c == b) {
                    counts[i] += 1;
                }
            }
            _ => {}
        }
    }

    let mut best: Option<usize> = None;
    for (i, &count) in counts.iter().enumerate() {
        let better = match best {
            None => count > 0,
            Some(b) => count > counts[b],
        };
        if better {
            best = Some(i);
        }
    }
    best.map(|i| SNIFF_CANDIDATES[i]).unwrap_or(fallback)
}

/// Parse raw bytes of the given MIME type into a table.
pub fn read_table(bytes: &[u8], mime: &str, options: &LoadOptions) -> Result<DataFrame> {
    let df = match mime {
        MIME_CSV => read_delimited(bytes, options.delimiter.unwrap_or(b','), options)?,
        MIME_TSV => read_delimited(bytes, options.delimiter.unwrap_or(b'\t'), options)?,
        MIME_TEXT => {
            let delimiter = options
                .delimiter
                .unwrap_or_else(|| sniff_delimiter(bytes, b'\t'));
            read_delimited(bytes, delimiter, options)?
        }
        MIME_JSON => read_json_records(bytes)?,
        other => return Err(ExploreError::UnsupportedFormat(other.to_string())),
    };
    debug!(mime, rows = df.height(), columns = df.width(), "parsed table");
    Ok(df)
}

fn read_delimited(bytes: &[u8], delimiter: u8, options: &LoadOptions) -> Result<DataFrame> {
    let mut read_options = CsvReadOptions::default().with_has_header(options.has_header);
    if let Some(n) = options.infer_schema_length {
        read_options = read_options.with_infer_schema_length(Some(n));
    }
    read_options = read_options.map_parse_options(|opts| opts.with_separator(delimiter));
    let df = CsvReader::new(Cursor::new(bytes.to_vec()))
        .with_options(read_options)
        .finish()?;
    Ok(df)
}

/// Read a JSON array of records (or a single record) with nested objects flattened into
/// `parent.child` columns. Nested arrays are kept as their JSON text.
fn read_json_records(bytes: &[u8]) -> Result<DataFrame> {
    let value: Value = serde_json::from_slice(bytes)?;
    let records: Vec<Value> = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        _ => {
            return Err(ExploreError::UnsupportedFormat(
                "JSON document is not a record or an array of records".to_string(),
            ))
        }
    };
    if records.is_empty() {
        return Ok(DataFrame::empty());
    }

    let flat: Vec<Value> = records
        .into_iter()
        .map(|record| {
            let mut out = Map::new();
            match record {
                Value::Object(map) => flatten_into(&mut out, None, map),
                other => {
                    out.insert("value".to_string(), other);
                }
            }
            Value::Object(out)
        })
        .collect();

    let normalized = serde_json::to_vec(&flat)?;
    let df = JsonReader::new(Cursor::new(normalized))
        .with_json_format(JsonFormat::Json)
        .finish()?;
    Ok(df)
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, map: Map<String, Value>) {
    for (key, value) in map {
        let key = match prefix {
            Some(p) => format!("{}{}{}", p, JSON_KEY_SEPARATOR, key),
            None => key,
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&key), inner),
            Value::Array(_) => {
                out.insert(key, Value::String(value.to_string()));
            }
            other => {
                out.insert(key, other);
            }
        }
    }
}

/// Locate an example's file and its MIME type.
pub fn resolve_example(example: &ExampleRef, options: &LoadOptions) -> Result<(PathBuf, String)> {
    match example.source_kind {
        SourceKind::VegaDataset => {
            let dir = options.datasets_dir.as_deref().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!(
                        "example '{}' needs file_loading.datasets_dir to be configured",
                        example.name
                    ),
                )
            })?;
            let candidates = match example.mime.as_deref() {
                Some(MIME_CSV) => vec![(format!("{}.csv", example.file), MIME_CSV)],
                Some(MIME_JSON) => vec![(format!("{}.json", example.file), MIME_JSON)],
                _ => vec![
                    (format!("{}.json", example.file), MIME_JSON),
                    (format!("{}.csv", example.file), MIME_CSV),
                ],
            };
            for (file, mime) in candidates {
                let path = dir.join(&file);
                if path.exists() {
                    return Ok((path, mime.to_string()));
                }
            }
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "vega dataset '{}' not found in {}",
                    example.file,
                    dir.display()
                ),
            )
            .into())
        }
        SourceKind::LocalDataset => {
            let path = match &options.catalog_dir {
                Some(dir) => dir.join(&example.file),
                None => PathBuf::from(&example.file),
            };
            let mime = match &example.mime {
                Some(m) => m.clone(),
                None => mime_for_path(&path)
                    .ok_or_else(|| ExploreError::UnsupportedFormat(example.file.clone()))?
                    .to_string(),
            };
            Ok((path, mime))
        }
    }
}

/// Load a source without caching.
pub fn load(source: &DataSource, options: &LoadOptions) -> Result<DataFrame> {
    match source {
        DataSource::Uploaded { name, mime, bytes } => {
            debug!(name = %name, mime = %mime, size = bytes.len(), "loading uploaded table");
            read_table(bytes, mime, options)
        }
        DataSource::Example(example) => {
            let (path, mime) = resolve_example(example, options)?;
            debug!(name = %example.name, path = %path.display(), "loading example table");
            let bytes = std::fs::read(&path)?;
            read_table(&bytes, &mime, options)
        }
    }
}
