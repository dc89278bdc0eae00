//! Tabular data exploration: column typing, default field picking, descriptive statistics,
//! row filters and Vega-Lite chart specifications over polars `DataFrame`s.

pub mod cache;
pub mod catalog;
pub mod chart;
pub mod columns;
pub mod config;
pub mod error;
pub mod error_display;
pub mod filter;
pub mod picker;
pub mod scale;
pub mod session;
pub mod source;
pub mod statistics;
pub mod transform;

pub use cache::{load_cached, CacheKey, MemoryCache, NoCache, TableCache};
pub use catalog::ExampleCatalog;
pub use chart::{ChartSpec, DotOptions, HistogramOptions, ScatterOptions};
pub use columns::{classify, ColumnTypeMap};
pub use config::{AppConfig, ConfigManager};
pub use error::{ExploreError, Result};
pub use filter::{filter, ColumnFilter, FilterKind};
pub use picker::{pick, FieldPick};
pub use scale::{resolve_scale, ScaleKind, ScaleSpec};
pub use source::{DataSource, ExampleRef, LoadOptions, SourceKind};
pub use statistics::{describe, describe_with_precision, DescribeResult};
pub use transform::{neg_log, with_neg_log_column};

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "gridsurf";

/// Environment variable holding the log filter (falls back to RUST_LOG).
pub const LOG_ENV: &str = "GRIDSURF_LOG";
