use crate::chart::MarkerKind;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub file_loading: FileLoadingConfig,
    pub chart: ChartConfig,
    pub describe: DescribeConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoadingConfig {
    /// Field separator for delimited text, as a byte (e.g. 59 for ';').
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub infer_schema_length: Option<usize>,
    /// Directory holding the vega example datasets (`<name>.json` / `<name>.csv`).
    pub datasets_dir: Option<PathBuf>,
    /// Example catalog document.
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Color of average and dispersion overlays.
    pub aggregate_color: String,
    pub histogram: HistogramConfig,
    pub dot: DotConfig,
    pub scatter: ScatterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub width: u32,
    pub height: u32,
    pub bins: u32,
    pub color: String,
    pub plot_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotConfig {
    pub width: u32,
    pub height: u32,
    pub marker: MarkerKind,
    pub size: f64,
    pub stroke_width: f64,
    pub opacity: f64,
    pub filled: bool,
    pub color: String,
    pub plot_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    pub width: u32,
    pub height: u32,
    pub size: f64,
    pub stroke_width: f64,
    pub opacity: f64,
    pub filled: bool,
    pub color: String,
    pub plot_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescribeConfig {
    pub precision: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Columns with fewer distinct values are filtered by value.
    pub categorical_threshold: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.3".to_string(),
            file_loading: FileLoadingConfig::default(),
            chart: ChartConfig::default(),
            describe: DescribeConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            aggregate_color: "#d95f02".to_string(),
            histogram: HistogramConfig::default(),
            dot: DotConfig::default(),
            scatter: ScatterConfig::default(),
        }
    }
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            width: 350,
            height: 350,
            bins: 30,
            color: "#4e79a7".to_string(),
            plot_name: "histogram".to_string(),
        }
    }
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 200,
            marker: MarkerKind::Point,
            size: 15.0,
            stroke_width: 1.0,
            opacity: 0.8,
            filled: false,
            color: "#7570b2".to_string(),
            plot_name: "dot_plot".to_string(),
        }
    }
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            size: 30.0,
            stroke_width: 2.0,
            opacity: 0.7,
            filled: true,
            color: "#7570b3".to_string(),
            plot_name: "xy_plot".to_string(),
        }
    }
}

impl Default for DescribeConfig {
    fn default() -> Self {
        Self {
            precision: crate::statistics::DEFAULT_PRECISION,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            categorical_threshold: crate::filter::DEFAULT_CATEGORICAL_THRESHOLD,
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let mut config = AppConfig::default();

        if let Ok(user_config) = Self::load_user_config(app_name) {
            config.merge(user_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load defaults overlaid with an explicit config file. Unlike [`AppConfig::load`], a
    /// missing or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(Self::read_file(path)?);
        config.validate()?;
        Ok(config)
    }

    /// Load user configuration from ~/.config/gridsurf/config.toml
    fn load_user_config(app_name: &str) -> Result<AppConfig> {
        let config_manager = ConfigManager::new(app_name)?;
        let config_path = config_manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }
        Self::read_file(&config_path)
    }

    fn read_file(config_path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.file_loading.merge(other.file_loading);
        self.chart.merge(other.chart);
        self.describe.merge(other.describe);
        self.filter.merge(other.filter);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.3") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.3.x",
                self.version
            ));
        }

        if self.file_loading.infer_schema_length == Some(0) {
            return Err(eyre!("infer_schema_length must be greater than 0"));
        }

        self.chart.validate()?;

        if self.describe.precision > 10 {
            return Err(eyre!(
                "describe.precision must be at most 10, got {}",
                self.describe.precision
            ));
        }

        if self.filter.categorical_threshold == 0 {
            return Err(eyre!("categorical_threshold must be greater than 0"));
        }

        Ok(())
    }
}

impl FileLoadingConfig {
    pub fn merge(&mut self, other: Self) {
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.has_header.is_some() {
            self.has_header = other.has_header;
        }
        if other.infer_schema_length.is_some() {
            self.infer_schema_length = other.infer_schema_length;
        }
        if other.datasets_dir.is_some() {
            self.datasets_dir = other.datasets_dir;
        }
        if other.catalog.is_some() {
            self.catalog = other.catalog;
        }
    }
}

impl ChartConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChartConfig::default();
        if other.aggregate_color != default.aggregate_color {
            self.aggregate_color = other.aggregate_color;
        }
        self.histogram.merge(other.histogram);
        self.dot.merge(other.dot);
        self.scatter.merge(other.scatter);
    }

    fn validate(&self) -> Result<()> {
        parse_hex(&self.aggregate_color)?;

        let h = &self.histogram;
        check_size("histogram", h.width, h.height)?;
        if h.bins == 0 {
            return Err(eyre!("histogram.bins must be greater than 0"));
        }
        parse_hex(&h.color)?;

        let d = &self.dot;
        check_size("dot", d.width, d.height)?;
        check_opacity("dot", d.opacity)?;
        parse_hex(&d.color)?;

        let s = &self.scatter;
        check_size("scatter", s.width, s.height)?;
        check_opacity("scatter", s.opacity)?;
        parse_hex(&s.color)?;

        Ok(())
    }
}

impl HistogramConfig {
    pub fn merge(&mut self, other: Self) {
        let default = HistogramConfig::default();
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
        if other.bins != default.bins {
            self.bins = other.bins;
        }
        if other.color != default.color {
            self.color = other.color;
        }
        if other.plot_name != default.plot_name {
            self.plot_name = other.plot_name;
        }
    }
}

impl DotConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DotConfig::default();
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
        if other.marker != default.marker {
            self.marker = other.marker;
        }
        if other.size != default.size {
            self.size = other.size;
        }
        if other.stroke_width != default.stroke_width {
            self.stroke_width = other.stroke_width;
        }
        if other.opacity != default.opacity {
            self.opacity = other.opacity;
        }
        if other.filled != default.filled {
            self.filled = other.filled;
        }
        if other.color != default.color {
            self.color = other.color;
        }
        if other.plot_name != default.plot_name {
            self.plot_name = other.plot_name;
        }
    }
}

impl ScatterConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ScatterConfig::default();
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
        if other.size != default.size {
            self.size = other.size;
        }
        if other.stroke_width != default.stroke_width {
            self.stroke_width = other.stroke_width;
        }
        if other.opacity != default.opacity {
            self.opacity = other.opacity;
        }
        if other.filled != default.filled {
            self.filled = other.filled;
        }
        if other.color != default.color {
            self.color = other.color;
        }
        if other.plot_name != default.plot_name {
            self.plot_name = other.plot_name;
        }
    }
}

impl DescribeConfig {
    pub fn merge(&mut self, other: Self) {
        if other.precision != DescribeConfig::default().precision {
            self.precision = other.precision;
        }
    }
}

impl FilterConfig {
    pub fn merge(&mut self, other: Self) {
        if other.categorical_threshold != FilterConfig::default().categorical_threshold {
            self.categorical_threshold = other.categorical_threshold;
        }
    }
}

fn check_size(section: &str, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(eyre!(
            "{}.width and {}.height must be greater than 0",
            section,
            section
        ));
    }
    Ok(())
}

fn check_opacity(section: &str, opacity: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&opacity) {
        return Err(eyre!(
            "{}.opacity must be between 0.0 and 1.0, got {}",
            section,
            opacity
        ));
    }
    Ok(())
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.starts_with('#') || s.len() != 7 {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok((r, g, b))
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#d95f02").unwrap(), (0xd9, 0x5f, 0x02));
        assert!(parse_hex("d95f02").is_err());
        assert!(parse_hex("#zz5f02").is_err());
    }

    #[test]
    fn test_chart_merge_keeps_unset_values() {
        let mut config = ChartConfig::default();
        let mut other = ChartConfig::default();
        other.scatter.width = 600;
        other.dot.marker = MarkerKind::Tick;
        config.merge(other);
        assert_eq!(config.scatter.width, 600);
        assert_eq!(config.scatter.height, 400);
        assert_eq!(config.dot.marker, MarkerKind::Tick);
    }
}
