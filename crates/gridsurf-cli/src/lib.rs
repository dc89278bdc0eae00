//! Shared CLI definitions for gridsurf.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{Args as ClapArgs, CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Axis scale kind for chart axes.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum ScaleArg {
    /// Linear axis
    #[default]
    #[value(name = "linear")]
    Linear,
    /// Logarithmic axis, base 2
    #[value(name = "log2")]
    Log2,
    /// Logarithmic axis, base 10
    #[value(name = "log10")]
    Log10,
}

impl ScaleArg {
    /// Token understood by the scale resolver.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Log2 => "log2",
            Self::Log10 => "log10",
        }
    }
}

/// Aggregate drawn by the average overlay.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum AverageArg {
    Mean,
    Median,
}

/// Extent drawn by the dispersion (error bar) overlay.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DispersionArg {
    /// Interquartile range
    Iqr,
    /// Standard deviation
    Stdev,
    /// Standard error of the mean
    Stderr,
    /// 95% confidence interval
    Ci,
}

/// Marker used by dot plots.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum MarkerArg {
    #[default]
    Point,
    Tick,
}

/// Command-line arguments for gridsurf
#[derive(Clone, Parser, Debug)]
#[command(
    name = "gridsurf",
    version,
    about = "Explore tabular datasets",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug logging (same as GRIDSURF_LOG=debug)
    #[arg(long = "debug", global = true, action)]
    pub debug: bool,

    /// Read configuration from this file instead of ~/.config/gridsurf/config.toml
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Generate default configuration file at ~/.config/gridsurf/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Where the table comes from, how to parse it, and which rows to keep.
#[derive(Clone, ClapArgs, Debug, Default)]
pub struct SourceArgs {
    /// Path to a CSV, TSV, TXT or JSON file
    #[arg(value_name = "PATH", required_unless_present = "example")]
    pub path: Option<PathBuf>,

    /// Load a dataset from the example catalog by display name instead of a path
    #[arg(long = "example", value_name = "NAME", conflicts_with = "path")]
    pub example: Option<String>,

    /// MIME type of the file (text/csv, text/tab-separated-values, text/plain, application/json).
    /// When omitted, the type is inferred from the file extension.
    #[arg(long = "mime", value_name = "TYPE")]
    pub mime: Option<String>,

    /// Delimiter to use when reading delimited text (overrides detection)
    #[arg(long = "delimiter")]
    pub delimiter: Option<char>,

    /// Row filter, repeatable. Forms: COL=in:a,b  COL=range:MIN..MAX  COL=dates:START..END  COL=match:REGEX
    #[arg(long = "filter", value_name = "COL=SPEC")]
    pub filters: Vec<String>,
}

/// Output destination and plot dimensions shared by the chart subcommands.
#[derive(Clone, ClapArgs, Debug, Default)]
pub struct ChartArgs {
    /// Row facet field
    #[arg(long = "facet-row", value_name = "COL")]
    pub facet_row: Option<String>,

    /// Column facet field
    #[arg(long = "facet-column", value_name = "COL")]
    pub facet_column: Option<String>,

    /// Color field
    #[arg(long = "color-by", value_name = "COL")]
    pub color_by: Option<String>,

    /// Extra tooltip field, repeatable. Defaults to name-like columns when omitted.
    #[arg(long = "tooltip", value_name = "COL")]
    pub tooltips: Vec<String>,

    /// Plot width in pixels
    #[arg(long = "width")]
    pub width: Option<u32>,

    /// Plot height in pixels
    #[arg(long = "height")]
    pub height: Option<u32>,

    /// Plot name used as the download file name
    #[arg(long = "name", value_name = "NAME")]
    pub name: Option<String>,

    /// Write the Vega-Lite document here instead of stdout
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Subcommand, Debug)]
pub enum Command {
    /// Print each column with its role, dtype and suggested filter kind
    Columns {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print descriptive statistics for numeric and categorical columns
    Describe {
        #[command(flatten)]
        source: SourceArgs,

        /// Categorical column used to group the numeric statistics
        #[arg(long = "group-by", value_name = "COL")]
        group_by: Option<String>,

        /// Decimal places in the output (default from config, 2)
        #[arg(long = "precision")]
        precision: Option<u32>,
    },
    /// Write a histogram as a Vega-Lite specification
    Histogram {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        chart: ChartArgs,

        /// Numeric field to bin (default: picked from column names)
        #[arg(long = "x", value_name = "COL")]
        x: Option<String>,

        /// Maximum number of bins
        #[arg(long = "bins")]
        bins: Option<u32>,

        /// Scale of the count axis
        #[arg(long = "y-scale", value_enum, default_value_t = ScaleArg::Linear)]
        y_scale: ScaleArg,
    },
    /// Write a dot (strip) plot as a Vega-Lite specification
    Dot {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        chart: ChartArgs,

        /// Numeric field on the x axis
        #[arg(long = "x", value_name = "COL")]
        x: Option<String>,

        /// Categorical field on the y axis
        #[arg(long = "y", value_name = "COL")]
        y: Option<String>,

        /// X axis title (defaults to the field name)
        #[arg(long = "x-title")]
        x_title: Option<String>,

        /// Y axis title (defaults to the field name)
        #[arg(long = "y-title")]
        y_title: Option<String>,

        #[arg(long = "x-scale", value_enum, default_value_t = ScaleArg::Linear)]
        x_scale: ScaleArg,

        #[arg(long = "marker", value_enum, default_value_t = MarkerArg::Point)]
        marker: MarkerArg,

        /// Show an average marker per group
        #[arg(long = "average", value_enum)]
        average: Option<AverageArg>,

        /// Show dispersion error bars per group
        #[arg(long = "dispersion", value_enum)]
        dispersion: Option<DispersionArg>,

        /// Show a box plot per group
        #[arg(long = "box-plot", action)]
        box_plot: bool,
    },
    /// Write a scatter plot as a Vega-Lite specification
    Scatter {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        chart: ChartArgs,

        #[arg(long = "x", value_name = "COL")]
        x: Option<String>,

        #[arg(long = "y", value_name = "COL")]
        y: Option<String>,

        /// Size field
        #[arg(long = "size-by", value_name = "COL")]
        size_by: Option<String>,

        /// Shape field
        #[arg(long = "shape-by", value_name = "COL")]
        shape_by: Option<String>,

        #[arg(long = "x-scale", value_enum, default_value_t = ScaleArg::Linear)]
        x_scale: ScaleArg,

        #[arg(long = "y-scale", value_enum, default_value_t = ScaleArg::Linear)]
        y_scale: ScaleArg,

        #[arg(long = "average", value_enum)]
        average: Option<AverageArg>,

        #[arg(long = "dispersion", value_enum)]
        dispersion: Option<DispersionArg>,
    },
    /// Apply filters and write the remaining rows as CSV
    Filter {
        #[command(flatten)]
        source: SourceArgs,

        /// Columns to keep, repeatable (default: all)
        #[arg(long = "column", value_name = "COL")]
        columns: Vec<String>,

        /// Write CSV here instead of stdout
        #[arg(long = "output", short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Append a -log(p) column computed from a probability column and write CSV
    NegLog {
        #[command(flatten)]
        source: SourceArgs,

        /// Column holding probabilities / p-values
        #[arg(long = "column", value_name = "COL")]
        column: String,

        /// Logarithm base
        #[arg(long = "base", default_value_t = 10.0)]
        base: f64,

        /// Name of the new column (default: nlogp)
        #[arg(long = "name", value_name = "NAME")]
        name: Option<String>,

        #[arg(long = "output", short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// List the datasets in the example catalog
    Examples,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

fn render_arguments(cmd: &clap::Command, out: &mut String) {
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }
}

/// Render command-line options as markdown, one table for the global options and one per
/// subcommand.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    out.push_str(&cmd.render_usage().to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Global Options\n\n");
    render_arguments(&cmd, &mut out);

    for sub in cmd.get_subcommands() {
        if sub.get_name() == "help" {
            continue;
        }
        out.push_str(&format!("\n## `{}`\n\n", sub.get_name()));
        if let Some(about) = sub.get_about() {
            out.push_str(&format!("{}\n\n", about));
        }
        render_arguments(sub, &mut out);
    }

    out
}
