use clap::{CommandFactory, Parser};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use gridsurf::cache::{load_cached, NoCache};
use gridsurf::chart::{self, Average, Dispersion, MarkerKind};
use gridsurf::error_display::describe_failure;
use gridsurf::filter::{filter, parse_filter_arg, FilterKind};
use gridsurf::{
    classify, describe_with_precision, with_neg_log_column, AppConfig, ConfigManager, DataSource,
    ExampleCatalog, LoadOptions, ScaleKind, APP_NAME, LOG_ENV,
};
use gridsurf_cli::{AverageArg, ChartArgs, Command, DispersionArg, MarkerArg, ScaleArg, SourceArgs};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gridsurf_cli::Args;

/// Catalog used when `file_loading.catalog` is not configured.
const DEFAULT_CATALOG: &str = "data/demo_datasets.json";

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("gridsurf=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("gridsurf=warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let config_manager = ConfigManager::new(APP_NAME)?;
        let path = config_manager.write_default_config(args.force)?;
        println!("Configuration file written to {}", path.display());
        return Ok(Some(()));
    }
    Ok(None)
}

fn load_config(args: &Args) -> Result<AppConfig> {
    match &args.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(APP_NAME),
    }
}

fn catalog_path(config: &AppConfig) -> PathBuf {
    config
        .file_loading
        .catalog
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG))
}

fn scale(arg: ScaleArg) -> Result<ScaleKind> {
    Ok(arg.token().parse::<ScaleKind>()?)
}

fn average(arg: AverageArg) -> Average {
    match arg {
        AverageArg::Mean => Average::Mean,
        AverageArg::Median => Average::Median,
    }
}

fn dispersion(arg: DispersionArg) -> Dispersion {
    match arg {
        DispersionArg::Iqr => Dispersion::Iqr,
        DispersionArg::Stdev => Dispersion::Stdev,
        DispersionArg::Stderr => Dispersion::Stderr,
        DispersionArg::Ci => Dispersion::Ci,
    }
}

fn marker(arg: MarkerArg) -> MarkerKind {
    match arg {
        MarkerArg::Point => MarkerKind::Point,
        MarkerArg::Tick => MarkerKind::Tick,
    }
}

/// Resolve the source, load it and apply the `--filter` arguments.
fn load_table(source: &SourceArgs, config: &AppConfig) -> Result<DataFrame> {
    let mut options = LoadOptions::from_config(&config.file_loading);
    if let Some(delimiter) = source.delimiter {
        if !delimiter.is_ascii() {
            return Err(eyre!("Delimiter must be a single ASCII character, got '{}'", delimiter));
        }
        options.delimiter = Some(delimiter as u8);
    }

    let (data_source, display_path) = match (&source.path, &source.example) {
        (Some(path), _) => (
            DataSource::from_path(path, source.mime.as_deref())?,
            Some(path.clone()),
        ),
        (None, Some(name)) => {
            let catalog_path = catalog_path(config);
            let catalog = ExampleCatalog::from_path(&catalog_path)
                .wrap_err_with(|| format!("Failed to read example catalog {}", catalog_path.display()))?;
            if let Some(dir) = catalog.base_dir() {
                options.catalog_dir = Some(dir.to_path_buf());
            }
            (DataSource::Example(catalog.get(name)?), None)
        }
        (None, None) => return Err(eyre!("Give a file path or --example NAME")),
    };

    let df = load_cached(&mut NoCache, &data_source, &options).map_err(|e| {
        let report = color_eyre::eyre::Report::new(e);
        let failure = describe_failure(&report, display_path.as_deref());
        eyre!("{}\n\nDetails:\n  {}", failure.message, failure.detail)
    })?;

    let mut filters = BTreeMap::new();
    for arg in &source.filters {
        let (column, spec) = parse_filter_arg(arg)?;
        filters.insert(column, spec);
    }
    Ok(filter(&df, &filters)?)
}

fn apply_chart_args(common: &mut chart::CommonOptions, args: &ChartArgs) {
    if args.color_by.is_some() {
        common.color_by = args.color_by.clone();
    }
    if args.facet_row.is_some() {
        common.facet_row = args.facet_row.clone();
    }
    if args.facet_column.is_some() {
        common.facet_column = args.facet_column.clone();
    }
    if !args.tooltips.is_empty() {
        common.tooltips = args.tooltips.clone();
    }
    if let Some(width) = args.width {
        common.width = width;
    }
    if let Some(height) = args.height {
        common.height = height;
    }
    if let Some(name) = &args.name {
        common.name = name.clone();
    }
}

fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn write_csv(df: &mut DataFrame, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
            CsvWriter::new(&mut file).include_header(true).finish(df)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            CsvWriter::new(&mut stdout).include_header(true).finish(df)?;
        }
    }
    Ok(())
}

fn write_chart(spec: &chart::ChartSpec, output: Option<&Path>) -> Result<()> {
    let document = serde_json::to_string_pretty(&spec.to_vega_lite())?;
    write_output(&document, output)
}

fn run(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::Columns { source } => {
            let df = load_table(&source, config)?;
            let types = classify(&df);
            let threshold = config.filter.categorical_threshold;
            for column in df.get_columns() {
                let role = if types.is_numeric(column.name()) {
                    "numeric"
                } else {
                    "categorical"
                };
                let kind = FilterKind::detect(column.as_materialized_series(), threshold)?;
                println!(
                    "{}\t{}\t{}\t{}",
                    column.name(),
                    role,
                    column.dtype(),
                    kind.as_str()
                );
            }
        }
        Command::Describe {
            source,
            group_by,
            precision,
        } => {
            let df = load_table(&source, config)?;
            let types = classify(&df);
            let precision = precision.unwrap_or(config.describe.precision);
            let mut result = describe_with_precision(&df, &types, group_by.as_deref(), precision)?;
            println!("# numeric");
            write_csv(&mut result.numeric, None)?;
            println!("\n# categorical");
            write_csv(&mut result.categorical, None)?;
        }
        Command::Histogram {
            source,
            chart: chart_args,
            x,
            bins,
            y_scale,
        } => {
            let df = load_table(&source, config)?;
            let types = classify(&df);
            let mut options = chart::HistogramOptions::defaults_for(&types, &config.chart)?;
            if let Some(x) = x {
                options.x = x;
            }
            if let Some(bins) = bins {
                options.bins = bins;
            }
            options.y_scale = scale(y_scale)?;
            apply_chart_args(&mut options.common, &chart_args);
            let spec = chart::histogram::assemble(&df, &options)?;
            write_chart(&spec, chart_args.output.as_deref())?;
        }
        Command::Dot {
            source,
            chart: chart_args,
            x,
            y,
            x_title,
            y_title,
            x_scale,
            marker: marker_arg,
            average: average_arg,
            dispersion: dispersion_arg,
            box_plot,
        } => {
            let df = load_table(&source, config)?;
            let types = classify(&df);
            let mut options = chart::DotOptions::defaults_for(&types, &config.chart)?;
            if let Some(x) = x {
                options.x = x;
            }
            if let Some(y) = y {
                options.y = y;
            }
            options.x_title = x_title;
            options.y_title = y_title;
            options.x_scale = scale(x_scale)?;
            options.style.marker = marker(marker_arg);
            options.average = average_arg.map(average);
            options.dispersion = dispersion_arg.map(dispersion);
            options.box_plot = box_plot;
            apply_chart_args(&mut options.common, &chart_args);
            let spec = chart::dot::assemble(&df, &options)?;
            write_chart(&spec, chart_args.output.as_deref())?;
        }
        Command::Scatter {
            source,
            chart: chart_args,
            x,
            y,
            size_by,
            shape_by,
            x_scale,
            y_scale,
            average: average_arg,
            dispersion: dispersion_arg,
        } => {
            let df = load_table(&source, config)?;
            let types = classify(&df);
            let mut options = chart::ScatterOptions::defaults_for(&types, &config.chart)?;
            if let Some(x) = x {
                options.x = x;
            }
            if let Some(y) = y {
                options.y = y;
            }
            options.size_by = size_by;
            options.shape_by = shape_by;
            options.x_scale = scale(x_scale)?;
            options.y_scale = scale(y_scale)?;
            options.average = average_arg.map(average);
            options.dispersion = dispersion_arg.map(dispersion);
            apply_chart_args(&mut options.common, &chart_args);
            let spec = chart::scatter::assemble(&df, &options)?;
            write_chart(&spec, chart_args.output.as_deref())?;
        }
        Command::Filter {
            source,
            columns,
            output,
        } => {
            let df = load_table(&source, config)?;
            let mut df = if columns.is_empty() {
                df
            } else {
                df.select(columns.iter().map(String::as_str))?
            };
            write_csv(&mut df, output.as_deref())?;
        }
        Command::NegLog {
            source,
            column,
            base,
            name,
            output,
        } => {
            let df = load_table(&source, config)?;
            let name = name.unwrap_or_else(|| gridsurf::session::DEFAULT_NEG_LOG_NAME.to_string());
            let mut df = with_neg_log_column(&df, &column, base, &name)?;
            write_csv(&mut df, output.as_deref())?;
        }
        Command::Examples => {
            let catalog_path = catalog_path(config);
            let catalog = ExampleCatalog::from_path(&catalog_path)
                .wrap_err_with(|| format!("Failed to read example catalog {}", catalog_path.display()))?;
            for (name, entry) in catalog.entries() {
                println!("{}\t{}\t{}", name, entry.source.as_str(), entry.file);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(args.debug);

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let Some(command) = args.command.clone() else {
        Args::command().print_help()?;
        return Ok(());
    };

    let config = load_config(&args)?;
    if let Err(e) = run(command, &config) {
        eprintln!("Error: {}", e);
        if args.debug {
            eprintln!("{:?}", e);
        }
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_chart_args_overrides_only_given_values() {
        let mut common = chart::CommonOptions {
            tooltips: vec!["gene_name".into()],
            width: 400,
            height: 200,
            name: "dot_plot".into(),
            ..Default::default()
        };
        let args = ChartArgs {
            color_by: Some("group".into()),
            height: Some(300),
            ..Default::default()
        };
        apply_chart_args(&mut common, &args);
        assert_eq!(common.color_by.as_deref(), Some("group"));
        assert_eq!(common.tooltips, vec!["gene_name"]);
        assert_eq!(common.width, 400);
        assert_eq!(common.height, 300);
    }

    #[test]
    fn test_value_enum_mapping() {
        assert_eq!(scale(ScaleArg::Log2).unwrap(), ScaleKind::Log2);
        assert_eq!(average(AverageArg::Median), Average::Median);
        assert_eq!(dispersion(DispersionArg::Ci).as_str(), "ci");
        assert_eq!(marker(MarkerArg::Tick), MarkerKind::Tick);
    }
}
