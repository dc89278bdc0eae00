//! Request-scoped exploration state.
//!
//! A session is a plain value: [`update`] folds one [`Event`] into a new [`SessionState`], and
//! [`render`] recomputes every panel of the [`View`] from that state. Loading goes through the
//! [`Explorer`]'s table cache, so rendering the same state twice parses the source once.
//! A panel that fails carries a [`PanelError`]; the other panels are still rendered.

use crate::cache::{load_cached, TableCache};
use crate::chart::{dot, histogram, scatter, ChartSpec, DotOptions, HistogramOptions, ScatterOptions};
use crate::columns::{classify, ColumnTypeMap};
use crate::config::AppConfig;
use crate::error::{ExploreError, Result};
use crate::error_display::{describe_explore_error, FailureReport};
use crate::filter::{filter, suggest_filter, ColumnFilter, FilterKind};
use crate::source::{DataSource, LoadOptions};
use crate::statistics::{describe_with_precision, DescribeResult};
use crate::transform::with_neg_log_column;
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Name given to a derived -log(p) column when none is requested.
pub const DEFAULT_NEG_LOG_NAME: &str = "nlogp";

/// A -log column appended to the loaded table before filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct NegLogColumn {
    pub column: String,
    pub base: f64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub source: Option<DataSource>,
    pub derived: Vec<NegLogColumn>,
    pub filters: BTreeMap<String, ColumnFilter>,
    /// Grid columns in display order; None shows every column.
    pub visible_columns: Option<Vec<String>>,
    pub group_by: Option<String>,
    /// Chart options chosen by the user; None falls back to defaults for the current table.
    pub histogram: Option<HistogramOptions>,
    pub dot: Option<DotOptions>,
    pub scatter: Option<ScatterOptions>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Replace the data source. Everything tied to the previous table is dropped.
    Load(DataSource),
    AddNegLog(NegLogColumn),
    SetFilter(String, ColumnFilter),
    ClearFilter(String),
    ClearFilters,
    ShowColumns(Vec<String>),
    ShowAllColumns,
    GroupBy(Option<String>),
    Histogram(HistogramOptions),
    Dot(DotOptions),
    Scatter(ScatterOptions),
    /// Keep the source, drop every other choice.
    Reset,
}

/// Fold one event into the state.
pub fn update(state: &SessionState, event: Event) -> SessionState {
    let mut next = state.clone();
    match event {
        Event::Load(source) => {
            next = SessionState {
                source: Some(source),
                ..Default::default()
            };
        }
        Event::AddNegLog(column) => {
            next.derived.retain(|d| d.name != column.name);
            next.derived.push(column);
        }
        Event::SetFilter(column, spec) => {
            next.filters.insert(column, spec);
        }
        Event::ClearFilter(column) => {
            next.filters.remove(&column);
        }
        Event::ClearFilters => next.filters.clear(),
        Event::ShowColumns(columns) => next.visible_columns = Some(columns),
        Event::ShowAllColumns => next.visible_columns = None,
        Event::GroupBy(group) => next.group_by = group,
        Event::Histogram(options) => next.histogram = Some(options),
        Event::Dot(options) => next.dot = Some(options),
        Event::Scatter(options) => next.scatter = Some(options),
        Event::Reset => {
            next = SessionState {
                source: state.source.clone(),
                ..Default::default()
            };
        }
    }
    next
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Grid,
    Describe,
    Histogram,
    Dot,
    Scatter,
}

impl PanelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelKind::Grid => "grid",
            PanelKind::Describe => "describe",
            PanelKind::Histogram => "histogram",
            PanelKind::Dot => "dot",
            PanelKind::Scatter => "scatter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelError {
    pub panel: PanelKind,
    pub failure: FailureReport,
}

impl PanelError {
    fn new(panel: PanelKind, err: &ExploreError) -> Self {
        warn!(panel = panel.as_str(), error = %err, "panel failed");
        Self {
            panel,
            failure: describe_explore_error(err),
        }
    }
}

pub type Panel<T> = std::result::Result<T, PanelError>;

/// The table as the grid shows it, after derived columns, filters and column selection.
#[derive(Debug, Clone)]
pub struct GridView {
    pub table: DataFrame,
    pub types: ColumnTypeMap,
    pub total_rows: usize,
    /// Filter widget kind per shown column, judged on the unfiltered values.
    pub filter_kinds: BTreeMap<String, FilterKind>,
}

/// A chart together with the options it was built from, for seeding the option widgets.
#[derive(Debug, Clone)]
pub struct ChartPanel<O> {
    pub options: O,
    pub spec: ChartSpec,
}

#[derive(Debug, Default)]
pub struct View {
    pub source_name: Option<String>,
    /// Set when the source could not be loaded; all panels are then absent.
    pub load_error: Option<FailureReport>,
    pub grid: Option<Panel<GridView>>,
    pub describe: Option<Panel<DescribeResult>>,
    pub histogram: Option<Panel<ChartPanel<HistogramOptions>>>,
    pub dot: Option<Panel<ChartPanel<DotOptions>>>,
    pub scatter: Option<Panel<ChartPanel<ScatterOptions>>>,
}

/// Long-lived collaborators of a session: configuration and the table cache.
pub struct Explorer {
    pub config: AppConfig,
    pub load_options: LoadOptions,
    cache: Box<dyn TableCache>,
}

impl Explorer {
    pub fn new(config: AppConfig, cache: Box<dyn TableCache>) -> Self {
        let load_options = LoadOptions::from_config(&config.file_loading);
        Self {
            config,
            load_options,
            cache,
        }
    }

    pub fn load(&mut self, source: &DataSource) -> Result<DataFrame> {
        load_cached(self.cache.as_mut(), source, &self.load_options)
    }

    /// The no-op filter that seeds `column`'s filter widget: every value, the full range,
    /// the full date span or an empty pattern. Derived columns of `state` are available.
    pub fn suggest_filter(&mut self, state: &SessionState, column: &str) -> Result<ColumnFilter> {
        let source = state
            .source
            .as_ref()
            .ok_or_else(|| ExploreError::UnknownField(column.to_string()))?;
        let df = with_derived(state, &self.load(source)?)?;
        suggest_filter(&df, column, self.config.filter.categorical_threshold)
    }
}

/// Recompute every panel for `state`.
pub fn render(state: &SessionState, explorer: &mut Explorer) -> View {
    let Some(source) = &state.source else {
        return View::default();
    };
    let mut view = View {
        source_name: Some(source.name().to_string()),
        ..Default::default()
    };

    let loaded = match explorer.load(source) {
        Ok(df) => df,
        Err(e) => {
            warn!(source = source.name(), error = %e, "load failed");
            view.load_error = Some(describe_explore_error(&e));
            return view;
        }
    };

    // Downstream panels fall back to the loaded table when the grid stage fails.
    let grid = grid_view(state, &loaded, explorer.config.filter.categorical_threshold);
    let (table, types) = match &grid {
        Ok(g) => (g.table.clone(), g.types.clone()),
        Err(_) => (loaded.clone(), classify(&loaded)),
    };
    view.grid = Some(grid);
    debug!(rows = table.height(), columns = table.width(), "rendering panels");

    view.describe = Some(
        describe_with_precision(
            &table,
            &types,
            state.group_by.as_deref(),
            explorer.config.describe.precision,
        )
        .map_err(|e| PanelError::new(PanelKind::Describe, &e)),
    );

    let chart = &explorer.config.chart;
    view.histogram = Some(chart_panel(
        PanelKind::Histogram,
        state.histogram.clone(),
        || HistogramOptions::defaults_for(&types, chart),
        |o| histogram::assemble(&table, o),
    ));
    view.dot = Some(chart_panel(
        PanelKind::Dot,
        state.dot.clone(),
        || DotOptions::defaults_for(&types, chart),
        |o| dot::assemble(&table, o),
    ));
    view.scatter = Some(chart_panel(
        PanelKind::Scatter,
        state.scatter.clone(),
        || ScatterOptions::defaults_for(&types, chart),
        |o| scatter::assemble(&table, o),
    ));

    view
}

fn with_derived(state: &SessionState, loaded: &DataFrame) -> Result<DataFrame> {
    let mut df = loaded.clone();
    for derived in &state.derived {
        df = with_neg_log_column(&df, &derived.column, derived.base, &derived.name)?;
    }
    Ok(df)
}

fn grid_view(state: &SessionState, loaded: &DataFrame, threshold: usize) -> Panel<GridView> {
    let build = || -> Result<GridView> {
        let unfiltered = with_derived(state, loaded)?;
        let df = filter(&unfiltered, &state.filters)?;
        let df = match &state.visible_columns {
            Some(columns) => {
                if let Some(missing) = columns.iter().find(|c| df.column(c).is_err()) {
                    return Err(ExploreError::UnknownField(missing.clone()));
                }
                df.select(columns.iter().map(String::as_str))?
            }
            None => df,
        };
        let types = classify(&df);
        let mut filter_kinds = BTreeMap::new();
        for name in &types.all_columns {
            let series = unfiltered.column(name)?.as_materialized_series();
            filter_kinds.insert(name.clone(), FilterKind::detect(series, threshold)?);
        }
        Ok(GridView {
            table: df,
            types,
            total_rows: loaded.height(),
            filter_kinds,
        })
    };
    build().map_err(|e| PanelError::new(PanelKind::Grid, &e))
}

fn chart_panel<O, D, A>(
    panel: PanelKind,
    chosen: Option<O>,
    defaults: D,
    assemble: A,
) -> Panel<ChartPanel<O>>
where
    D: FnOnce() -> Result<O>,
    A: FnOnce(&O) -> Result<ChartSpec>,
{
    let build = || -> Result<ChartPanel<O>> {
        let options = match chosen {
            Some(o) => o,
            None => defaults()?,
        };
        let spec = assemble(&options)?;
        Ok(ChartPanel { options, spec })
    };
    build().map_err(|e| PanelError::new(panel, &e))
}
