//! Row filters over a table, one specification per column, combined with AND.

use crate::error::{ExploreError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone as _, Utc};
use chrono_tz::Tz;
use polars::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use tracing::debug;

/// Columns with fewer distinct values than this are filtered by value set.
pub const DEFAULT_CATEGORICAL_THRESHOLD: usize = 10;

/// Display string used for null cells.
pub const NULL_DISPLAY: &str = "null";

const MICROS_PER_DAY: i64 = 86_400_000_000;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y"];

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    /// Keep rows whose display string is in the set.
    Values(BTreeSet<String>),
    /// Keep rows with `min <= value <= max`.
    Range { min: f64, max: f64 },
    /// Keep rows with `start <= timestamp <= end`. Zoned timestamps are compared by their local
    /// wall-clock time.
    DateRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Keep rows whose display string matches the regex; empty keeps everything.
    Pattern(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Values,
    Range,
    DateRange,
    Pattern,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Values => "values",
            Self::Range => "range",
            Self::DateRange => "date-range",
            Self::Pattern => "pattern",
        }
    }

    /// Which kind of filter suits `series`: categorical columns and columns with fewer than
    /// `threshold` distinct values get a value set, then numeric columns a range, then
    /// temporal columns (or text that fully parses as dates) a date range. Everything else
    /// gets a pattern. Nulls are not counted as a distinct value.
    pub fn detect(series: &Series, threshold: usize) -> Result<Self> {
        let dtype = series.dtype();
        let distinct = series.drop_nulls().n_unique()?;
        if matches!(dtype, DataType::Categorical(..)) || distinct < threshold {
            return Ok(Self::Values);
        }
        if dtype.is_numeric() || matches!(dtype, DataType::Boolean) {
            return Ok(Self::Range);
        }
        if datetime_micros(series)?.is_some() {
            return Ok(Self::DateRange);
        }
        Ok(Self::Pattern)
    }
}

impl FromStr for ColumnFilter {
    type Err = ExploreError;

    /// Parses `in:A,B`, `range:MIN..MAX`, `dates:START..END` or `match:REGEX`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ExploreError::InvalidFilterSpec(s.to_string());
        let (kind, body) = s.split_once(':').ok_or_else(invalid)?;
        match kind {
            "in" => Ok(Self::Values(
                body.split(',')
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            "range" => {
                let (min, max) = body.split_once("..").ok_or_else(invalid)?;
                let min = min.trim().parse::<f64>().map_err(|_| invalid())?;
                let max = max.trim().parse::<f64>().map_err(|_| invalid())?;
                Ok(Self::Range { min, max })
            }
            "dates" => {
                let (start, end) = body.split_once("..").ok_or_else(invalid)?;
                let start = parse_datetime(start.trim()).ok_or_else(invalid)?;
                let end = parse_datetime(end.trim()).ok_or_else(invalid)?;
                Ok(Self::DateRange { start, end })
            }
            "match" => {
                compile_pattern(body)?;
                Ok(Self::Pattern(body.to_string()))
            }
            _ => Err(invalid()),
        }
    }
}

/// Split a `COLUMN=SPEC` argument into the column name and its parsed filter.
pub fn parse_filter_arg(arg: &str) -> Result<(String, ColumnFilter)> {
    let (column, spec) = arg
        .split_once('=')
        .ok_or_else(|| ExploreError::InvalidFilterSpec(arg.to_string()))?;
    Ok((column.trim().to_string(), spec.parse()?))
}

/// Per-row display strings, with nulls shown as `"null"`.
pub fn display_values(series: &Series) -> Result<Vec<String>> {
    let as_text = series.cast(&DataType::String)?;
    Ok(as_text
        .str()?
        .iter()
        .map(|v| v.unwrap_or(NULL_DISPLAY).to_string())
        .collect())
}

/// The filter that keeps every row of `column`: all distinct values, the full numeric or
/// date span, or an empty pattern.
pub fn suggest_filter(df: &DataFrame, column: &str, threshold: usize) -> Result<ColumnFilter> {
    let series = df
        .column(column)
        .map_err(|_| ExploreError::UnknownField(column.to_string()))?
        .as_materialized_series();

    Ok(match FilterKind::detect(series, threshold)? {
        FilterKind::Values => ColumnFilter::Values(display_values(series)?.into_iter().collect()),
        FilterKind::Range => {
            let values = numeric_values(series)?;
            let observed = values.iter().flatten().copied().filter(|v| !v.is_nan());
            let (min, max) = observed.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
            if min > max {
                ColumnFilter::Range {
                    min: f64::NEG_INFINITY,
                    max: f64::INFINITY,
                }
            } else {
                ColumnFilter::Range { min, max }
            }
        }
        FilterKind::DateRange => {
            let micros = datetime_micros(series)?.unwrap_or_default();
            let present = || micros.iter().flatten().copied();
            let start = present().min().and_then(from_micros);
            let end = present().max().and_then(from_micros);
            ColumnFilter::DateRange {
                start: start.unwrap_or(NaiveDateTime::MIN),
                end: end.unwrap_or(NaiveDateTime::MAX),
            }
        }
        FilterKind::Pattern => ColumnFilter::Pattern(String::new()),
    })
}

/// Apply every column filter (AND) and return the narrowed table.
pub fn filter(df: &DataFrame, filters: &BTreeMap<String, ColumnFilter>) -> Result<DataFrame> {
    if filters.is_empty() {
        return Ok(df.clone());
    }

    let mut keep = vec![true; df.height()];
    for (column, spec) in filters {
        let series = df
            .column(column)
            .map_err(|_| ExploreError::UnknownField(column.clone()))?
            .as_materialized_series();
        let column_mask = mask_for(series, column, spec)?;
        for (k, m) in keep.iter_mut().zip(column_mask) {
            *k = *k && m;
        }
    }

    let mask = BooleanChunked::from_slice("mask".into(), &keep);
    let out = df.filter(&mask)?;
    debug!(
        filters = filters.len(),
        rows_in = df.height(),
        rows_out = out.height(),
        "filter"
    );
    Ok(out)
}

fn mask_for(series: &Series, column: &str, spec: &ColumnFilter) -> Result<Vec<bool>> {
    match spec {
        ColumnFilter::Values(allowed) => Ok(display_values(series)?
            .iter()
            .map(|v| allowed.contains(v))
            .collect()),
        ColumnFilter::Range { min, max } => Ok(numeric_values(series)?
            .into_iter()
            .map(|v| v.is_some_and(|x| x >= *min && x <= *max))
            .collect()),
        ColumnFilter::DateRange { start, end } => {
            let micros = datetime_micros(series)?.ok_or_else(|| {
                ExploreError::InvalidFilterSpec(format!("{} is not a date column", column))
            })?;
            let lo = start.and_utc().timestamp_micros();
            let hi = end.and_utc().timestamp_micros();
            Ok(micros
                .into_iter()
                .map(|v| v.is_some_and(|t| t >= lo && t <= hi))
                .collect())
        }
        ColumnFilter::Pattern(pattern) => {
            if pattern.is_empty() {
                return Ok(vec![true; series.len()]);
            }
            let re = compile_pattern(pattern)?;
            let as_text = series.cast(&DataType::String)?;
            Ok(as_text
                .str()?
                .iter()
                .map(|v| v.is_some_and(|s| re.is_match(s)))
                .collect())
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ExploreError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let as_float = series.cast(&DataType::Float64)?;
    Ok(as_float.f64()?.iter().collect())
}

/// Timestamps as naive microseconds, or `None` when the column is not date-like.
/// Zoned datetimes are shifted to local wall-clock time and lose their zone.
fn datetime_micros(series: &Series) -> Result<Option<Vec<Option<i64>>>> {
    match series.dtype() {
        DataType::Date => {
            let days = series.cast(&DataType::Int32)?;
            Ok(Some(
                days.i32()?
                    .iter()
                    .map(|d| d.map(|d| d as i64 * MICROS_PER_DAY))
                    .collect(),
            ))
        }
        DataType::Datetime(unit, zone) => {
            let unit = *unit;
            let zone = match zone {
                Some(tz) => {
                    let parsed = parse_zone(tz.as_str());
                    if parsed.is_none() {
                        debug!(zone = tz.as_str(), "unknown time zone, comparing as UTC");
                    }
                    parsed
                }
                None => None,
            };
            let raw = series.cast(&DataType::Int64)?;
            Ok(Some(
                raw.i64()?
                    .iter()
                    .map(|v| {
                        let micros = v.map(|v| to_micros(v, unit));
                        match &zone {
                            Some(zone) => micros.and_then(|m| zone.wall_clock_micros(m)),
                            None => micros,
                        }
                    })
                    .collect(),
            ))
        }
        DataType::String => {
            let text = series.str()?;
            let mut out = Vec::with_capacity(text.len());
            let mut any = false;
            for v in text.iter() {
                match v {
                    None => out.push(None),
                    Some(s) => match parse_datetime(s) {
                        Some(dt) => {
                            any = true;
                            out.push(Some(dt.and_utc().timestamp_micros()));
                        }
                        None => return Ok(None),
                    },
                }
            }
            Ok(any.then_some(out))
        }
        _ => Ok(None),
    }
}

/// Parse a date or datetime string. RFC 3339 strings keep their local time and drop the
/// offset.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Raw datetime value in `unit` to microseconds, flooring sub-microsecond parts.
pub(crate) fn to_micros(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => value.div_euclid(1_000),
        TimeUnit::Microseconds => value,
        TimeUnit::Milliseconds => value * 1_000,
    }
}

/// Zone attached to a datetime column: an IANA name or a fixed `+HH:MM` offset.
#[derive(Debug, Clone, Copy)]
enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

fn parse_zone(name: &str) -> Option<Zone> {
    name.parse::<Tz>()
        .map(Zone::Named)
        .ok()
        .or_else(|| name.parse::<FixedOffset>().map(Zone::Fixed).ok())
}

impl Zone {
    /// Local wall-clock microseconds for a UTC instant.
    fn wall_clock_micros(&self, utc_micros: i64) -> Option<i64> {
        let utc = from_micros(utc_micros)?;
        let offset_secs = match self {
            Zone::Named(tz) => tz.offset_from_utc_datetime(&utc).fix().local_minus_utc(),
            Zone::Fixed(offset) => offset.local_minus_utc(),
        };
        Some(utc_micros + offset_secs as i64 * 1_000_000)
    }
}

fn from_micros(micros: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}
