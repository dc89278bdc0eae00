use crate::columns::ColumnTypeMap;
use crate::error::{ExploreError, Result};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Decimal places used when the caller does not choose a precision.
pub const DEFAULT_PRECISION: u32 = 2;

pub const FIELD_COLUMN: &str = "field";
pub const NUMERIC_STAT_COLUMNS: [&str; 8] =
    ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
pub const CATEGORICAL_STAT_COLUMNS: [&str; 4] = ["count", "unique", "top", "freq"];

/// Summary tables produced by [`describe`].
#[derive(Debug, Clone)]
pub struct DescribeResult {
    /// One row per numeric column (or per column and group when grouped).
    pub numeric: DataFrame,
    /// One row per categorical column.
    pub categorical: DataFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericSummary {
    pub count: u64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    fn rounded(self, precision: u32) -> Self {
        let r = |v: Option<f64>| v.map(|x| round_to(x, precision));
        Self {
            count: self.count,
            mean: r(self.mean),
            std: r(self.std),
            min: r(self.min),
            q25: r(self.q25),
            median: r(self.median),
            q75: r(self.q75),
            max: r(self.max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoricalSummary {
    pub count: u64,
    pub unique: u64,
    pub top: Option<String>,
    pub freq: Option<u64>,
}

/// [`describe_with_precision`] with two decimal places.
pub fn describe(
    df: &DataFrame,
    types: &ColumnTypeMap,
    group_by: Option<&str>,
) -> Result<DescribeResult> {
    describe_with_precision(df, types, group_by, DEFAULT_PRECISION)
}

/// Numeric and categorical summaries of `df`, optionally grouping the numeric summary by a
/// categorical column. Grouped rows are sorted by column name, then group value, with the
/// null group last.
pub fn describe_with_precision(
    df: &DataFrame,
    types: &ColumnTypeMap,
    group_by: Option<&str>,
    precision: u32,
) -> Result<DescribeResult> {
    if let Some(group) = group_by {
        if !types.is_categorical(group) || df.column(group).is_err() {
            return Err(ExploreError::InvalidGroupColumn(group.to_string()));
        }
    }
    for name in types.numeric.iter().chain(&types.categorical) {
        if df.column(name).is_err() {
            return Err(ExploreError::UnknownField(name.clone()));
        }
    }

    let numeric = match group_by {
        None => describe_numeric(df, &types.numeric, precision)?,
        Some(group) => describe_numeric_grouped(df, &types.numeric, group, precision)?,
    };
    let categorical = describe_categorical(df, &types.categorical)?;

    debug!(
        numeric_rows = numeric.height(),
        categorical_rows = categorical.height(),
        group_by,
        "describe"
    );
    Ok(DescribeResult {
        numeric,
        categorical,
    })
}

fn describe_numeric(df: &DataFrame, columns: &[String], precision: u32) -> Result<DataFrame> {
    let mut fields = Vec::with_capacity(columns.len());
    let mut rows = Vec::with_capacity(columns.len());
    for name in columns {
        let values: Vec<f64> = get_numeric_values_as_f64(df.column(name)?.as_materialized_series())
            .into_iter()
            .flatten()
            .collect();
        fields.push(name.clone());
        rows.push(compute_numeric_summary(&values).rounded(precision));
    }
    let mut frame: Vec<Column> = vec![Series::new(FIELD_COLUMN.into(), fields).into()];
    frame.extend(numeric_columns(&rows));
    Ok(DataFrame::new(frame)?)
}

fn describe_numeric_grouped(
    df: &DataFrame,
    columns: &[String],
    group_by: &str,
    precision: u32,
) -> Result<DataFrame> {
    let group_keys = group_labels(df.column(group_by)?.as_materialized_series())?;
    let groups = ordered_groups(&group_keys);

    let mut sorted_columns: Vec<&String> = columns.iter().collect();
    sorted_columns.sort();

    let mut fields = Vec::new();
    let mut group_values: Vec<Option<String>> = Vec::new();
    let mut rows = Vec::new();
    for name in sorted_columns {
        let values = get_numeric_values_as_f64(df.column(name)?.as_materialized_series());
        for group in &groups {
            let in_group: Vec<f64> = values
                .iter()
                .zip(&group_keys)
                .filter(|(_, key)| *key == group)
                .filter_map(|(v, _)| *v)
                .collect();
            fields.push(name.clone());
            group_values.push(group.clone());
            rows.push(compute_numeric_summary(&in_group).rounded(precision));
        }
    }

    let mut frame: Vec<Column> = vec![
        Series::new(FIELD_COLUMN.into(), fields).into(),
        Series::new(group_by.into(), group_values).into(),
    ];
    frame.extend(numeric_columns(&rows));
    Ok(DataFrame::new(frame)?)
}

fn describe_categorical(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    let mut fields = Vec::with_capacity(columns.len());
    let mut summaries = Vec::with_capacity(columns.len());
    for name in columns {
        let labels = group_labels(df.column(name)?.as_materialized_series())?;
        fields.push(name.clone());
        summaries.push(compute_categorical_summary(&labels));
    }

    let frame: Vec<Column> = vec![
        Series::new(FIELD_COLUMN.into(), fields).into(),
        Series::new(
            "count".into(),
            summaries.iter().map(|s| s.count).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "unique".into(),
            summaries.iter().map(|s| s.unique).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "top".into(),
            summaries.iter().map(|s| s.top.clone()).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "freq".into(),
            summaries.iter().map(|s| s.freq).collect::<Vec<_>>(),
        )
        .into(),
    ];
    Ok(DataFrame::new(frame)?)
}

fn numeric_columns(rows: &[NumericSummary]) -> Vec<Column> {
    let stat = |name: &str, get: fn(&NumericSummary) -> Option<f64>| -> Column {
        Series::new(name.into(), rows.iter().map(get).collect::<Vec<_>>()).into()
    };
    vec![
        Series::new(
            "count".into(),
            rows.iter().map(|r| r.count).collect::<Vec<_>>(),
        )
        .into(),
        stat("mean", |r| r.mean),
        stat("std", |r| r.std),
        stat("min", |r| r.min),
        stat("25%", |r| r.q25),
        stat("50%", |r| r.median),
        stat("75%", |r| r.q75),
        stat("max", |r| r.max),
    ]
}

/// Per-row values as f64; nulls, NaN and values that cannot be cast become `None`.
fn get_numeric_values_as_f64(series: &Series) -> Vec<Option<f64>> {
    match series.cast(&DataType::Float64) {
        Ok(cast_series) => match cast_series.f64() {
            Ok(ca) => ca.iter().map(|v| v.filter(|x| !x.is_nan())).collect(),
            Err(_) => vec![None; series.len()],
        },
        Err(_) => vec![None; series.len()],
    }
}

/// Per-row display labels of a textual (or any castable) column.
fn group_labels(series: &Series) -> Result<Vec<Option<String>>> {
    let as_text = series.cast(&DataType::String)?;
    Ok(as_text
        .str()?
        .iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Distinct group keys, sorted, with the null key (when present) last.
fn ordered_groups(keys: &[Option<String>]) -> Vec<Option<String>> {
    let mut present: Vec<String> = keys.iter().flatten().cloned().collect();
    present.sort();
    present.dedup();
    let mut groups: Vec<Option<String>> = present.into_iter().map(Some).collect();
    if keys.iter().any(Option::is_none) {
        groups.push(None);
    }
    groups
}

pub fn compute_numeric_summary(values: &[f64]) -> NumericSummary {
    let count = values.len();
    if count == 0 {
        return NumericSummary::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = count as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    // Sample std (ddof=1)
    let std = if count > 1 {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        Some((ss / (n - 1.0)).sqrt())
    } else {
        None
    };

    NumericSummary {
        count: count as u64,
        mean: Some(mean),
        std,
        min: sorted.first().copied(),
        q25: Some(quantile_linear(&sorted, 0.25)),
        median: Some(quantile_linear(&sorted, 0.5)),
        q75: Some(quantile_linear(&sorted, 0.75)),
        max: sorted.last().copied(),
    }
}

/// Quantile of pre-sorted, non-empty values with linear interpolation between ranks.
fn quantile_linear(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Count of non-null labels, distinct labels, and the most frequent label (ties go to the
/// label seen first).
pub fn compute_categorical_summary(labels: &[Option<String>]) -> CategoricalSummary {
    let mut first_seen: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for label in labels.iter().flatten() {
        let entry = counts.entry(label.as_str()).or_insert_with(|| {
            first_seen.push(label.as_str());
            0
        });
        *entry += 1;
    }

    let mut top: Option<(&str, u64)> = None;
    for label in &first_seen {
        let freq = counts.get(label).copied().unwrap_or(0);
        let better = match top {
            None => true,
            Some((_, best)) => freq > best,
        };
        if better {
            top = Some((*label, freq));
        }
    }

    CategoricalSummary {
        count: counts.values().sum(),
        unique: first_seen.len() as u64,
        top: top.map(|(label, _)| label.to_string()),
        freq: top.map(|(_, freq)| freq),
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::classify;

    fn stat(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
        df.column(column).unwrap().f64().unwrap().get(row)
    }

    #[test]
    fn test_numeric_summary_quartiles() {
        let s = compute_numeric_summary(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, Some(2.5));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.q25, Some(1.75));
        assert_eq!(s.median, Some(2.5));
        assert_eq!(s.q75, Some(3.25));
        assert_eq!(s.max, Some(4.0));
        let std = s.std.unwrap();
        assert!((std - 1.2909944).abs() < 1e-6);
    }

    #[test]
    fn test_numeric_summary_single_and_empty() {
        let one = compute_numeric_summary(&[7.0]);
        assert_eq!(one.count, 1);
        assert_eq!(one.std, None);
        assert_eq!(one.q75, Some(7.0));
        assert_eq!(compute_numeric_summary(&[]), NumericSummary::default());
    }

    #[test]
    fn test_categorical_summary_tie_breaks_on_first_seen() {
        let labels: Vec<Option<String>> = ["b", "a", "a", "b", "c"]
            .iter()
            .map(|s| Some(s.to_string()))
            .chain([None])
            .collect();
        let s = compute_categorical_summary(&labels);
        assert_eq!(s.count, 5);
        assert_eq!(s.unique, 3);
        assert_eq!(s.top.as_deref(), Some("b"));
        assert_eq!(s.freq, Some(2));
    }

    #[test]
    fn test_describe_ungrouped_keeps_column_order() {
        let df = df!(
            "z" => [1.0f64, 2.0, 3.0],
            "a" => [10i64, 20, 30],
            "label" => ["x", "y", "x"]
        )
        .unwrap();
        let types = classify(&df);
        let result = describe(&df, &types, None).unwrap();

        let fields: Vec<&str> = result
            .numeric
            .column("field")
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(fields, vec!["z", "a"]);
        assert_eq!(stat(&result.numeric, "mean", 1), Some(20.0));
        assert_eq!(stat(&result.numeric, "std", 0), Some(1.0));

        let cat = &result.categorical;
        assert_eq!(cat.height(), 1);
        assert_eq!(
            cat.column("top").unwrap().str().unwrap().get(0),
            Some("x")
        );
        assert_eq!(cat.column("freq").unwrap().u64().unwrap().get(0), Some(2));
    }

    #[test]
    fn test_describe_rounds_to_precision() {
        let df = df!("v" => [1.0f64, 2.0, 2.0]).unwrap();
        let types = classify(&df);
        let result = describe_with_precision(&df, &types, None, 3).unwrap();
        assert_eq!(stat(&result.numeric, "mean", 0), Some(1.667));
        let result = describe(&df, &types, None).unwrap();
        assert_eq!(stat(&result.numeric, "mean", 0), Some(1.67));
    }

    #[test]
    fn test_describe_grouped_null_group_last() {
        let df = df!(
            "group" => [Some("b"), None, Some("a"), Some("b")],
            "value" => [1.0f64, 5.0, 2.0, 3.0]
        )
        .unwrap();
        let types = classify(&df);
        let result = describe(&df, &types, Some("group")).unwrap();
        let groups: Vec<Option<&str>> = result
            .numeric
            .column("group")
            .unwrap()
            .str()
            .unwrap()
            .iter()
            .collect();
        assert_eq!(groups, vec![Some("a"), Some("b"), None]);
        assert_eq!(stat(&result.numeric, "mean", 1), Some(2.0));
        assert_eq!(stat(&result.numeric, "max", 2), Some(5.0));
    }

    #[test]
    fn test_describe_rejects_non_categorical_group() {
        let df = df!("group" => ["a"], "value" => [1.0f64]).unwrap();
        let types = classify(&df);
        for bad in ["value", "missing"] {
            assert!(matches!(
                describe(&df, &types, Some(bad)),
                Err(ExploreError::InvalidGroupColumn(g)) if g == bad
            ));
        }
    }

    #[test]
    fn test_describe_without_columns_of_a_kind() {
        let df = df!("value" => [1.0f64, 2.0]).unwrap();
        let types = classify(&df);
        let result = describe(&df, &types, None).unwrap();
        assert_eq!(result.categorical.height(), 0);
        let names: Vec<String> = result
            .categorical
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["field", "count", "unique", "top", "freq"]);
    }
}
