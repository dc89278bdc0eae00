//! Negative-log transform for p-value style columns.

use crate::error::{ExploreError, Result};
use polars::prelude::*;
use tracing::debug;

/// Fraction of the smallest positive value used as the lower clip bound.
const FLOOR_FRACTION: f64 = 0.01;

/// `-log_base(clip(v, floor, 1))` for each value, with `floor` set to one hundredth of the
/// smallest strictly positive input. NaN inputs stay NaN.
pub fn neg_log(values: &[f64], base: f64) -> Result<Vec<f64>> {
    let min_positive = values
        .iter()
        .copied()
        .filter(|v| *v > 0.0)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.min(v))))
        .ok_or(ExploreError::EmptyPositiveDomain)?;
    let floor = FLOOR_FRACTION * min_positive;
    let ln_base = base.ln();

    Ok(values
        .iter()
        .map(|v| {
            if v.is_nan() {
                f64::NAN
            } else {
                let clipped = v.clamp(floor, 1.0);
                // -0.0 for inputs at or above one
                -(clipped.ln() / ln_base) + 0.0
            }
        })
        .collect())
}

/// Append `-log_base(column)` as a new Float64 column named `out_name`. Nulls are treated as
/// NaN and come out as NaN.
pub fn with_neg_log_column(
    df: &DataFrame,
    column: &str,
    base: f64,
    out_name: &str,
) -> Result<DataFrame> {
    let source = df
        .column(column)
        .map_err(|_| ExploreError::UnknownField(column.to_string()))?;
    let as_float = source.cast(&DataType::Float64)?;
    let values: Vec<f64> = as_float
        .f64()?
        .iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();

    let transformed = neg_log(&values, base)?;
    debug!(column, out_name, base, rows = transformed.len(), "neg-log column");

    let mut out = df.clone();
    out.with_column(Series::new(out_name.into(), transformed))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-2, "{} != {}", a, e);
        }
    }

    #[test]
    fn test_neg_log_powers_of_ten() {
        let out = neg_log(&[1.0, 0.1, 0.01], 10.0).unwrap();
        assert_close(&out, &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_neg_log_zero_is_floored() {
        let out = neg_log(&[0.0, 0.5], 10.0).unwrap();
        assert_close(&out, &[2.30, 0.30]);
    }

    #[test]
    fn test_neg_log_values_above_one_clip_to_zero() {
        let out = neg_log(&[3.0, 0.5], 2.0).unwrap();
        assert_close(&out, &[0.0, 1.0]);
    }

    #[test]
    fn test_neg_log_without_positive_values() {
        assert!(matches!(
            neg_log(&[0.0, 0.0], 10.0),
            Err(ExploreError::EmptyPositiveDomain)
        ));
        assert!(matches!(
            neg_log(&[], 10.0),
            Err(ExploreError::EmptyPositiveDomain)
        ));
    }

    #[test]
    fn test_neg_log_keeps_nan() {
        let out = neg_log(&[f64::NAN, 0.01], 10.0).unwrap();
        assert!(out[0].is_nan());
        assert_close(&out[1..], &[2.0]);
    }

    #[test]
    fn test_with_neg_log_column() {
        let df = df!(
            "gene" => ["a", "b", "c"],
            "padj" => [Some(0.1f64), None, Some(1.0)]
        )
        .unwrap();
        let out = with_neg_log_column(&df, "padj", 10.0, "nlogp").unwrap();
        assert_eq!(out.width(), 3);
        let values: Vec<Option<f64>> = out.column("nlogp").unwrap().f64().unwrap().iter().collect();
        assert!((values[0].unwrap() - 1.0).abs() < 1e-9);
        assert!(values[1].map_or(true, f64::is_nan));
        assert_eq!(values[2], Some(0.0));
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_with_neg_log_unknown_column() {
        let df = df!("padj" => [0.1f64]).unwrap();
        assert!(matches!(
            with_neg_log_column(&df, "pval", 10.0, "nlogp"),
            Err(ExploreError::UnknownField(c)) if c == "pval"
        ));
    }
}
