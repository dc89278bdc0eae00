use color_eyre::Result;
use gridsurf::columns::classify;
use gridsurf::error::ExploreError;
use gridsurf::statistics::{describe, describe_with_precision};
use polars::prelude::*;

mod common;

fn f64_at(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
    df.column(column)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .get(row)
}

fn u64_at(df: &DataFrame, column: &str, row: usize) -> Option<u64> {
    df.column(column)
        .unwrap()
        .as_materialized_series()
        .u64()
        .unwrap()
        .get(row)
}

fn str_at(df: &DataFrame, column: &str, row: usize) -> Option<String> {
    df.column(column)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .get(row)
        .map(str::to_string)
}

#[test]
fn test_classify_then_grouped_describe() -> Result<()> {
    let df = common::group_value_frame();
    let types = classify(&df);
    assert_eq!(types.numeric, vec!["value"]);
    assert_eq!(types.categorical, vec!["group"]);

    let result = describe(&df, &types, Some("group"))?;
    let numeric = &result.numeric;
    assert_eq!(numeric.height(), 2);

    assert_eq!(str_at(numeric, "group", 0).as_deref(), Some("a"));
    assert_eq!(u64_at(numeric, "count", 0), Some(2));
    assert_eq!(f64_at(numeric, "mean", 0), Some(2.0));
    assert_eq!(f64_at(numeric, "min", 0), Some(1.0));
    assert_eq!(f64_at(numeric, "max", 0), Some(3.0));

    assert_eq!(str_at(numeric, "group", 1).as_deref(), Some("b"));
    assert_eq!(u64_at(numeric, "count", 1), Some(1));
    assert_eq!(f64_at(numeric, "mean", 1), Some(2.0));
    assert_eq!(f64_at(numeric, "min", 1), Some(2.0));
    assert_eq!(f64_at(numeric, "max", 1), Some(2.0));
    // A single observation has no sample deviation
    assert_eq!(f64_at(numeric, "std", 1), None);
    Ok(())
}

#[test]
fn test_describe_is_repeatable() -> Result<()> {
    let df = common::genes_frame();
    let types = classify(&df);
    let first = describe(&df, &types, Some("group"))?;
    let second = describe(&df, &types, Some("group"))?;
    assert!(first.numeric.equals_missing(&second.numeric));
    assert!(first.categorical.equals_missing(&second.categorical));
    Ok(())
}

#[test]
fn test_grouped_rows_sorted_by_field_then_group() -> Result<()> {
    let df = common::genes_frame();
    let types = classify(&df);
    let numeric = describe(&df, &types, Some("group"))?.numeric;
    let fields: Vec<String> = (0..numeric.height())
        .map(|i| str_at(&numeric, "field", i).unwrap_or_default())
        .collect();
    assert_eq!(
        fields,
        vec!["cc_q75", "cc_q75", "logFC", "logFC", "padj", "padj"]
    );
    assert_eq!(str_at(&numeric, "group", 1).as_deref(), Some("treated"));
    Ok(())
}

#[test]
fn test_precision() -> Result<()> {
    let df = df!("x" => [1.0f64, 2.0, 2.0])?;
    let types = classify(&df);
    let coarse = describe_with_precision(&df, &types, None, 0)?.numeric;
    assert_eq!(f64_at(&coarse, "mean", 0), Some(2.0));
    let fine = describe_with_precision(&df, &types, None, 3)?.numeric;
    assert_eq!(f64_at(&fine, "mean", 0), Some(1.667));
    Ok(())
}

#[test]
fn test_categorical_summary() -> Result<()> {
    let df = common::genes_frame();
    let types = classify(&df);
    let categorical = describe(&df, &types, None)?.categorical;
    assert_eq!(categorical.height(), 2);
    assert_eq!(str_at(&categorical, "field", 1).as_deref(), Some("group"));
    assert_eq!(u64_at(&categorical, "unique", 1), Some(2));
    // Tie between ctrl and treated goes to the first seen
    assert_eq!(str_at(&categorical, "top", 1).as_deref(), Some("ctrl"));
    assert_eq!(u64_at(&categorical, "freq", 1), Some(3));
    Ok(())
}

#[test]
fn test_group_by_must_be_categorical() {
    let df = common::group_value_frame();
    let types = classify(&df);
    assert!(matches!(
        describe(&df, &types, Some("value")),
        Err(ExploreError::InvalidGroupColumn(c)) if c == "value"
    ));
    assert!(matches!(
        describe(&df, &types, Some("missing")),
        Err(ExploreError::InvalidGroupColumn(_))
    ));
}

#[test]
fn test_no_numeric_columns_gives_empty_frame() -> Result<()> {
    let df = df!("name" => ["a", "b"])?;
    let types = classify(&df);
    let result = describe(&df, &types, None)?;
    assert_eq!(result.numeric.height(), 0);
    assert_eq!(result.numeric.width(), 9);
    assert_eq!(result.categorical.height(), 1);
    Ok(())
}
