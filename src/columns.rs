//! Column classification: which columns are numeric and which are categorical.

use polars::prelude::*;

/// Read-only view of a table's columns split by kind.
///
/// Every name in `all_columns` is in exactly one of `numeric` / `categorical`, and each
/// subsequence keeps the table's column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTypeMap {
    pub all_columns: Vec<String>,
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl ColumnTypeMap {
    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric.iter().any(|c| c == name)
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical.iter().any(|c| c == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all_columns.iter().any(|c| c == name)
    }
}

/// Textual columns are categorical; every other dtype (including booleans and temporals)
/// counts as numeric.
pub fn is_categorical_type(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(..))
}

/// Partition the columns of `df` into numeric and categorical names.
pub fn classify(df: &DataFrame) -> ColumnTypeMap {
    let mut types = ColumnTypeMap::default();
    for column in df.get_columns() {
        let name = column.name().to_string();
        if is_categorical_type(column.dtype()) {
            types.categorical.push(name.clone());
        } else {
            types.numeric.push(name.clone());
        }
        types.all_columns.push(name);
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_classify_mixed_columns() {
        let df = df!(
            "group" => ["a", "a", "b"],
            "value" => [1i64, 3, 2],
            "score" => [0.5f64, 1.5, 2.5],
            "label" => ["x", "y", "z"],
            "flag" => [true, false, true]
        )
        .unwrap();

        let types = classify(&df);
        assert_eq!(
            types.all_columns,
            vec!["group", "value", "score", "label", "flag"]
        );
        assert_eq!(types.numeric, vec!["value", "score", "flag"]);
        assert_eq!(types.categorical, vec!["group", "label"]);
        assert!(types.is_numeric("score"));
        assert!(types.is_categorical("label"));
        assert!(!types.contains("missing"));
    }

    #[test]
    fn test_classify_empty_table() {
        let types = classify(&DataFrame::empty());
        assert!(types.all_columns.is_empty());
        assert!(types.numeric.is_empty());
        assert!(types.categorical.is_empty());
    }

    proptest! {
        #[test]
        fn prop_classify_partitions_columns(kinds in proptest::collection::vec(any::<bool>(), 0..12)) {
            let columns: Vec<Column> = kinds
                .iter()
                .enumerate()
                .map(|(i, is_text)| {
                    let name = format!("c{}", i);
                    if *is_text {
                        Series::new(name.into(), ["u", "v"]).into()
                    } else {
                        Series::new(name.into(), [1.0f64, 2.0]).into()
                    }
                })
                .collect();
            let df = DataFrame::new(columns).unwrap();
            let types = classify(&df);

            prop_assert_eq!(types.numeric.len() + types.categorical.len(), types.all_columns.len());
            for name in &types.all_columns {
                prop_assert!(types.is_numeric(name) != types.is_categorical(name));
            }
            let numeric_in_order: Vec<String> = types
                .all_columns
                .iter()
                .filter(|c| types.is_numeric(c))
                .cloned()
                .collect();
            prop_assert_eq!(&numeric_in_order, &types.numeric);
            let categorical_in_order: Vec<String> = types
                .all_columns
                .iter()
                .filter(|c| types.is_categorical(c))
                .cloned()
                .collect();
            prop_assert_eq!(&categorical_in_order, &types.categorical);
        }
    }
}
