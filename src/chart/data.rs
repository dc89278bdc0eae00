//! Table to inline Vega-Lite data conversion and encoding field types.

use crate::error::Result;
use crate::filter::to_micros;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde_json::{json, Map, Value};

/// Vega-Lite measurement type of an encoded field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Quantitative,
    Temporal,
    Nominal,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quantitative => "quantitative",
            Self::Temporal => "temporal",
            Self::Nominal => "nominal",
        }
    }
}

pub fn field_type(dtype: &DataType) -> FieldType {
    if dtype.is_numeric() || matches!(dtype, DataType::Boolean) {
        FieldType::Quantitative
    } else if dtype.is_temporal() {
        FieldType::Temporal
    } else {
        FieldType::Nominal
    }
}

/// Rows of `df` as JSON objects keyed by column name. Dates and datetimes become ISO 8601
/// strings; NaN and null become JSON null.
pub fn dataframe_to_values(df: &DataFrame) -> Result<Vec<Value>> {
    let columns = df
        .get_columns()
        .iter()
        .map(|c| Ok((c.name().to_string(), column_values(c.as_materialized_series())?)))
        .collect::<Result<Vec<(String, Vec<Value>)>>>()?;

    let mut rows = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let mut row_obj = Map::new();
        for (name, values) in &columns {
            let value = values.get(row_idx).cloned().unwrap_or(Value::Null);
            row_obj.insert(name.clone(), value);
        }
        rows.push(Value::Object(row_obj));
    }
    Ok(rows)
}

fn column_values(series: &Series) -> Result<Vec<Value>> {
    let dtype = series.dtype();
    let values = match dtype {
        DataType::Boolean => series
            .bool()?
            .iter()
            .map(|v| v.map_or(Value::Null, |b| json!(b)))
            .collect(),
        DataType::Date => series
            .cast(&DataType::Int32)?
            .i32()?
            .iter()
            .map(|v| {
                v.and_then(|days| DateTime::<Utc>::from_timestamp(days as i64 * 86_400, 0))
                    .map_or(Value::Null, |dt| {
                        json!(dt.date_naive().format("%Y-%m-%d").to_string())
                    })
            })
            .collect(),
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            series
                .cast(&DataType::Int64)?
                .i64()?
                .iter()
                .map(|v| {
                    v.map(|t| to_micros(t, unit))
                    .and_then(DateTime::<Utc>::from_timestamp_micros)
                    .map_or(Value::Null, |dt| {
                        json!(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
                    })
                })
                .collect()
        }
        dt if dt.is_integer() => series
            .cast(&DataType::Int64)?
            .i64()?
            .iter()
            .map(|v| v.map_or(Value::Null, |i| json!(i)))
            .collect(),
        dt if dt.is_float() => series
            .cast(&DataType::Float64)?
            .f64()?
            .iter()
            .map(|v| v.map_or(Value::Null, |f| json!(f)))
            .collect(),
        _ => series
            .cast(&DataType::String)?
            .str()?
            .iter()
            .map(|v| v.map_or(Value::Null, |s| json!(s)))
            .collect(),
    };
    Ok(values)
}
