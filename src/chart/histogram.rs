use super::{Assembly, ChartKind, ChartSpec, CommonOptions, Layer, LayerRole, TooltipField};
use crate::columns::ColumnTypeMap;
use crate::config::ChartConfig;
use crate::error::Result;
use crate::picker::pick;
use crate::scale::ScaleKind;
use polars::prelude::DataFrame;
use serde_json::{json, Map};

/// Preferred x columns, in priority order.
pub const X_HINTS: [&str; 2] = ["x", "cc_q75"];

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramOptions {
    pub x: String,
    /// Maximum number of bins along x.
    pub bins: u32,
    pub y_scale: ScaleKind,
    pub color: String,
    pub common: CommonOptions,
}

impl HistogramOptions {
    /// Seed options for a table: x from the numeric columns by hint, the rest from config.
    pub fn defaults_for(types: &ColumnTypeMap, config: &ChartConfig) -> Result<Self> {
        let x = pick(&types.numeric, &X_HINTS, 0)?;
        let style = &config.histogram;
        Ok(Self {
            x: types.numeric[x.index].clone(),
            bins: style.bins,
            y_scale: ScaleKind::Linear,
            color: style.color.clone(),
            common: CommonOptions {
                width: style.width,
                height: style.height,
                name: style.plot_name.clone(),
                ..Default::default()
            },
        })
    }
}

/// Binned count of `x`, optionally colored and faceted.
pub fn assemble(df: &DataFrame, options: &HistogramOptions) -> Result<ChartSpec> {
    let common = &options.common;
    let mut asm = Assembly::new(df, ChartKind::Histogram, common)?;

    let mut x = asm.field(&options.x)?;
    x["bin"] = json!({ "maxbins": options.bins });

    let mut encoding = Map::new();
    encoding.insert("x".to_string(), x);
    encoding.insert(
        "y".to_string(),
        json!({
            "aggregate": "count",
            "type": "quantitative",
            "scale": options.y_scale.spec().to_json(),
        }),
    );
    asm.bind_color(&mut encoding, common)?;
    let facet = asm.facet(common)?;

    let x_type = asm.field_type(&options.x)?;
    asm.push_tooltip(TooltipField {
        bin: Some(options.bins),
        ..TooltipField::plain(&options.x, x_type)
    });

    let base = Layer {
        role: LayerRole::Base,
        mark: json!({ "type": "bar", "color": options.color }),
        encoding,
    };
    asm.finish(common, base, Vec::new(), facet)
}
