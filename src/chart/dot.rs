use super::style::{average_mark, boxplot_mark, dispersion_mark};
use super::{
    default_tooltips, Assembly, Average, ChartKind, ChartSpec, CommonOptions, Dispersion, Layer,
    LayerRole, MarkStyle,
};
use crate::columns::ColumnTypeMap;
use crate::config::ChartConfig;
use crate::error::Result;
use crate::picker::pick;
use crate::scale::ScaleKind;
use polars::prelude::DataFrame;
use serde_json::{json, Map, Value};

pub const X_HINTS: [&str; 2] = ["x", "cc_q75"];
/// Preferred categorical y columns.
pub const Y_HINTS: [&str; 2] = ["y", "ss_ngene"];

/// Strip plot of a numeric x against a categorical y.
#[derive(Debug, Clone, PartialEq)]
pub struct DotOptions {
    pub x: String,
    pub y: String,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub x_scale: ScaleKind,
    pub style: MarkStyle,
    pub aggregate_color: String,
    pub average: Option<Average>,
    pub dispersion: Option<Dispersion>,
    pub box_plot: bool,
    pub common: CommonOptions,
}

impl DotOptions {
    pub fn defaults_for(types: &ColumnTypeMap, config: &ChartConfig) -> Result<Self> {
        let x = pick(&types.numeric, &X_HINTS, 0)?;
        let y = pick(&types.categorical, &Y_HINTS, 0)?;
        let style = &config.dot;
        Ok(Self {
            x: types.numeric[x.index].clone(),
            y: types.categorical[y.index].clone(),
            x_title: None,
            y_title: None,
            x_scale: ScaleKind::Linear,
            style: MarkStyle {
                marker: style.marker,
                opacity: style.opacity,
                size: style.size,
                stroke_width: style.stroke_width,
                filled: style.filled,
                color: style.color.clone(),
            },
            aggregate_color: config.aggregate_color.clone(),
            average: None,
            dispersion: None,
            box_plot: false,
            common: CommonOptions {
                tooltips: default_tooltips(&types.categorical)
                    .into_iter()
                    .take(1)
                    .collect(),
                width: style.width,
                height: style.height,
                name: style.plot_name.clone(),
                ..Default::default()
            },
        })
    }
}

pub fn assemble(df: &DataFrame, options: &DotOptions) -> Result<ChartSpec> {
    let common = &options.common;
    let mut asm = Assembly::new(df, ChartKind::Dot, common)?;

    let x_scale = options.x_scale.spec().to_json();
    let mut x = asm.field(&options.x)?;
    x["scale"] = x_scale.clone();
    x["title"] = json!(options.x_title.as_deref().unwrap_or(&options.x));
    let mut y = asm.field(&options.y)?;
    y["title"] = json!(options.y_title.as_deref().unwrap_or(&options.y));

    let mut encoding = Map::new();
    encoding.insert("x".to_string(), x.clone());
    encoding.insert("y".to_string(), y.clone());
    asm.bind_color(&mut encoding, common)?;
    let facet = asm.facet(common)?;
    asm.push_formatted_tooltip(&options.x)?;
    asm.push_formatted_tooltip(&options.y)?;

    let color = encoding.get("color").cloned();
    let overlay_encoding = |x: Value| {
        let mut enc = Map::new();
        enc.insert("x".to_string(), x);
        enc.insert("y".to_string(), y.clone());
        if let Some(color) = &color {
            enc.insert("color".to_string(), color.clone());
        }
        enc
    };

    let mut overlays = Vec::new();
    if let Some(extent) = options.dispersion {
        overlays.push(Layer {
            role: LayerRole::Dispersion,
            mark: dispersion_mark(extent, &options.aggregate_color),
            encoding: overlay_encoding(x.clone()),
        });
    }
    if let Some(average) = options.average {
        let mut avg_x = json!({
            "field": options.x,
            "type": "quantitative",
            "aggregate": average.as_str(),
            "title": "",
        });
        avg_x["scale"] = x_scale.clone();
        overlays.push(Layer {
            role: LayerRole::Average,
            mark: average_mark(&options.aggregate_color),
            encoding: overlay_encoding(avg_x),
        });
    }
    if options.box_plot {
        let mut enc = overlay_encoding(x.clone());
        enc.remove("color");
        overlays.push(Layer {
            role: LayerRole::BoxPlot,
            mark: boxplot_mark(&options.aggregate_color),
            encoding: enc,
        });
    }

    let base = Layer {
        role: LayerRole::Base,
        mark: options.style.to_mark(),
        encoding,
    };
    asm.finish(common, base, overlays, facet)
}
