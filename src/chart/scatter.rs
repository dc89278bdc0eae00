use super::style::{average_mark, dispersion_mark};
use super::{
    default_tooltips, Assembly, Average, ChartKind, ChartSpec, CommonOptions, Dispersion, Layer,
    LayerRole, MarkStyle, MarkerKind,
};
use crate::columns::ColumnTypeMap;
use crate::config::ChartConfig;
use crate::error::Result;
use crate::picker::pick;
use crate::scale::ScaleKind;
use polars::prelude::DataFrame;
use serde_json::{json, Map, Value};

pub const X_HINTS: [&str; 3] = ["x", "treatment", "group"];
pub const Y_HINTS: [&str; 2] = ["y", "ss_ngene"];

/// Tick count and d3 format for both scatter axes.
const AXIS_TICK_COUNT: u32 = 9;
const AXIS_FORMAT: &str = "2.4g";

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterOptions {
    pub x: String,
    pub y: String,
    pub x_scale: ScaleKind,
    pub y_scale: ScaleKind,
    pub size_by: Option<String>,
    pub shape_by: Option<String>,
    pub style: MarkStyle,
    pub aggregate_color: String,
    /// Average of x and y drawn as one point (per color group).
    pub average: Option<Average>,
    /// Error bars over y, placed at the average x.
    pub dispersion: Option<Dispersion>,
    pub common: CommonOptions,
}

impl ScatterOptions {
    /// x defaults to the first numeric column and y to the second unless a hint matches.
    pub fn defaults_for(types: &ColumnTypeMap, config: &ChartConfig) -> Result<Self> {
        let x = pick(&types.numeric, &X_HINTS, 0)?;
        let y = pick(&types.numeric, &Y_HINTS, 1)?;
        let style = &config.scatter;
        Ok(Self {
            x: types.numeric[x.index].clone(),
            y: types.numeric[y.index].clone(),
            x_scale: ScaleKind::Linear,
            y_scale: ScaleKind::Linear,
            size_by: None,
            shape_by: None,
            style: MarkStyle {
                marker: MarkerKind::Point,
                opacity: style.opacity,
                size: style.size,
                stroke_width: style.stroke_width,
                filled: style.filled,
                color: style.color.clone(),
            },
            aggregate_color: config.aggregate_color.clone(),
            average: None,
            dispersion: None,
            common: CommonOptions {
                tooltips: default_tooltips(&types.categorical),
                width: style.width,
                height: style.height,
                name: style.plot_name.clone(),
                ..Default::default()
            },
        })
    }
}

pub fn assemble(df: &DataFrame, options: &ScatterOptions) -> Result<ChartSpec> {
    let common = &options.common;
    let mut asm = Assembly::new(df, ChartKind::Scatter, common)?;

    let axis = json!({ "tickCount": AXIS_TICK_COUNT, "format": AXIS_FORMAT });
    let positional = |asm: &Assembly, name: &str, scale: ScaleKind| -> Result<Value> {
        let mut def = asm.field(name)?;
        def["scale"] = scale.spec().to_json();
        def["axis"] = axis.clone();
        Ok(def)
    };
    let x = positional(&asm, &options.x, options.x_scale)?;
    let y = positional(&asm, &options.y, options.y_scale)?;

    let mut encoding = Map::new();
    encoding.insert("x".to_string(), x.clone());
    encoding.insert("y".to_string(), y.clone());
    asm.bind_color(&mut encoding, common)?;
    if let Some(size) = &options.size_by {
        asm.bind(&mut encoding, "size", size)?;
    }
    if let Some(shape) = &options.shape_by {
        asm.bind(&mut encoding, "shape", shape)?;
    }
    let facet = asm.facet(common)?;
    asm.push_formatted_tooltip(&options.x)?;
    asm.push_formatted_tooltip(&options.y)?;

    let color = encoding.get("color").cloned();
    let aggregated = |def: &Value, average: Average| {
        let mut def = def.clone();
        def["aggregate"] = json!(average.as_str());
        def["title"] = json!("");
        def
    };
    let overlay_encoding = |x: Value, y: Value| {
        let mut enc = Map::new();
        enc.insert("x".to_string(), x);
        enc.insert("y".to_string(), y);
        if let Some(color) = &color {
            enc.insert("color".to_string(), color.clone());
        }
        enc
    };

    let mut overlays = Vec::new();
    if let Some(average) = options.average {
        overlays.push(Layer {
            role: LayerRole::Average,
            mark: average_mark(&options.aggregate_color),
            encoding: overlay_encoding(aggregated(&x, average), aggregated(&y, average)),
        });
    }
    if let Some(extent) = options.dispersion {
        let at = options.average.unwrap_or(Average::Mean);
        overlays.push(Layer {
            role: LayerRole::Dispersion,
            mark: dispersion_mark(extent, &options.aggregate_color),
            encoding: overlay_encoding(aggregated(&x, at), y.clone()),
        });
    }

    let base = Layer {
        role: LayerRole::Base,
        mark: options.style.to_mark(),
        encoding,
    };
    asm.finish(common, base, overlays, facet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::classify;
    use polars::prelude::*;

    fn sample() -> DataFrame {
        df!(
            "gene_name" => ["g1", "g2", "g3"],
            "group" => ["a", "a", "b"],
            "value" => [1.0f64, 3.0, 2.0],
            "score" => [0.1f64, 0.4, 0.9]
        )
        .unwrap()
    }

    fn options(df: &DataFrame) -> ScatterOptions {
        ScatterOptions::defaults_for(&classify(df), &ChartConfig::default()).unwrap()
    }

    #[test]
    fn test_defaults_fall_back_to_first_two_numeric() {
        let df = sample();
        let o = options(&df);
        assert_eq!(o.x, "value");
        assert_eq!(o.y, "score");
        assert_eq!(o.common.tooltips, vec!["gene_name"]);
        assert!(o.style.filled);
        assert_eq!(o.style.size, 30.0);
        assert_eq!(o.common.width, 400);
    }

    #[test]
    fn test_single_numeric_column_reuses_it() {
        let df = df!("value" => [1.0f64]).unwrap();
        let o = options(&df);
        assert_eq!(o.x, "value");
        assert_eq!(o.y, "value");
    }

    #[test]
    fn test_axes() {
        let df = sample();
        let mut o = options(&df);
        o.y_scale = ScaleKind::Log10;
        let spec = assemble(&df, &o).unwrap();
        assert_eq!(spec.base.encoding["x"]["axis"]["tickCount"], 9);
        assert_eq!(spec.base.encoding["y"]["axis"]["format"], "2.4g");
        assert_eq!(spec.base.encoding["y"]["scale"]["type"], "log");
        assert_eq!(spec.base.encoding["x"]["scale"]["zero"], false);
        assert_eq!(spec.tooltip_fields(), vec!["gene_name", "value", "score"]);
    }

    #[test]
    fn test_size_and_shape_join_selection() {
        let df = sample();
        let mut o = options(&df);
        o.common.color_by = Some("group".into());
        o.size_by = Some("score".into());
        o.shape_by = Some("group".into());
        let spec = assemble(&df, &o).unwrap();
        assert_eq!(spec.selection.fields, vec!["group", "score"]);
        assert_eq!(spec.base.encoding["size"]["field"], "score");
        assert_eq!(spec.base.encoding["shape"]["type"], "nominal");
        assert_eq!(
            spec.tooltip_fields(),
            vec!["gene_name", "group", "score", "value"]
        );
        let vl = spec.to_vega_lite();
        assert_eq!(vl["params"][0]["select"]["fields"], json!(["group", "score"]));
    }

    #[test]
    fn test_average_and_dispersion() {
        let df = sample();
        let mut o = options(&df);
        o.common.color_by = Some("group".into());
        o.average = Some(Average::Median);
        o.dispersion = Some(Dispersion::Stderr);
        let spec = assemble(&df, &o).unwrap();
        assert_eq!(spec.overlays.len(), 2);

        let avg = spec.overlay(LayerRole::Average).unwrap();
        assert_eq!(avg.encoding["x"]["aggregate"], "median");
        assert_eq!(avg.encoding["y"]["aggregate"], "median");
        assert_eq!(avg.encoding["color"]["field"], "group");

        let bars = spec.overlay(LayerRole::Dispersion).unwrap();
        assert_eq!(bars.encoding["x"]["aggregate"], "median");
        assert!(bars.encoding["y"].get("aggregate").is_none());
        assert_eq!(bars.mark["thickness"], 4);
    }
}
