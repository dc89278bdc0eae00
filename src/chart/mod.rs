//! Chart specification assembly.
//!
//! Each chart kind (histogram, dot/strip, scatter) turns a table plus user options into a
//! [`ChartSpec`]: a base layer, optional aggregate overlay layers, an optional facet grid, a
//! point selection and a tooltip list. [`ChartSpec::to_vega_lite`] produces the Vega-Lite v5
//! document handed to the renderer; nothing here draws pixels.
//!
//! # Example
//!
//! ```rust,ignore
//! let types = classify(&df);
//! let options = ScatterOptions::defaults_for(&types, &config.chart)?;
//! let spec = scatter::assemble(&df, &options)?;
//! println!("{}", spec.to_vega_lite());
//! ```

pub mod data;
pub mod dot;
pub mod histogram;
pub mod scatter;
pub mod style;

use crate::error::{ExploreError, Result};
use data::{dataframe_to_values, field_type, FieldType};
use polars::prelude::DataFrame;
use serde_json::{json, Map, Value};
use style::{COLOR_SCHEME, TOOLTIP_FORMAT, VIEW_STROKE, VIEW_STROKE_WIDTH};
use tracing::debug;

pub use dot::DotOptions;
pub use histogram::HistogramOptions;
pub use scatter::ScatterOptions;
pub use style::{Average, Dispersion, MarkStyle, MarkerKind};

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Name-like categorical columns offered as default tooltips.
pub const NAME_HINTS: [&str; 5] = ["gene_name", "gene_symbol", "name", "treatment", "target_name"];

/// Name of the point-selection parameter declared on the base layer.
pub const SELECTION_NAME: &str = "select";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Histogram,
    Dot,
    Scatter,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Histogram => "histogram",
            Self::Dot => "dot",
            Self::Scatter => "scatter",
        }
    }

    fn axis_font_size(&self) -> u32 {
        match self {
            Self::Histogram => 20,
            Self::Dot | Self::Scatter => 16,
        }
    }

    fn header_font_size(&self) -> u32 {
        match self {
            Self::Histogram | Self::Scatter => 20,
            Self::Dot => 16,
        }
    }

    fn header_label_align(&self) -> &'static str {
        match self {
            Self::Histogram => "left",
            Self::Dot | Self::Scatter => "center",
        }
    }

    /// Global `config` block: axis fonts and the view outline.
    fn config(&self) -> Value {
        let mut axis = json!({
            "labelFontSize": self.axis_font_size(),
            "titleFontSize": self.axis_font_size(),
            "titleFontWeight": "bold",
        });
        if *self == Self::Dot {
            axis["labelLimit"] = json!(200);
        }
        json!({
            "axis": axis,
            "view": { "stroke": VIEW_STROKE, "strokeWidth": VIEW_STROKE_WIDTH },
        })
    }

    fn facet_header(&self) -> Value {
        json!({
            "titleFontSize": self.header_font_size(),
            "labelFontSize": self.header_font_size(),
            "labelAnchor": "middle",
            "labelColor": "#808080",
            "labelFontWeight": "normal",
            "titleFontWeight": "bold",
            "titleAnchor": "middle",
            "labelAlign": self.header_label_align(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    Base,
    Average,
    Dispersion,
    BoxPlot,
}

/// One mark with its encodings.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub role: LayerRole,
    pub mark: Value,
    pub encoding: Map<String, Value>,
}

impl Layer {
    fn to_json(&self) -> Value {
        json!({ "mark": self.mark, "encoding": self.encoding })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipField {
    pub field: String,
    pub field_type: FieldType,
    pub format: Option<String>,
    /// Max bins, when the field is shown binned.
    pub bin: Option<u32>,
}

impl TooltipField {
    pub fn plain(field: &str, field_type: FieldType) -> Self {
        Self {
            field: field.to_string(),
            field_type,
            format: None,
            bin: None,
        }
    }

    /// Quantitative fields get the two-decimal format.
    pub fn formatted(field: &str, field_type: FieldType) -> Self {
        let format = (field_type == FieldType::Quantitative).then(|| TOOLTIP_FORMAT.to_string());
        Self {
            format,
            ..Self::plain(field, field_type)
        }
    }

    fn to_json(&self) -> Value {
        let mut tip = json!({ "field": self.field, "type": self.field_type.as_str() });
        if let Some(format) = &self.format {
            tip["format"] = json!(format);
        }
        if let Some(maxbins) = self.bin {
            tip["bin"] = json!({ "maxbins": maxbins });
        }
        tip
    }
}

/// Row and/or column facet fields with the shared header style.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    pub row: Option<String>,
    pub column: Option<String>,
    pub header: Value,
}

impl Facet {
    fn to_json(&self) -> Value {
        let mut facet = Map::new();
        for (channel, field) in [("row", &self.row), ("column", &self.column)] {
            if let Some(field) = field {
                facet.insert(
                    channel.to_string(),
                    json!({ "field": field, "type": "nominal", "header": self.header }),
                );
            }
        }
        Value::Object(facet)
    }
}

/// Point selection keyed on the color/size/shape fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub fields: Vec<String>,
}

impl Selection {
    fn to_param(&self) -> Value {
        let mut select = json!({ "type": "point" });
        if !self.fields.is_empty() {
            select["fields"] = json!(self.fields);
        }
        json!({ "name": self.name, "select": select })
    }

    fn to_filter(&self) -> Value {
        json!({ "filter": { "param": self.name } })
    }
}

/// Declarative chart description, ready to serialize for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub base: Layer,
    pub overlays: Vec<Layer>,
    pub facet: Option<Facet>,
    pub selection: Selection,
    pub tooltip: Vec<TooltipField>,
    pub width: u32,
    pub height: u32,
    pub config: Value,
    pub file_name: String,
    pub data: Vec<Value>,
}

impl ChartSpec {
    pub fn tooltip_fields(&self) -> Vec<&str> {
        self.tooltip.iter().map(|t| t.field.as_str()).collect()
    }

    pub fn overlay(&self, role: LayerRole) -> Option<&Layer> {
        self.overlays.iter().find(|l| l.role == role)
    }

    pub fn to_vega_lite(&self) -> Value {
        let tooltip: Vec<Value> = self.tooltip.iter().map(TooltipField::to_json).collect();
        let mut base = self.base.to_json();
        base["encoding"]["tooltip"] = json!(tooltip);
        base["params"] = json!([self.selection.to_param()]);
        base["transform"] = json!([self.selection.to_filter()]);

        let mut view = if self.overlays.is_empty() {
            base
        } else {
            let mut layers = vec![base];
            layers.extend(self.overlays.iter().map(Layer::to_json));
            json!({ "layer": layers })
        };
        view["width"] = json!(self.width);
        view["height"] = json!(self.height);

        let mut spec = json!({
            "$schema": VEGA_LITE_SCHEMA,
            "data": { "values": self.data },
        });
        match &self.facet {
            Some(facet) => {
                spec["facet"] = facet.to_json();
                spec["spec"] = view;
            }
            None => {
                if let (Value::Object(target), Value::Object(source)) = (&mut spec, view) {
                    target.extend(source);
                }
            }
        }
        spec["config"] = self.config.clone();
        spec["usermeta"] = json!({
            "embedOptions": {
                "downloadFileName": self.file_name,
                "actions": { "export": true, "source": false, "editor": false, "compiled": false },
            }
        });
        spec
    }
}

/// Options shared by every chart kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonOptions {
    pub color_by: Option<String>,
    pub facet_row: Option<String>,
    pub facet_column: Option<String>,
    /// Extra tooltip fields, shown first.
    pub tooltips: Vec<String>,
    pub width: u32,
    pub height: u32,
    /// Plot name, used as the download file name.
    pub name: String,
}

/// Shared bookkeeping while one chart is assembled: field validation, the tooltip list and
/// the selection fields.
pub(crate) struct Assembly<'a> {
    df: &'a DataFrame,
    kind: ChartKind,
    tooltip: Vec<TooltipField>,
    selection_fields: Vec<String>,
}

impl<'a> Assembly<'a> {
    /// Starts with the caller's tooltip fields.
    pub(crate) fn new(df: &'a DataFrame, kind: ChartKind, common: &CommonOptions) -> Result<Self> {
        let mut asm = Self {
            df,
            kind,
            tooltip: Vec::new(),
            selection_fields: Vec::new(),
        };
        for name in &common.tooltips {
            let ft = asm.field_type(name)?;
            asm.push_tooltip(TooltipField::plain(name, ft));
        }
        Ok(asm)
    }

    pub(crate) fn field_type(&self, name: &str) -> Result<FieldType> {
        self.df
            .column(name)
            .map(|c| field_type(c.dtype()))
            .map_err(|_| ExploreError::UnknownField(name.to_string()))
    }

    /// `{field, type}` encoding for a column of the table.
    pub(crate) fn field(&self, name: &str) -> Result<Value> {
        let ft = self.field_type(name)?;
        Ok(json!({ "field": name, "type": ft.as_str() }))
    }

    /// Tooltip entries are unique by field; the first one wins.
    pub(crate) fn push_tooltip(&mut self, tip: TooltipField) {
        if !self.tooltip.iter().any(|t| t.field == tip.field) {
            self.tooltip.push(tip);
        }
    }

    pub(crate) fn push_formatted_tooltip(&mut self, name: &str) -> Result<()> {
        let ft = self.field_type(name)?;
        self.push_tooltip(TooltipField::formatted(name, ft));
        Ok(())
    }

    /// Bind `name` to a color, size or shape channel; the field joins the tooltip and the
    /// selection.
    pub(crate) fn bind(
        &mut self,
        encoding: &mut Map<String, Value>,
        channel: &str,
        name: &str,
    ) -> Result<()> {
        let mut def = self.field(name)?;
        if channel == "color" {
            def["scale"] = json!({ "scheme": COLOR_SCHEME });
        }
        encoding.insert(channel.to_string(), def);
        let ft = self.field_type(name)?;
        self.push_tooltip(TooltipField::plain(name, ft));
        if !self.selection_fields.iter().any(|f| f == name) {
            self.selection_fields.push(name.to_string());
        }
        Ok(())
    }

    pub(crate) fn bind_color(
        &mut self,
        encoding: &mut Map<String, Value>,
        common: &CommonOptions,
    ) -> Result<()> {
        match &common.color_by {
            Some(name) => self.bind(encoding, "color", name),
            None => Ok(()),
        }
    }

    /// Validate the facet fields and add them to the tooltip.
    pub(crate) fn facet(&mut self, common: &CommonOptions) -> Result<Option<Facet>> {
        if common.facet_row.is_none() && common.facet_column.is_none() {
            return Ok(None);
        }
        for name in [&common.facet_row, &common.facet_column].into_iter().flatten() {
            let ft = self.field_type(name)?;
            self.push_tooltip(TooltipField::plain(name, ft));
        }
        Ok(Some(Facet {
            row: common.facet_row.clone(),
            column: common.facet_column.clone(),
            header: self.kind.facet_header(),
        }))
    }

    pub(crate) fn finish(
        self,
        common: &CommonOptions,
        base: Layer,
        overlays: Vec<Layer>,
        facet: Option<Facet>,
    ) -> Result<ChartSpec> {
        let data = dataframe_to_values(self.df)?;
        debug!(
            kind = self.kind.as_str(),
            rows = data.len(),
            overlays = overlays.len(),
            faceted = facet.is_some(),
            "assembled chart"
        );
        Ok(ChartSpec {
            kind: self.kind,
            base,
            overlays,
            facet,
            selection: Selection {
                name: SELECTION_NAME.to_string(),
                fields: self.selection_fields,
            },
            tooltip: self.tooltip,
            width: common.width,
            height: common.height,
            config: self.kind.config(),
            file_name: common.name.clone(),
            data,
        })
    }
}

/// Tooltip defaults: every categorical column matching a name hint, in hint order.
pub fn default_tooltips(categorical: &[String]) -> Vec<String> {
    crate::picker::pick(categorical, &NAME_HINTS, 0)
        .map(|p| p.matched)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn sample_spec(facet: Option<Facet>, overlays: Vec<Layer>) -> ChartSpec {
        let mut encoding = Map::new();
        encoding.insert("x".into(), json!({"field": "value", "type": "quantitative"}));
        ChartSpec {
            kind: ChartKind::Scatter,
            base: Layer {
                role: LayerRole::Base,
                mark: json!({"type": "point"}),
                encoding,
            },
            overlays,
            facet,
            selection: Selection {
                name: SELECTION_NAME.into(),
                fields: vec![],
            },
            tooltip: vec![TooltipField::formatted("value", FieldType::Quantitative)],
            width: 400,
            height: 300,
            config: ChartKind::Scatter.config(),
            file_name: "xy_plot".into(),
            data: vec![json!({"value": 1.0})],
        }
    }

    #[test]
    fn test_single_view_document() {
        let vl = sample_spec(None, vec![]).to_vega_lite();
        assert_eq!(vl["$schema"], VEGA_LITE_SCHEMA);
        assert_eq!(vl["mark"]["type"], "point");
        assert_eq!(vl["width"], 400);
        assert_eq!(
            vl["encoding"]["tooltip"],
            json!([{"field": "value", "type": "quantitative", "format": "0.2f"}])
        );
        assert_eq!(vl["params"][0]["select"], json!({"type": "point"}));
        assert_eq!(vl["transform"][0]["filter"]["param"], SELECTION_NAME);
        assert_eq!(vl["usermeta"]["embedOptions"]["downloadFileName"], "xy_plot");
        assert_eq!(vl["usermeta"]["embedOptions"]["actions"]["source"], false);
        assert_eq!(vl["config"]["view"]["stroke"], "#808080");
    }

    #[test]
    fn test_faceted_layered_document() {
        let facet = Facet {
            row: None,
            column: Some("group".into()),
            header: ChartKind::Dot.facet_header(),
        };
        let overlay = Layer {
            role: LayerRole::Average,
            mark: style::average_mark("#d95f02"),
            encoding: Map::new(),
        };
        let vl = sample_spec(Some(facet), vec![overlay]).to_vega_lite();
        assert!(vl.get("mark").is_none());
        assert_eq!(vl["facet"]["column"]["field"], "group");
        assert_eq!(vl["facet"]["column"]["header"]["labelFontSize"], 16);
        assert!(vl["facet"].get("row").is_none());
        assert_eq!(vl["spec"]["layer"].as_array().map(Vec::len), Some(2));
        assert_eq!(vl["spec"]["height"], 300);
        assert!(vl["spec"]["layer"][1]["encoding"].get("tooltip").is_none());
    }

    #[test]
    fn test_kind_styles() {
        assert_eq!(ChartKind::Histogram.config()["axis"]["labelFontSize"], 20);
        assert_eq!(ChartKind::Dot.config()["axis"]["labelLimit"], 200);
        assert!(ChartKind::Scatter.config()["axis"].get("labelLimit").is_none());
        assert_eq!(ChartKind::Histogram.facet_header()["labelAlign"], "left");
    }

    #[test]
    fn test_assembly_tooltips_are_unique() {
        let df = df!("group" => ["a"], "value" => [1.0f64]).unwrap();
        let common = CommonOptions {
            tooltips: vec!["group".into()],
            color_by: Some("group".into()),
            ..Default::default()
        };
        let mut asm = Assembly::new(&df, ChartKind::Scatter, &common).unwrap();
        let mut encoding = Map::new();
        asm.bind_color(&mut encoding, &common).unwrap();
        asm.push_formatted_tooltip("value").unwrap();
        asm.push_formatted_tooltip("group").unwrap();
        let fields: Vec<&str> = asm.tooltip.iter().map(|t| t.field.as_str()).collect();
        assert_eq!(fields, vec!["group", "value"]);
        assert_eq!(asm.selection_fields, vec!["group"]);
        assert_eq!(encoding["color"]["scale"]["scheme"], "tableau10");
    }

    #[test]
    fn test_unknown_tooltip_field() {
        let df = df!("value" => [1.0f64]).unwrap();
        let common = CommonOptions {
            tooltips: vec!["gene_name".into()],
            ..Default::default()
        };
        assert!(matches!(
            Assembly::new(&df, ChartKind::Histogram, &common),
            Err(ExploreError::UnknownField(f)) if f == "gene_name"
        ));
    }

    #[test]
    fn test_default_tooltips() {
        let categorical = vec!["target_name".to_string(), "gene_name".to_string()];
        assert_eq!(default_tooltips(&categorical), vec!["gene_name", "target_name"]);
        assert!(default_tooltips(&[]).is_empty());
    }
}
