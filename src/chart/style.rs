//! Mark styling and aggregate overlay choices.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Vega-Lite color scheme for categorical color encodings.
pub const COLOR_SCHEME: &str = "tableau10";
pub const VIEW_STROKE: &str = "#808080";
pub const VIEW_STROKE_WIDTH: f64 = 1.5;
/// d3 format applied to quantitative tooltip values.
pub const TOOLTIP_FORMAT: &str = "0.2f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    #[default]
    Point,
    Tick,
}

impl MarkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Tick => "tick",
        }
    }
}

/// Aggregate drawn by the average overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Average {
    #[default]
    Median,
    Mean,
}

impl Average {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Median => "median",
            Self::Mean => "mean",
        }
    }
}

/// Extent of the dispersion error bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dispersion {
    Iqr,
    Stdev,
    Stderr,
    Ci,
}

impl Dispersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iqr => "iqr",
            Self::Stdev => "stdev",
            Self::Stderr => "stderr",
            Self::Ci => "ci",
        }
    }
}

impl fmt::Display for Dispersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual properties of the base mark.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkStyle {
    pub marker: MarkerKind,
    pub opacity: f64,
    pub size: f64,
    pub stroke_width: f64,
    pub filled: bool,
    pub color: String,
}

impl MarkStyle {
    /// Mark definition for point-like marks (dot and scatter plots).
    pub fn to_mark(&self) -> Value {
        json!({
            "type": self.marker.as_str(),
            "opacity": self.opacity,
            "size": self.size,
            "strokeWidth": self.stroke_width,
            "filled": self.filled,
            "color": self.color,
        })
    }
}

pub(crate) fn average_mark(color: &str) -> Value {
    json!({
        "type": "point",
        "filled": true,
        "strokeWidth": 2,
        "size": 150,
        "opacity": 0.8,
        "color": color,
    })
}

pub(crate) fn dispersion_mark(extent: Dispersion, color: &str) -> Value {
    json!({
        "type": "errorbar",
        "extent": extent.as_str(),
        "thickness": 4,
        "opacity": 0.8,
        "color": color,
    })
}

pub(crate) fn boxplot_mark(color: &str) -> Value {
    json!({
        "type": "boxplot",
        "extent": 1.5,
        "outliers": { "size": 0 },
        "ticks": false,
        "opacity": 0.8,
        "color": color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_style_json() {
        let style = MarkStyle {
            marker: MarkerKind::Tick,
            opacity: 0.8,
            size: 15.0,
            stroke_width: 1.0,
            filled: false,
            color: "#7570b2".into(),
        };
        let mark = style.to_mark();
        assert_eq!(mark["type"], "tick");
        assert_eq!(mark["filled"], false);
        assert_eq!(mark["size"], 15.0);
    }

    #[test]
    fn test_overlay_marks() {
        assert_eq!(average_mark("#d95f02")["size"], 150);
        assert_eq!(dispersion_mark(Dispersion::Ci, "#d95f02")["extent"], "ci");
        let boxplot = boxplot_mark("#d95f02");
        assert_eq!(boxplot["outliers"]["size"], 0);
        assert_eq!(boxplot["ticks"], false);
    }
}
