//! Axis scale kinds and the scale parameters handed to the chart renderer.

use crate::error::{ExploreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    #[default]
    Linear,
    Log2,
    Log10,
}

impl ScaleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Log2 => "log2",
            Self::Log10 => "log10",
        }
    }

    pub fn spec(&self) -> ScaleSpec {
        match self {
            Self::Linear => ScaleSpec {
                scale_type: ScaleType::Linear,
                base: None,
            },
            Self::Log2 => ScaleSpec {
                scale_type: ScaleType::Log,
                base: Some(2),
            },
            Self::Log10 => ScaleSpec {
                scale_type: ScaleType::Log,
                base: Some(10),
            },
        }
    }
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScaleKind {
    type Err = ExploreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Self::Linear),
            "log2" => Ok(Self::Log2),
            "log10" => Ok(Self::Log10),
            other => Err(ExploreError::UnknownScaleKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleType {
    Linear,
    Log,
}

/// Scale parameters for one positional axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleSpec {
    pub scale_type: ScaleType,
    pub base: Option<u32>,
}

impl ScaleSpec {
    /// Vega-Lite `scale` object. The zero anchor is always disabled: log scales cannot
    /// contain zero, and linear axes follow the same rule.
    pub fn to_json(&self) -> Value {
        let mut scale = match self.scale_type {
            ScaleType::Linear => json!({ "type": "linear" }),
            ScaleType::Log => json!({ "type": "log" }),
        };
        if let Some(base) = self.base {
            scale["base"] = json!(base);
        }
        scale["zero"] = json!(false);
        scale
    }
}

/// Resolve a scale token (`linear`, `log2`, `log10`).
pub fn resolve_scale(kind: &str) -> Result<ScaleSpec> {
    Ok(kind.parse::<ScaleKind>()?.spec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_kinds() {
        assert_eq!(
            resolve_scale("linear").unwrap(),
            ScaleSpec {
                scale_type: ScaleType::Linear,
                base: None
            }
        );
        assert_eq!(
            resolve_scale("log10").unwrap(),
            ScaleSpec {
                scale_type: ScaleType::Log,
                base: Some(10)
            }
        );
        assert_eq!(
            resolve_scale("log2").unwrap(),
            ScaleSpec {
                scale_type: ScaleType::Log,
                base: Some(2)
            }
        );
    }

    #[test]
    fn test_resolve_unknown_kind() {
        for bad in ["ln", "LOG10", "", "sqrt"] {
            match resolve_scale(bad) {
                Err(ExploreError::UnknownScaleKind(s)) => assert_eq!(s, bad),
                other => panic!("expected UnknownScaleKind for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_scale_json() {
        assert_eq!(
            ScaleKind::Linear.spec().to_json(),
            json!({"type": "linear", "zero": false})
        );
        assert_eq!(
            ScaleKind::Log2.spec().to_json(),
            json!({"type": "log", "base": 2, "zero": false})
        );
    }

    #[test]
    fn test_display_roundtrip() {
        for kind in [ScaleKind::Linear, ScaleKind::Log2, ScaleKind::Log10] {
            assert_eq!(kind.to_string().parse::<ScaleKind>().unwrap(), kind);
        }
    }
}
