//! Read-outs and graphs that observe model data sources.

use serde::{Deserialize, Serialize};

use super::{Frame, ModelBinding, Orientation};
use crate::color::Rgb;

/// Formatting applied to an observed value: `value * multiplier + addend`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueFormat {
    /// Decimal pattern such as `0.00`.
    pub pattern: Option<String>,
    pub multiplier: Option<f32>,
    pub addend: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericBoxSpec {
    pub data_source: Option<String>,
    pub format: ValueFormat,
    pub tooltip: Option<String>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarGraphSpec {
    pub data_source: Option<String>,
    pub minimum: Option<f32>,
    pub maximum: Option<f32>,
    pub orientation: Option<Orientation>,
    pub format: ValueFormat,
    /// Show the running average instead of the instantaneous value.
    pub average: Option<bool>,
    /// Smoothing window length.
    pub sample: Option<i32>,
    pub ticks: Option<i32>,
    pub foreground: Option<Rgb>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

/// One curve of an [`XyGraphSpec`], keyed by its `time_series_y<N>` ordinal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub ordinal: u16,
    pub source: String,
    pub color: Option<Rgb>,
    pub symbol: Option<i32>,
    pub style: Option<i32>,
    pub width: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XyGraphSpec {
    pub title: Option<String>,
    /// Data source plotted on the horizontal axis.
    pub x_series: Option<String>,
    pub series: Vec<Series>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub auto_scale: Option<bool>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

/// Plot of one or more expressions in `x`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionGraphSpec {
    pub expressions: Vec<String>,
    pub x_min: Option<f32>,
    pub x_max: Option<f32>,
    pub y_min: Option<f32>,
    pub y_max: Option<f32>,
    pub frame: Frame,
}
