//! Push buttons, toggles, choosers and numeric input controls.

use serde::{Deserialize, Serialize};

use super::{Frame, ModelBinding, Orientation};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonSpec {
    pub title: Option<String>,
    pub tooltip: Option<String>,
    /// Named model action fired on click.
    pub action: Option<String>,
    pub script: Option<String>,
    /// Repeat the action while the button is held down.
    pub continuous: Option<bool>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

/// Check boxes and radio buttons.
///
/// `selected` is never written; it is pushed from the model switch when the
/// control is wired.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToggleSpec {
    pub title: Option<String>,
    pub tooltip: Option<String>,
    pub switch: Option<String>,
    /// Script run when the toggle is turned on.
    pub script: Option<String>,
    /// Script run when the toggle is turned off.
    pub script_off: Option<String>,
    /// Button group, radio buttons only.
    pub group: Option<i32>,
    #[serde(default)]
    pub selected: Option<bool>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboBoxSpec {
    pub tooltip: Option<String>,
    pub items: Vec<String>,
    pub selected_index: Option<i32>,
    pub action: Option<String>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

/// Label painted under a slider tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickLabel {
    pub value: f32,
    pub text: String,
}

impl TickLabel {
    /// Parse `value=text` pairs separated by `;`. Malformed pairs are dropped.
    #[must_use]
    pub fn parse_table(text: &str) -> Vec<Self> {
        text.split(';')
            .filter_map(|pair| {
                let (value, label) = pair.split_once('=')?;
                let value = value.trim().parse::<f32>().ok()?;
                Some(Self {
                    value,
                    text: label.trim().to_string(),
                })
            })
            .collect()
    }

    #[must_use]
    pub fn format_table(labels: &[Self]) -> String {
        labels
            .iter()
            .map(|label| format!("{}={}", label.value, label.text))
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliderSpec {
    pub title: Option<String>,
    pub tooltip: Option<String>,
    pub minimum: Option<f32>,
    pub maximum: Option<f32>,
    pub value: Option<f32>,
    /// Number of tick intervals.
    pub ticks: Option<i32>,
    pub orientation: Option<Orientation>,
    pub labels: Vec<TickLabel>,
    pub paint_ticks: Option<bool>,
    pub paint_labels: Option<bool>,
    /// Model property the slider drives.
    pub property: Option<String>,
    pub script: Option<String>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpinnerSpec {
    pub title: Option<String>,
    pub tooltip: Option<String>,
    pub minimum: Option<f32>,
    pub maximum: Option<f32>,
    pub value: Option<f32>,
    pub step: Option<f32>,
    pub property: Option<String>,
    pub script: Option<String>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

/// Page-level activity trigger (snapshot, submit, navigate).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityButtonSpec {
    pub title: Option<String>,
    pub tooltip: Option<String>,
    pub action: Option<String>,
    pub script: Option<String>,
    /// Page or file the activity opens.
    pub target: Option<crate::ResourceRef>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

/// Interactive console attached to a model's script engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptConsoleSpec {
    pub prompt: Option<String>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_table_parses_and_formats() {
        let labels = TickLabel::parse_table("0=Cold; 50=Warm;bad;100=Hot");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[1].text, "Warm");
        assert_eq!(TickLabel::format_table(&labels), "0=Cold;50=Warm;100=Hot");
    }
}
