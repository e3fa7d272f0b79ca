//! Views that observe a model's internal state.

use serde::{Deserialize, Serialize};

use super::{Frame, ModelBinding};

/// Potential well or hill editor for one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PotentialSpec {
    pub element: Option<i32>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DnaScrollerSpec {
    pub sequence: Option<String>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

/// Energy level diagram for one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElectronicStructureSpec {
    pub element: Option<i32>,
    pub minimum: Option<f32>,
    pub maximum: Option<f32>,
    pub ticks: Option<i32>,
    pub paint_ticks: Option<bool>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

/// Diffraction instruments and photon spectrometers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub minimum: Option<f32>,
    pub maximum: Option<f32>,
    pub ticks: Option<i32>,
    /// Emission / absorption, or the diffraction pattern type.
    pub mode: Option<i32>,
    pub scale: Option<f32>,
    pub binding: ModelBinding,
    pub frame: Frame,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodicTableSpec {
    pub binding: ModelBinding,
    pub frame: Frame,
}
