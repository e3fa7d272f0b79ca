//! Components that host a model, external code, or a media file.
//!
//! Everything here owns at least one resource fetched after parsing.

use serde::{Deserialize, Serialize};

use super::Frame;
use crate::resource::ResourceRef;

/// Simulation engine behind a model-bearing component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Atomic,
    Chemical,
    GayBerne,
    Molecular3D,
    Particle3D,
}

impl ModelKind {
    /// Extension of the companion state file written next to the page.
    #[must_use]
    pub const fn state_extension(self) -> &'static str {
        match self {
            Self::Atomic => "mml",
            Self::Chemical => "cml",
            Self::GayBerne => "gbl",
            Self::Molecular3D => "jms",
            Self::Particle3D => "mdd",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Atomic => "atomic",
            Self::Chemical => "chemical",
            Self::GayBerne => "gay-berne",
            Self::Molecular3D => "molecular-3d",
            Self::Particle3D => "particle-3d",
        }
    }
}

/// 2-D model canvas. The engine is chosen by the type name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCanvasSpec {
    pub kind: ModelKind,
    /// Model index, assigned in document order.
    pub index: usize,
    pub state: Option<ResourceRef>,
    pub menubar: Option<bool>,
    pub statusbar: Option<bool>,
    pub recorder: Option<bool>,
    pub frame: Frame,
}

impl ModelCanvasSpec {
    #[must_use]
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            index: 0,
            state: None,
            menubar: None,
            statusbar: None,
            recorder: None,
            frame: Frame::default(),
        }
    }
}

/// 3-D molecular structure viewer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MolecularViewerSpec {
    pub index: usize,
    pub structure: Option<ResourceRef>,
    /// Script run after the structure is loaded.
    pub script: Option<String>,
    pub navigation: Option<bool>,
    pub spin: Option<bool>,
    pub frame: Frame,
}

/// 3-D particle model canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model3DCanvasSpec {
    pub index: usize,
    pub state: Option<ResourceRef>,
    pub menubar: Option<bool>,
    pub frame: Frame,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    /// Parse `name=value`; a bare name gets an empty value.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let (name, value) = text.split_once('=').unwrap_or((text, ""));
        Some(Self {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
        })
    }

    #[must_use]
    pub fn format(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Applets and plugins: external code loaded from archives beside the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedCodeSpec {
    /// Entry point type name inside the archives.
    pub code: Option<String>,
    pub archives: Vec<ResourceRef>,
    pub parameters: Vec<Parameter>,
    pub frame: Frame,
}

impl EmbeddedCodeSpec {
    /// Split a comma separated archive list.
    #[must_use]
    pub fn parse_archives(text: &str) -> Vec<ResourceRef> {
        text.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ResourceRef::new)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioPlayerSpec {
    pub title: Option<String>,
    pub tooltip: Option<String>,
    pub clip: Option<ResourceRef>,
    pub frame: Frame,
}

/// An image presented as a component (tooltip, border, click target).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconWrapperSpec {
    pub image: Option<ResourceRef>,
    /// Set when `image` could not be loaded; the wrapper shows a placeholder.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub image_missing: bool,
    pub tooltip: Option<String>,
    pub frame: Frame,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_parsing() {
        let parameter = Parameter::parse(" speed = 3 ").unwrap();
        assert_eq!(parameter.name, "speed");
        assert_eq!(parameter.value, "3");
        assert_eq!(Parameter::parse("flag").unwrap().value, "");
        assert!(Parameter::parse("  ").is_none());
    }

    #[test]
    fn archive_list_parsing() {
        let archives = EmbeddedCodeSpec::parse_archives("a.jar, b.jar,,");
        assert_eq!(archives, vec![ResourceRef::new("a.jar"), ResourceRef::new("b.jar")]);
    }
}
