//! Drawable icons that can occupy a run's text slot.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::resource::ResourceRef;

/// Margins around a line icon, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

/// Shape of a list bullet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletKind {
    #[default]
    Disc,
    Circle,
    Square,
    Diamond,
}

impl BulletKind {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Disc => 0,
            Self::Circle => 1,
            Self::Square => 2,
            Self::Diamond => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Circle,
            2 => Self::Square,
            3 => Self::Diamond,
            _ => Self::Disc,
        }
    }
}

/// A horizontal rule or framed box drawn inline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineIcon {
    pub width: i32,
    pub height: i32,
    pub margins: Margins,
    pub corner_arc: i32,
    pub arc_width: i32,
    pub arc_height: i32,
    pub opaque: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Icon {
    /// Raster image stored beside the document.
    Image {
        resource: ResourceRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<i32>,
    },
    Line(LineIcon),
    Bullet { kind: BulletKind },
    /// Stand-in for an image whose resource could not be loaded.
    Placeholder { missing: ResourceRef },
}

impl Icon {
    pub const IMAGE: &'static str = "page.icon.Image";
    pub const LINE: &'static str = "page.icon.Line";
    pub const BULLET: &'static str = "page.icon.Bullet";

    /// Type name written in the `class` leaf.
    ///
    /// Placeholders are written as the image they replace.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Image { .. } | Self::Placeholder { .. } => Self::IMAGE,
            Self::Line(_) => Self::LINE,
            Self::Bullet { .. } => Self::BULLET,
        }
    }

    pub fn image(resource: impl Into<String>) -> Self {
        Self::Image {
            resource: ResourceRef::new(resource),
            width: None,
            height: None,
        }
    }

    /// Resource that must be fetched before the icon can be drawn.
    #[must_use]
    pub fn resource(&self) -> Option<&ResourceRef> {
        match self {
            Self::Image { resource, .. } => Some(resource),
            Self::Placeholder { missing } => Some(missing),
            Self::Line(_) | Self::Bullet { .. } => None,
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}
