//! Sparse attribute bags for runs and paragraphs.
//!
//! Every key is optional: `None` means "inherit the default" from
//! [`CHARACTER_DEFAULTS`](crate::defaults::CHARACTER_DEFAULTS). The `effective_*`
//! getters resolve the default; [`AttributeBag::normalized`] strips explicit
//! values that equal it.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::component::ComponentId;
use crate::defaults::{CHARACTER_DEFAULTS, LINK_UNVISITED};
use crate::icon::Icon;

/// Parameters for a link that opens in a new window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resizable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menubar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolbar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statusbar: Option<bool>,
}

impl WindowSpec {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A hyperlink target carried by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub href: String,
    /// Frame name, e.g. `_blank`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "WindowSpec::is_empty")]
    pub window: WindowSpec,
}

impl Hyperlink {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            target: None,
            window: WindowSpec::default(),
        }
    }
}

/// What a run draws in place of its text slot.
///
/// Being a single enum makes icon and component attachment mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attachment {
    Icon(Icon),
    Component(ComponentId),
}

/// Character-level attributes of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeBag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscript: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superscript: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Hyperlink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl AttributeBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    #[must_use]
    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    #[must_use]
    pub fn with_underline(mut self, underline: bool) -> Self {
        self.underline = Some(underline);
        self
    }

    #[must_use]
    pub fn with_foreground(mut self, color: Rgb) -> Self {
        self.foreground = Some(color);
        self
    }

    /// Attach a hyperlink together with the styling a reader derives from it
    /// (underline plus the unvisited link color).
    #[must_use]
    pub fn with_link(mut self, href: impl Into<String>) -> Self {
        self.link = Some(Hyperlink::new(href));
        self.underline = Some(true);
        self.foreground = Some(LINK_UNVISITED);
        self
    }

    #[must_use]
    pub fn effective_family(&self) -> &str {
        self.family.as_deref().unwrap_or(CHARACTER_DEFAULTS.family)
    }

    #[must_use]
    pub fn effective_size(&self) -> u32 {
        self.size.unwrap_or(CHARACTER_DEFAULTS.size)
    }

    #[must_use]
    pub fn effective_bold(&self) -> bool {
        self.bold.unwrap_or(CHARACTER_DEFAULTS.bold)
    }

    #[must_use]
    pub fn effective_italic(&self) -> bool {
        self.italic.unwrap_or(CHARACTER_DEFAULTS.italic)
    }

    #[must_use]
    pub fn effective_underline(&self) -> bool {
        self.underline.unwrap_or(CHARACTER_DEFAULTS.underline)
    }

    #[must_use]
    pub fn effective_strikethrough(&self) -> bool {
        self.strikethrough.unwrap_or(CHARACTER_DEFAULTS.strikethrough)
    }

    #[must_use]
    pub fn effective_subscript(&self) -> bool {
        self.subscript.unwrap_or(CHARACTER_DEFAULTS.subscript)
    }

    #[must_use]
    pub fn effective_superscript(&self) -> bool {
        self.superscript.unwrap_or(CHARACTER_DEFAULTS.superscript)
    }

    #[must_use]
    pub fn effective_foreground(&self) -> Rgb {
        self.foreground.unwrap_or(CHARACTER_DEFAULTS.foreground)
    }

    /// Drop every explicit value that equals the default.
    #[must_use]
    pub fn normalized(&self) -> Self {
        fn keep<T: PartialEq + Clone>(value: &Option<T>, default: &T) -> Option<T> {
            value.as_ref().filter(|v| *v != default).cloned()
        }
        Self {
            family: self
                .family
                .clone()
                .filter(|family| family != CHARACTER_DEFAULTS.family),
            size: keep(&self.size, &CHARACTER_DEFAULTS.size),
            bold: keep(&self.bold, &CHARACTER_DEFAULTS.bold),
            italic: keep(&self.italic, &CHARACTER_DEFAULTS.italic),
            underline: keep(&self.underline, &CHARACTER_DEFAULTS.underline),
            strikethrough: keep(&self.strikethrough, &CHARACTER_DEFAULTS.strikethrough),
            subscript: keep(&self.subscript, &CHARACTER_DEFAULTS.subscript),
            superscript: keep(&self.superscript, &CHARACTER_DEFAULTS.superscript),
            foreground: keep(&self.foreground, &CHARACTER_DEFAULTS.foreground),
            link: self.link.clone(),
            attachment: self.attachment.clone(),
        }
    }

    #[must_use]
    pub fn icon(&self) -> Option<&Icon> {
        match &self.attachment {
            Some(Attachment::Icon(icon)) => Some(icon),
            _ => None,
        }
    }

    #[must_use]
    pub fn component(&self) -> Option<ComponentId> {
        match &self.attachment {
            Some(Attachment::Component(id)) => Some(*id),
            _ => None,
        }
    }
}

/// Horizontal paragraph alignment, numbered as on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

impl Alignment {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Left => 0,
            Self::Center => 1,
            Self::Right => 2,
            Self::Justified => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Left),
            1 => Some(Self::Center),
            2 => Some(Self::Right),
            3 => Some(Self::Justified),
            _ => None,
        }
    }
}

/// Paragraph-level attributes; `None` inherits the default (zero / left).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_indent: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_indent: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_line_indent: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_above: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_below: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f32>,
}

impl ParagraphAttributes {
    #[must_use]
    pub fn centered() -> Self {
        Self {
            alignment: Some(Alignment::Center),
            ..Self::default()
        }
    }

    /// Drop explicit values equal to the defaults (left alignment, zero spacing).
    #[must_use]
    pub fn normalized(&self) -> Self {
        let nonzero = |value: Option<f32>| value.filter(|v| *v != 0.0);
        Self {
            alignment: self.alignment.filter(|a| *a != Alignment::Left),
            left_indent: nonzero(self.left_indent),
            right_indent: nonzero(self.right_indent),
            first_line_indent: nonzero(self.first_line_indent),
            space_above: nonzero(self.space_above),
            space_below: nonzero(self.space_below),
            line_spacing: nonzero(self.line_spacing),
        }
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.normalized() == Self::default()
    }
}
