//! The decoder's scratch accumulator.
//!
//! Leaf closes store one parsed value per [`Leaf`] slot. Structural closes read
//! a declared subset of slots through a [`ScratchView`] and reset exactly that
//! subset afterwards, see [`Scratch::consume`]. Slots outside the subset keep
//! their values, which is how `color1`, `style`, `width` and friends act as
//! staging values shared by several structural kinds.

use std::collections::BTreeMap;
use std::fmt;

use page_model::component::Series;
use page_model::{ResourceRef, Rgb};

use crate::tag::{Leaf, ValueType};

/// A parsed leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Color(Rgb),
    Text(String),
    List(Vec<String>),
    Series(Vec<Series>),
}

/// Leaf text that does not parse as the leaf's declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    pub leaf: Leaf,
    pub text: String,
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a valid {:?} for <{}>",
            self.text,
            self.leaf.value_type(),
            self.leaf.name()
        )
    }
}

/// Parse leaf text according to the leaf's [`ValueType`].
///
/// List and series leaves are not handled here; they append.
fn parse_value(leaf: Leaf, text: &str) -> Option<LeafValue> {
    let trimmed = text.trim();
    match leaf.value_type() {
        ValueType::Int => trimmed
            .parse::<i64>()
            .ok()
            .or_else(|| {
                // Some writers emit integral values as "12.0".
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite() && value.fract() == 0.0)
                    .map(|value| value as i64)
            })
            .map(LeafValue::Int),
        ValueType::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(LeafValue::Float),
        ValueType::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Some(LeafValue::Bool(true)),
            "false" => Some(LeafValue::Bool(false)),
            _ => None,
        },
        ValueType::Color => Rgb::from_hex(trimmed).ok().map(LeafValue::Color),
        ValueType::Rgb => Rgb::from_triple(trimmed).ok().map(LeafValue::Color),
        ValueType::Text => Some(LeafValue::Text(text.to_string())),
        ValueType::TextList => Some(LeafValue::List(vec![text.to_string()])),
        ValueType::Series => None,
    }
}

/// Format a stored value back to leaf text.
#[must_use]
pub fn format_value(leaf: Leaf, value: &LeafValue) -> String {
    match value {
        LeafValue::Int(value) => value.to_string(),
        LeafValue::Float(value) => value.to_string(),
        LeafValue::Bool(value) => value.to_string(),
        LeafValue::Color(color) if leaf.value_type() == ValueType::Rgb => color.to_triple(),
        LeafValue::Color(color) => color.to_hex(),
        LeafValue::Text(text) => text.clone(),
        LeafValue::List(items) => items.join("\n"),
        LeafValue::Series(series) => series
            .iter()
            .map(|series| series.source.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// One optional value per leaf.
#[derive(Debug, Clone)]
pub struct Scratch {
    slots: Vec<Option<LeafValue>>,
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

impl Scratch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![None; Leaf::ALL.len()],
        }
    }

    /// Parse `text` into the leaf's slot.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidValue`] when the text does not parse; the slot keeps
    /// its previous value.
    pub fn store(&mut self, leaf: Leaf, text: &str) -> Result<(), InvalidValue> {
        let value = parse_value(leaf, text).ok_or_else(|| InvalidValue {
            leaf,
            text: text.to_string(),
        })?;
        let slot = &mut self.slots[leaf.slot()];
        match value {
            LeafValue::List(mut more) => match slot {
                Some(LeafValue::List(items)) => items.append(&mut more),
                _ => *slot = Some(LeafValue::List(more)),
            },
            value => *slot = Some(value),
        }
        Ok(())
    }

    /// Append one graph series.
    pub fn store_series(&mut self, series: Series) {
        let slot = &mut self.slots[Leaf::TimeSeriesY.slot()];
        match slot {
            Some(LeafValue::Series(all)) => all.push(series),
            _ => *slot = Some(LeafValue::Series(vec![series])),
        }
    }

    #[must_use]
    pub fn get(&self, leaf: Leaf) -> Option<&LeafValue> {
        self.slots[leaf.slot()].as_ref()
    }

    #[must_use]
    pub fn is_set(&self, leaf: Leaf) -> bool {
        self.slots[leaf.slot()].is_some()
    }

    /// Text of a text slot without consuming it.
    #[must_use]
    pub fn peek_text(&self, leaf: Leaf) -> Option<&str> {
        match self.get(leaf) {
            Some(LeafValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Build from the declared `slots`, then reset exactly those slots.
    pub fn consume<T>(&mut self, slots: &[Leaf], build: impl FnOnce(&ScratchView<'_>) -> T) -> T {
        let built = build(&ScratchView {
            scratch: self,
            allowed: slots,
        });
        for leaf in slots {
            self.slots[leaf.slot()] = None;
        }
        built
    }

    /// Reset `slots` without reading them; returns how many were set.
    pub fn discard(&mut self, slots: &[Leaf]) -> usize {
        slots
            .iter()
            .filter_map(|leaf| self.slots[leaf.slot()].take())
            .count()
    }

    /// Leaves that currently hold a value.
    pub fn occupied(&self) -> impl Iterator<Item = Leaf> + '_ {
        Leaf::ALL.iter().copied().filter(|leaf| self.is_set(*leaf))
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}

/// Read access to a declared subset of scratch slots.
pub struct ScratchView<'a> {
    scratch: &'a Scratch,
    allowed: &'a [Leaf],
}

impl ScratchView<'_> {
    fn get(&self, leaf: Leaf) -> Option<&LeafValue> {
        debug_assert!(
            self.allowed.contains(&leaf),
            "<{}> read outside its declared slot set",
            leaf.name()
        );
        self.scratch.get(leaf)
    }

    #[must_use]
    pub fn text(&self, leaf: Leaf) -> Option<String> {
        match self.get(leaf) {
            Some(LeafValue::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn int(&self, leaf: Leaf) -> Option<i32> {
        match self.get(leaf) {
            Some(LeafValue::Int(value)) => {
                Some(i32::try_from(*value).unwrap_or(if *value < 0 { i32::MIN } else { i32::MAX }))
            }
            _ => None,
        }
    }

    /// Non-negative integer, e.g. a model index.
    #[must_use]
    pub fn index(&self, leaf: Leaf) -> Option<usize> {
        match self.get(leaf) {
            Some(LeafValue::Int(value)) => usize::try_from(*value).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn float(&self, leaf: Leaf) -> Option<f32> {
        match self.get(leaf) {
            Some(LeafValue::Float(value)) => Some(*value as f32),
            Some(LeafValue::Int(value)) => Some(*value as f32),
            _ => None,
        }
    }

    #[must_use]
    pub fn flag(&self, leaf: Leaf) -> Option<bool> {
        match self.get(leaf) {
            Some(LeafValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn color(&self, leaf: Leaf) -> Option<Rgb> {
        match self.get(leaf) {
            Some(LeafValue::Color(color)) => Some(*color),
            _ => None,
        }
    }

    #[must_use]
    pub fn list(&self, leaf: Leaf) -> Vec<String> {
        match self.get(leaf) {
            Some(LeafValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn series(&self) -> Vec<Series> {
        match self.get(Leaf::TimeSeriesY) {
            Some(LeafValue::Series(series)) => series.clone(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn resource(&self, leaf: Leaf) -> Option<ResourceRef> {
        self.text(leaf)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .map(ResourceRef::new)
    }

    /// Every set slot of the view, formatted back to text and keyed by leaf name.
    #[must_use]
    pub fn properties(&self) -> BTreeMap<String, String> {
        self.allowed
            .iter()
            .filter_map(|&leaf| {
                self.get(leaf)
                    .map(|value| (leaf.name().to_string(), format_value(leaf, value)))
            })
            .collect()
    }
}

/// Slot sets read by the non-component structural closes.
pub mod slots {
    use std::sync::LazyLock;

    use crate::tag::Leaf;

    /// Read at `text` close and again at `document` close.
    pub const HEADER: &[Leaf] = &[
        Leaf::Language,
        Leaf::PageTitle,
        Leaf::BgSound,
        Leaf::Loop,
        Leaf::BgImage,
    ];

    pub const BG_COLOR: &[Leaf] = &[Leaf::Red, Leaf::Green, Leaf::Blue];

    pub const BG_GRADIENT: &[Leaf] = &[Leaf::Color1, Leaf::Color2, Leaf::Style, Leaf::Variant];

    pub const BG_PATTERN: &[Leaf] = &[
        Leaf::Color1,
        Leaf::Color2,
        Leaf::Style,
        Leaf::Width,
        Leaf::Height,
    ];

    pub const PARAGRAPH: &[Leaf] = &[
        Leaf::Alignment,
        Leaf::LeftIndent,
        Leaf::RightIndent,
        Leaf::FirstLineIndent,
        Leaf::SpaceAbove,
        Leaf::SpaceBelow,
        Leaf::LineSpacing,
    ];

    pub const RUN: &[Leaf] = &[
        Leaf::Family,
        Leaf::Size,
        Leaf::Bold,
        Leaf::Italic,
        Leaf::Underline,
        Leaf::Strikethrough,
        Leaf::Subscript,
        Leaf::Superscript,
        Leaf::Foreground,
        Leaf::Href,
        Leaf::Target,
        Leaf::WindowWidth,
        Leaf::WindowHeight,
        Leaf::WindowResizable,
        Leaf::WindowMenubar,
        Leaf::WindowToolbar,
        Leaf::WindowStatusbar,
    ];

    pub const ICON: &[Leaf] = &[
        Leaf::Class,
        Leaf::Width,
        Leaf::Height,
        Leaf::LeftMargin,
        Leaf::RightMargin,
        Leaf::TopMargin,
        Leaf::BottomMargin,
        Leaf::CornerArc,
        Leaf::ArcWidth,
        Leaf::ArcHeight,
        Leaf::Opaque,
        Leaf::Title,
        Leaf::Color,
        Leaf::Resource,
        Leaf::Style,
    ];

    /// Every slot a closing `icon` or `component` owns: all leaves except the
    /// header, paragraph and run sets, which belong to enclosing elements.
    /// Includes the background staging leaves (`style`, `color1`, ...) since
    /// embedded elements read them too.
    #[must_use]
    pub fn embedded_scope() -> &'static [Leaf] {
        static SCOPE: LazyLock<Vec<Leaf>> = LazyLock::new(|| {
            Leaf::ALL
                .iter()
                .copied()
                .filter(|leaf| {
                    !HEADER.contains(leaf) && !PARAGRAPH.contains(leaf) && !RUN.contains(leaf)
                })
                .collect()
        });
        &SCOPE
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn sample_text(leaf: Leaf) -> &'static str {
        match leaf.value_type() {
            ValueType::Int => "7",
            ValueType::Float => "2.5",
            ValueType::Bool => "true",
            ValueType::Color => "ff0000",
            ValueType::Rgb => "1 2 3",
            ValueType::Text | ValueType::TextList | ValueType::Series => "x",
        }
    }

    pub(crate) fn fill_every_slot(scratch: &mut Scratch) {
        for &leaf in Leaf::ALL {
            if leaf == Leaf::TimeSeriesY {
                scratch.store_series(Series::default());
            } else {
                scratch.store(leaf, sample_text(leaf)).unwrap();
            }
        }
    }

    pub(crate) fn assert_consumes_exactly(slots: &[Leaf]) {
        let mut scratch = Scratch::new();
        fill_every_slot(&mut scratch);
        scratch.consume(slots, |view| {
            for &leaf in slots {
                let _ = view.get(leaf);
            }
        });
        for &leaf in Leaf::ALL {
            assert_eq!(
                scratch.is_set(leaf),
                !slots.contains(&leaf),
                "<{}> after consuming {:?}",
                leaf.name(),
                slots
            );
        }
    }

    #[test]
    fn structural_slot_sets_reset_exactly_what_they_declare() {
        for set in [
            slots::HEADER,
            slots::BG_COLOR,
            slots::BG_GRADIENT,
            slots::BG_PATTERN,
            slots::PARAGRAPH,
            slots::RUN,
            slots::ICON,
        ] {
            assert_consumes_exactly(set);
        }
    }

    #[test]
    fn malformed_values_keep_the_previous_value() {
        let mut scratch = Scratch::new();
        scratch.store(Leaf::Size, "14").unwrap();
        let error = scratch.store(Leaf::Size, "big").unwrap_err();
        assert_eq!(error.leaf, Leaf::Size);
        assert_eq!(scratch.get(Leaf::Size), Some(&LeafValue::Int(14)));
        assert!(scratch.store(Leaf::Bold, "yes").is_err());
        assert!(!scratch.is_set(Leaf::Bold));
    }

    #[test]
    fn list_leaves_append() {
        let mut scratch = Scratch::new();
        scratch.store(Leaf::Item, "first").unwrap();
        scratch.store(Leaf::Item, "second").unwrap();
        let items = scratch.consume(&[Leaf::Item], |view| view.list(Leaf::Item));
        assert_eq!(items, vec!["first", "second"]);
        assert!(!scratch.is_set(Leaf::Item));
    }

    #[test]
    fn integral_floats_are_accepted_for_int_leaves() {
        let mut scratch = Scratch::new();
        scratch.store(Leaf::Width, "120.0").unwrap();
        assert!(scratch.store(Leaf::Width, "120.5").is_err());
        assert_eq!(scratch.get(Leaf::Width), Some(&LeafValue::Int(120)));
    }

    #[test]
    fn foreground_uses_decimal_triples() {
        let mut scratch = Scratch::new();
        scratch.store(Leaf::Foreground, "255 0 128").unwrap();
        let value = scratch.get(Leaf::Foreground).unwrap();
        assert_eq!(value, &LeafValue::Color(Rgb::new(255, 0, 128)));
        assert_eq!(format_value(Leaf::Foreground, value), "255 0 128");
    }

    #[test]
    fn properties_only_list_set_slots() {
        let mut scratch = Scratch::new();
        scratch.store(Leaf::Title, "Run").unwrap();
        scratch.store(Leaf::Minimum, "1.5").unwrap();
        let properties = scratch.consume(slots::embedded_scope(), |view| view.properties());
        assert_eq!(properties.len(), 2);
        assert_eq!(properties["title"], "Run");
        assert_eq!(properties["minimum"], "1.5");
    }

    #[test]
    fn embedded_scope_covers_shared_staging_leaves() {
        let scope = slots::embedded_scope();
        for leaf in [Leaf::Style, Leaf::Color1, Leaf::Variant, Leaf::Red, Leaf::Class] {
            assert!(scope.contains(&leaf), "<{}> outside the scope", leaf.name());
        }
        for leaf in [Leaf::PageTitle, Leaf::Alignment, Leaf::Bold] {
            assert!(!scope.contains(&leaf), "<{}> inside the scope", leaf.name());
        }
        assert_consumes_exactly(scope);
    }
}
