//! The page tag vocabulary.
//!
//! Every element name the decoder understands maps to exactly one [`Tag`].
//! Structural tags trigger construction when they close; leaf tags only store
//! one value in the scratch accumulator.

/// Elements whose close builds a domain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Structural {
    Document,
    Text,
    Section,
    Paragraph,
    Content,
    Icon,
    Component,
    BgColor,
    BgGradient,
    BgPattern,
}

impl Structural {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Text => "text",
            Self::Section => "section",
            Self::Paragraph => "paragraph",
            Self::Content => "content",
            Self::Icon => "icon",
            Self::Component => "component",
            Self::BgColor => "bg_color",
            Self::BgGradient => "bg_gradient",
            Self::BgPattern => "bg_pattern",
        }
    }
}

/// How a leaf's character data is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Float,
    Bool,
    /// Hex `rrggbb`.
    Color,
    /// Decimal `"r g b"` triple.
    Rgb,
    Text,
    /// Repeated leaf; every occurrence is appended.
    TextList,
    /// `time_series_y<N>` with per-series attributes.
    Series,
}

macro_rules! leaves {
    ($($variant:ident => $name:literal : $kind:ident,)+) => {
        /// Elements that carry one scalar value.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Leaf {
            $($variant,)+
        }

        impl Leaf {
            /// Every leaf, in slot order.
            pub const ALL: &'static [Leaf] = &[$(Leaf::$variant,)+];

            /// Element name as written on the wire.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            #[must_use]
            pub const fn value_type(self) -> ValueType {
                match self {
                    $(Self::$variant => ValueType::$kind,)+
                }
            }

            fn from_exact(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

leaves! {
    // Document header
    Language => "language": Text,
    PageTitle => "page_title": Text,
    BgSound => "bgsound": Text,
    Loop => "loop": Bool,
    BgImage => "bg_image": Text,
    Red => "Red": Int,
    Green => "Green": Int,
    Blue => "Blue": Int,
    Color1 => "color1": Color,
    Color2 => "color2": Color,
    Style => "style": Int,
    Variant => "variant": Int,
    // Paragraph
    Alignment => "alignment": Int,
    LeftIndent => "left_indent": Float,
    RightIndent => "right_indent": Float,
    FirstLineIndent => "first_line_indent": Float,
    SpaceAbove => "space_above": Float,
    SpaceBelow => "space_below": Float,
    LineSpacing => "line_spacing": Float,
    // Run
    Family => "family": Text,
    Size => "size": Int,
    Bold => "bold": Bool,
    Italic => "italic": Bool,
    Underline => "underline": Bool,
    Strikethrough => "strikethrough": Bool,
    Subscript => "subscript": Bool,
    Superscript => "superscript": Bool,
    Foreground => "foreground": Rgb,
    Href => "href": Text,
    Target => "target": Text,
    WindowWidth => "window_width": Int,
    WindowHeight => "window_height": Int,
    WindowResizable => "window_resizable": Bool,
    WindowMenubar => "window_menubar": Bool,
    WindowToolbar => "window_toolbar": Bool,
    WindowStatusbar => "window_statusbar": Bool,
    // Icons and components
    Class => "class": Text,
    Width => "width": Int,
    Height => "height": Int,
    LeftMargin => "left_margin": Int,
    RightMargin => "right_margin": Int,
    TopMargin => "top_margin": Int,
    BottomMargin => "bottom_margin": Int,
    CornerArc => "cornerarc": Int,
    ArcWidth => "arcwidth": Int,
    ArcHeight => "archeight": Int,
    Opaque => "opaque": Bool,
    Title => "title": Text,
    Tooltip => "tooltip": Text,
    BorderType => "bordertype": Text,
    BgColorValue => "bgcolor": Color,
    FgColor => "fgcolor": Color,
    Color => "color": Color,
    Resource => "resource": Text,
    Model => "model": Int,
    ModelClass => "modelclass": Text,
    // Controls
    Script => "script": Text,
    Script2 => "script2": Text,
    Action => "action": Text,
    Switch => "switch": Text,
    Property => "property": Text,
    DataSource => "datasource": Text,
    Group => "group": Int,
    Continuous => "continuous": Bool,
    Minimum => "minimum": Float,
    Maximum => "maximum": Float,
    Value => "value": Float,
    Step => "step": Float,
    NStep => "nstep": Int,
    Orientation => "orientation": Int,
    LabelTable => "labeltable": Text,
    PaintTicks => "paint_ticks": Bool,
    PaintLabels => "paint_labels": Bool,
    SelectedIndex => "selectedIndex": Int,
    Item => "item": TextList,
    Prompt => "prompt": Text,
    // Graphs
    Format => "format": Text,
    Multiplier => "multiplier": Float,
    Addend => "addend": Float,
    Average => "average": Bool,
    Sample => "sample": Int,
    YMin => "ymin": Float,
    YMax => "ymax": Float,
    TimeSeriesX => "time_series_x": Text,
    TimeSeriesY => "time_series_y": Series,
    XLabel => "xlabel": Text,
    YLabel => "ylabel": Text,
    AutoScale => "autoscale": Bool,
    Expression => "expression": TextList,
    // Questions and tables
    Description => "description": Text,
    FieldText => "fieldtext": Text,
    Answer => "answer": Text,
    Choice => "choice": TextList,
    Multiple => "multiple": Bool,
    Submit => "submit": Bool,
    Row => "row": Int,
    Column => "column": Int,
    Cell => "te": TextList,
    Header => "header": Bool,
    Grid => "grid": Bool,
    Editable => "editable": Bool,
    // Instruments and hosts
    Element => "element": Int,
    Dna => "dna": Text,
    Mode => "mode": Int,
    Scale => "scale": Float,
    Navigation => "navigation": Bool,
    Spin => "spin": Bool,
    Menubar => "menubar": Bool,
    Statusbar => "statusbar": Bool,
    Recorder => "recorder": Bool,
    Code => "code": Text,
    Parameter => "parameter": TextList,
}

impl Leaf {
    /// Scratch slot index.
    #[must_use]
    pub const fn slot(self) -> usize {
        self as usize
    }

    /// Look up a leaf by its wire name; `time_series_y` matches without ordinal.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_exact(name)
    }
}

/// Prefix of the numbered graph series leaves.
pub const SERIES_PREFIX: &str = "time_series_y";

/// Classified element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Structural(Structural),
    Leaf(Leaf),
    /// `time_series_y<N>`; the value goes to [`Leaf::TimeSeriesY`].
    Series(u16),
}

impl Tag {
    /// Classify an element name. Unknown names return `None` and are ignored.
    #[must_use]
    pub fn from_name(name: &[u8]) -> Option<Self> {
        let structural = match name {
            b"document" => Structural::Document,
            b"text" => Structural::Text,
            b"section" => Structural::Section,
            b"paragraph" => Structural::Paragraph,
            b"content" => Structural::Content,
            b"icon" => Structural::Icon,
            b"component" => Structural::Component,
            b"bg_color" => Structural::BgColor,
            b"bg_gradient" => Structural::BgGradient,
            b"bg_pattern" => Structural::BgPattern,
            _ => {
                if let Some(ordinal) = name
                    .strip_prefix(SERIES_PREFIX.as_bytes())
                    .filter(|digits| !digits.is_empty())
                    .and_then(|digits| std::str::from_utf8(digits).ok())
                    .and_then(|digits| digits.parse::<u16>().ok())
                {
                    return Some(Self::Series(ordinal));
                }
                return std::str::from_utf8(name)
                    .ok()
                    .and_then(Leaf::from_exact)
                    .map(Self::Leaf);
            }
        };
        Some(Self::Structural(structural))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_leaf_name_resolves_to_itself() {
        for &leaf in Leaf::ALL {
            if leaf == Leaf::TimeSeriesY {
                continue;
            }
            assert_eq!(Tag::from_name(leaf.name().as_bytes()), Some(Tag::Leaf(leaf)));
        }
    }

    #[test]
    fn slots_are_dense() {
        for (index, leaf) in Leaf::ALL.iter().enumerate() {
            assert_eq!(leaf.slot(), index);
        }
    }

    #[test]
    fn series_leaves_carry_ordinal() {
        assert_eq!(Tag::from_name(b"time_series_y3"), Some(Tag::Series(3)));
        assert_eq!(Tag::from_name(b"time_series_y"), Some(Tag::Leaf(Leaf::TimeSeriesY)));
        assert_eq!(Tag::from_name(b"time_series_yx"), None);
    }

    #[test]
    fn structural_and_unknown_names() {
        assert_eq!(
            Tag::from_name(b"paragraph"),
            Some(Tag::Structural(Structural::Paragraph))
        );
        assert_eq!(Tag::from_name(b"blink"), None);
        assert_eq!(Tag::from_name(b"Red"), Some(Tag::Leaf(Leaf::Red)));
        assert_eq!(Tag::from_name(b"red"), None);
    }
}
