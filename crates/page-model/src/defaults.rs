//! The defaults table shared by the encoder and the decoder.
//!
//! The encoder omits every attribute equal to its entry here and the decoder
//! fills every absent attribute from it; both sides must read the same table.

use crate::color::Rgb;

/// Default character attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterDefaults {
    pub family: &'static str,
    pub size: u32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub subscript: bool,
    pub superscript: bool,
    pub foreground: Rgb,
}

/// Character defaults applied to every run.
pub const CHARACTER_DEFAULTS: CharacterDefaults = CharacterDefaults {
    family: "Verdana",
    size: 12,
    bold: false,
    italic: false,
    underline: false,
    strikethrough: false,
    subscript: false,
    superscript: false,
    foreground: Rgb::BLACK,
};

/// Color of a hyperlink that is not in the visited history.
pub const LINK_UNVISITED: Rgb = Rgb::new(0, 0, 255);

/// Color of a hyperlink found in the visited history.
pub const LINK_VISITED: Rgb = Rgb::new(128, 0, 128);

/// Character set assumed when a document does not declare one.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Page background when none is declared.
pub const DEFAULT_BACKGROUND: Rgb = Rgb::WHITE;

/// Character occupying the text slot of an embedded icon or component.
pub const EMBED_CHAR: char = '\u{FFFC}';
