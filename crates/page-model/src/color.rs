//! RGB colors and their two textual encodings.
//!
//! Leaf values use a six-digit hex string (`rrggbb`); the run `foreground`
//! leaf uses a space-separated decimal triple (`"r g b"`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// An opaque 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from loosely typed channel values, clamping each to `0..=255`.
    #[must_use]
    pub fn from_components(red: i32, green: i32, blue: i32) -> Self {
        let clamp = |value: i32| u8::try_from(value.clamp(0, 255)).unwrap_or(u8::MAX);
        Self::new(clamp(red), clamp(green), clamp(blue))
    }

    /// Encode as lowercase `rrggbb`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode([self.r, self.g, self.b])
    }

    /// Decode `rrggbb`, tolerating a leading `#` or `0x` and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidColor`] when the text is not six hex digits.
    pub fn from_hex(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .unwrap_or(trimmed);
        let mut bytes = [0u8; 3];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| ModelError::InvalidColor(text.to_string()))?;
        Ok(Self::new(bytes[0], bytes[1], bytes[2]))
    }

    /// Encode as `"r g b"`.
    #[must_use]
    pub fn to_triple(&self) -> String {
        format!("{} {} {}", self.r, self.g, self.b)
    }

    /// Decode a space separated `"r g b"` triple.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidColor`] unless exactly three channels in
    /// `0..=255` are present.
    pub fn from_triple(text: &str) -> Result<Self> {
        let channels: Vec<u8> = text
            .split_whitespace()
            .map(str::parse::<u8>)
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| ModelError::InvalidColor(text.to_string()))?;
        match channels.as_slice() {
            [r, g, b] => Ok(Self::new(*r, *g, *b)),
            _ => Err(ModelError::InvalidColor(text.to_string())),
        }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_encoding_is_lowercase_six_digits() {
        assert_eq!(Rgb::new(255, 8, 160).to_hex(), "ff08a0");
    }

    #[test]
    fn hex_decoding_accepts_prefixes() {
        assert_eq!(Rgb::from_hex("#FF08A0").unwrap(), Rgb::new(255, 8, 160));
        assert_eq!(Rgb::from_hex("0x0000ff").unwrap(), Rgb::new(0, 0, 255));
        assert_eq!(Rgb::from_hex(" 800080 ").unwrap(), Rgb::new(128, 0, 128));
    }

    #[test]
    fn hex_decoding_rejects_garbage() {
        assert!(Rgb::from_hex("12345").is_err());
        assert!(Rgb::from_hex("zzzzzz").is_err());
    }

    #[test]
    fn triple_decoding() {
        assert_eq!(Rgb::from_triple("12 34 56").unwrap(), Rgb::new(12, 34, 56));
        assert!(Rgb::from_triple("12 34").is_err());
        assert!(Rgb::from_triple("12 34 999").is_err());
    }

    #[test]
    fn components_are_clamped() {
        assert_eq!(Rgb::from_components(-4, 300, 17), Rgb::new(0, 255, 17));
    }
}
