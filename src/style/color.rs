//! Color normalization.
//!
//! Sources hand us colors in several shapes: `#RRGGBB`, `#AARRGGBB`
//! (alpha-prefixed, common in editor exports), bare hex without the `#`,
//! and integer-packed RGB from the page-layout format. Everything is
//! canonicalized to a single 24-bit RGB value and rendered back out in
//! whatever form the target format wants.

use crate::error::{Error, Result};

/// A canonical 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.css())
    }
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    /// Parse a hex color string.
    ///
    /// Accepts an optional leading `#`, then either exactly 6 hex digits or
    /// 8 hex digits whose first two are an alpha prefix (which is dropped).
    /// Anything else fails with [`Error::InvalidColor`].
    pub fn parse(raw: &str) -> Result<Color> {
        let hex = raw.strip_prefix('#').unwrap_or(raw);
        let hex = match hex.len() {
            6 => hex,
            8 => &hex[2..],
            _ => return Err(Error::InvalidColor(raw.to_string())),
        };
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(raw.to_string()));
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| Error::InvalidColor(raw.to_string()))?;
        Ok(Color::from_packed(value))
    }

    /// Build a color from an integer-packed `0x00RRGGBB` value.
    pub fn from_packed(value: u32) -> Color {
        Color {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    /// Build a color from float components in `0.0..=1.0` (page-layout
    /// fill-color operands).
    pub fn from_rgb_f32(r: f32, g: f32, b: f32) -> Color {
        let clamp = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color {
            r: clamp(r),
            g: clamp(g),
            b: clamp(b),
        }
    }

    /// Uppercase `RRGGBB`, the word-package form (`w:color w:val`).
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// `#RRGGBB`, the Delta wire form.
    pub fn css(&self) -> String {
        format!("#{}", self.hex())
    }

    /// Components scaled to `0.0..=1.0`, the page-layout form.
    pub fn rgb_components(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    pub fn is_black(&self) -> bool {
        *self == Color::BLACK
    }
}
