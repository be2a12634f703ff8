//! Attribute codec: mapping between Delta attributes and run styling.
//!
//! Pure and total in both directions. An absent native property yields an
//! absent attribute key and vice versa; boolean attributes are never carried
//! with a `false` value, so "explicitly off" and "unset" collapse into one
//! state by construction.

use serde::{Deserialize, Serialize};

use crate::delta::Attributes;
use crate::error::Diagnostics;
use crate::style::Color;

/// Super/subscript position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Super,
    Sub,
}

/// Bucketed font size.
///
/// Point sizes ≤ 10 bucket to `Small`, ≥ 16 to `Large`; everything between
/// is "normal" and carries no attribute. The bucketing is lossy and
/// non-invertible by design: regeneration produces the representative sizes
/// below, never the original points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Small,
    Large,
}

impl SizeBucket {
    /// Classify a point size, `None` meaning normal.
    pub fn from_points(pt: f32) -> Option<SizeBucket> {
        if pt <= 10.0 {
            Some(SizeBucket::Small)
        } else if pt >= 16.0 {
            Some(SizeBucket::Large)
        } else {
            None
        }
    }

    /// Representative point size for regeneration.
    pub fn points(self) -> f32 {
        match self {
            SizeBucket::Small => 8.0,
            SizeBucket::Large => 18.0,
        }
    }

    /// Point size for an optional bucket, normal text being 12pt.
    pub fn points_or_normal(bucket: Option<SizeBucket>) -> f32 {
        bucket.map(SizeBucket::points).unwrap_or(12.0)
    }

    /// Word-package size unit (half-points).
    pub fn half_points(self) -> u32 {
        (self.points() * 2.0) as u32
    }
}

/// Classify bold/italic from a page-layout font name.
///
/// Substring match on `Bold` / `Italic` / `Oblique`, the convention the
/// page-layout format encodes weight and slant with (`Arial-BoldItalic`,
/// `Helvetica-Oblique`, ...).
pub fn classify_font_name(name: &str) -> (bool, bool) {
    let bold = name.contains("Bold");
    let italic = name.contains("Italic") || name.contains("Oblique");
    (bold, italic)
}

/// Resolved inline styling for one run of text.
///
/// The native-side twin of [`Attributes`]: colors are parsed, sizes are
/// bucketed, and nothing here can be malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub script: Option<Script>,
    pub font: Option<String>,
    pub size: Option<SizeBucket>,
    pub color: Option<Color>,
    pub background: Option<Color>,
}

impl RunStyle {
    /// Decode a Delta attribute map.
    ///
    /// Colors that fail to parse are dropped and recorded in `diags`; the
    /// run itself always decodes.
    pub fn from_attributes(attrs: &Attributes, diags: &mut Diagnostics) -> RunStyle {
        let mut parse_color = |raw: &Option<String>| -> Option<Color> {
            match raw {
                Some(s) => match Color::parse(s) {
                    Ok(c) => Some(c),
                    Err(e) => {
                        diags.record(&e);
                        None
                    }
                },
                None => None,
            }
        };

        let color = parse_color(&attrs.color);
        let background = parse_color(&attrs.background);

        RunStyle {
            bold: attrs.bold.unwrap_or(false),
            italic: attrs.italic.unwrap_or(false),
            underline: attrs.underline.unwrap_or(false),
            strike: attrs.strike.unwrap_or(false),
            script: attrs.script,
            font: attrs.font.clone(),
            size: attrs.size,
            color,
            background,
        }
    }

    /// Encode back into a Delta attribute map. Unset properties produce no
    /// keys; the result may be empty.
    pub fn to_attributes(&self) -> Attributes {
        Attributes {
            bold: self.bold.then_some(true),
            italic: self.italic.then_some(true),
            underline: self.underline.then_some(true),
            strike: self.strike.then_some(true),
            script: self.script,
            font: self.font.clone(),
            size: self.size,
            color: self.color.map(|c| c.css()),
            background: self.background.map(|c| c.css()),
            ..Attributes::default()
        }
    }

    /// Whether any styling is applied.
    pub fn has_styling(&self) -> bool {
        *self != RunStyle::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bucketing() {
        assert_eq!(SizeBucket::from_points(8.0), Some(SizeBucket::Small));
        assert_eq!(SizeBucket::from_points(10.0), Some(SizeBucket::Small));
        assert_eq!(SizeBucket::from_points(12.0), None);
        assert_eq!(SizeBucket::from_points(15.9), None);
        assert_eq!(SizeBucket::from_points(16.0), Some(SizeBucket::Large));
        assert_eq!(SizeBucket::from_points(72.0), Some(SizeBucket::Large));
    }

    #[test]
    fn test_bucket_regeneration_sizes() {
        assert_eq!(SizeBucket::Small.points(), 8.0);
        assert_eq!(SizeBucket::Large.points(), 18.0);
        assert_eq!(SizeBucket::points_or_normal(None), 12.0);
        assert_eq!(SizeBucket::Small.half_points(), 16);
    }

    #[test]
    fn test_classify_font_name() {
        assert_eq!(classify_font_name("Arial-BoldItalic"), (true, true));
        assert_eq!(classify_font_name("Helvetica-Oblique"), (false, true));
        assert_eq!(classify_font_name("Times-Bold"), (true, false));
        assert_eq!(classify_font_name("Courier"), (false, false));
    }

    #[test]
    fn test_attributes_round_trip() {
        let style = RunStyle {
            bold: true,
            underline: true,
            script: Some(Script::Sub),
            font: Some("Georgia".to_string()),
            size: Some(SizeBucket::Large),
            color: Some(Color::parse("#E53935").unwrap()),
            ..RunStyle::default()
        };

        let attrs = style.to_attributes();
        assert_eq!(attrs.bold, Some(true));
        assert_eq!(attrs.italic, None);
        assert_eq!(attrs.color.as_deref(), Some("#E53935"));

        let mut diags = Diagnostics::new();
        let back = RunStyle::from_attributes(&attrs, &mut diags);
        assert!(diags.is_empty());
        assert_eq!(back, style);
    }

    #[test]
    fn test_invalid_color_recovered() {
        let attrs = Attributes {
            bold: Some(true),
            color: Some("notacolor".to_string()),
            ..Attributes::default()
        };

        let mut diags = Diagnostics::new();
        let style = RunStyle::from_attributes(&attrs, &mut diags);
        assert!(style.bold);
        assert_eq!(style.color, None);
        assert_eq!(diags.notes().len(), 1);
    }

    #[test]
    fn test_alpha_prefixed_color_normalizes() {
        let attrs = Attributes {
            color: Some("#FFE53935".to_string()),
            ..Attributes::default()
        };
        let mut diags = Diagnostics::new();
        let style = RunStyle::from_attributes(&attrs, &mut diags);
        assert_eq!(style.to_attributes().color.as_deref(), Some("#E53935"));
        assert!(diags.is_empty());
    }
}
