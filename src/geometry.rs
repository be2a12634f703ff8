//! Page geometry resolution.
//!
//! Generation requests name a page size and give margins in millimeters;
//! each target format wants its own unit — points (1/72 in) for the
//! page-layout format, twips (1/1440 in) for the word package. Geometry is
//! resolved once per request and applied to the whole output document.

use serde::{Deserialize, Serialize};

const MM_PER_INCH: f64 = 25.4;

/// Millimeters to points (1 in = 72 pt).
pub fn mm_to_points(mm: f64) -> f64 {
    mm / MM_PER_INCH * 72.0
}

/// Millimeters to twips (1 in = 1440 twips), rounded to the nearest unit.
pub fn mm_to_twips(mm: f64) -> i64 {
    (mm / MM_PER_INCH * 1440.0).round() as i64
}

/// A named page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageSize {
    /// Resolve a size name, case-insensitively. Unknown names fall back to
    /// A4 rather than failing the request.
    pub fn from_name(name: &str) -> PageSize {
        match name.to_ascii_lowercase().as_str() {
            "letter" => PageSize::Letter,
            "legal" => PageSize::Legal,
            "a4" => PageSize::A4,
            other => {
                log::warn!("unknown page size {:?}, using A4", other);
                PageSize::A4
            }
        }
    }

    /// Page box in millimeters, portrait.
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
        }
    }
}

/// Page margins in millimeters. All four sides are independent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            top: 20.0,
            bottom: 20.0,
            left: 20.0,
            right: 20.0,
        }
    }
}

impl Margins {
    pub fn uniform(mm: f64) -> Margins {
        Margins {
            top: mm,
            bottom: mm,
            left: mm,
            right: mm,
        }
    }
}

/// Resolved page geometry for one generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub size: PageSize,
    pub margins: Margins,
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry {
            size: PageSize::A4,
            margins: Margins::default(),
        }
    }
}

impl PageGeometry {
    /// Resolve a request's optional size name and margins.
    pub fn resolve(size_name: Option<&str>, margins: Option<Margins>) -> PageGeometry {
        PageGeometry {
            size: size_name.map(PageSize::from_name).unwrap_or_default(),
            margins: margins.unwrap_or_default(),
        }
    }

    /// Page box in points.
    pub fn page_points(&self) -> (f64, f64) {
        let (w, h) = self.size.dimensions_mm();
        (mm_to_points(w), mm_to_points(h))
    }

    /// Margins in points: (top, bottom, left, right).
    pub fn margins_points(&self) -> (f64, f64, f64, f64) {
        (
            mm_to_points(self.margins.top),
            mm_to_points(self.margins.bottom),
            mm_to_points(self.margins.left),
            mm_to_points(self.margins.right),
        )
    }

    /// Page box in twips.
    pub fn page_twips(&self) -> (i64, i64) {
        let (w, h) = self.size.dimensions_mm();
        (mm_to_twips(w), mm_to_twips(h))
    }

    /// Margins in twips: (top, bottom, left, right).
    pub fn margins_twips(&self) -> (i64, i64, i64, i64) {
        (
            mm_to_twips(self.margins.top),
            mm_to_twips(self.margins.bottom),
            mm_to_twips(self.margins.left),
            mm_to_twips(self.margins.right),
        )
    }

    /// Width available to content in points (page minus side margins).
    pub fn content_width_points(&self) -> f64 {
        let (w, _) = self.page_points();
        let (_, _, left, right) = self.margins_points();
        w - left - right
    }

    /// Width available to content in twips.
    pub fn content_width_twips(&self) -> i64 {
        let (w, _) = self.page_twips();
        let (_, _, left, right) = self.margins_twips();
        w - left - right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_names() {
        assert_eq!(PageSize::from_name("A4"), PageSize::A4);
        assert_eq!(PageSize::from_name("letter"), PageSize::Letter);
        assert_eq!(PageSize::from_name("LEGAL"), PageSize::Legal);
        // unknown names fall back instead of failing
        assert_eq!(PageSize::from_name("tabloid"), PageSize::A4);
    }

    #[test]
    fn test_a4_box() {
        let geo = PageGeometry::default();
        let (w, h) = geo.page_points();
        assert!((w - 595.28).abs() < 0.01);
        assert!((h - 841.89).abs() < 0.01);
        assert_eq!(geo.page_twips(), (11906, 16838));
    }

    #[test]
    fn test_default_margins_are_20mm() {
        let geo = PageGeometry::default();
        let (top, bottom, left, right) = geo.margins_points();
        let expected = 20.0 / 25.4 * 72.0;
        for m in [top, bottom, left, right] {
            assert!((m - expected).abs() < 1e-9);
        }
        assert_eq!(geo.margins_twips(), (1134, 1134, 1134, 1134));
    }

    #[test]
    fn test_size_change_keeps_margins() {
        let margins = Margins {
            top: 10.0,
            bottom: 15.0,
            left: 20.0,
            right: 25.0,
        };
        let a4 = PageGeometry::resolve(Some("A4"), Some(margins));
        let legal = PageGeometry::resolve(Some("legal"), Some(margins));

        assert_eq!(a4.margins_points(), legal.margins_points());
        assert_ne!(a4.page_points(), legal.page_points());
        let (_, h) = legal.page_points();
        assert!((h - 1008.0).abs() < 0.1);
    }

    #[test]
    fn test_content_width() {
        let geo = PageGeometry::default();
        let (w, _) = geo.page_points();
        let (_, _, left, right) = geo.margins_points();
        assert!((geo.content_width_points() - (w - left - right)).abs() < 1e-9);
    }

    #[test]
    fn test_margins_deserialize_partial() {
        // missing sides take the 20mm default
        let m: Margins = serde_json::from_str(r#"{"top": 5.0}"#).unwrap();
        assert_eq!(m.top, 5.0);
        assert_eq!(m.bottom, 20.0);
    }
}
