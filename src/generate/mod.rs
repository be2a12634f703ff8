//! Document generation: Delta → native document.

mod assembler;
mod docx;
mod pdf;

pub use assembler::{AssemblerState, BlockAssembler, ListNumbering};
pub use docx::DocxGenerator;
pub use pdf::PdfGenerator;

use serde::Deserialize;

use crate::delta::DeltaOp;
use crate::error::{Diagnostics, Result};
use crate::geometry::{Margins, PageGeometry};

/// Options for one generation call.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Resolved page box and margins, applied to the whole document.
    pub geometry: PageGeometry,

    /// Ordered-list counter policy.
    pub numbering: ListNumbering,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_numbering(mut self, numbering: ListNumbering) -> Self {
        self.numbering = numbering;
        self
    }
}

/// The JSON body of a generation request.
///
/// Transport layers deserialize straight into this; `page_size` and
/// `margins` are optional and resolve to A4 / 20mm.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub delta: Vec<DeltaOp>,

    #[serde(default)]
    pub page_size: Option<String>,

    #[serde(default)]
    pub margins: Option<Margins>,
}

impl GenerateRequest {
    /// Resolve the request's page configuration.
    pub fn options(&self) -> GenerateOptions {
        GenerateOptions::new()
            .with_geometry(PageGeometry::resolve(self.page_size.as_deref(), self.margins))
    }
}

/// A generated document plus anything recovered along the way.
#[derive(Debug, Clone)]
pub struct Generated {
    /// The serialized document.
    pub bytes: Vec<u8>,

    /// MIME type for the bytes.
    pub mime_type: &'static str,

    /// Non-fatal problems recovered during assembly.
    pub diagnostics: Diagnostics,
}

/// Trait for Delta-to-document generators.
pub trait DocumentGenerator: Send + Sync {
    /// Short format name (e.g. `"docx"`).
    fn name(&self) -> &str;

    /// MIME type of the generated bytes.
    fn mime_type(&self) -> &'static str;

    /// Generate a document from an operation sequence.
    ///
    /// Fails with [`crate::Error::MissingInput`] on an empty sequence;
    /// attribute- and table-level problems are recovered into the result's
    /// diagnostics instead of failing.
    fn generate(&self, ops: &[DeltaOp], options: &GenerateOptions) -> Result<Generated>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PageSize;

    #[test]
    fn test_request_resolves_defaults() {
        let req: GenerateRequest =
            serde_json::from_str(r#"{"delta": [{"insert": "x\n"}]}"#).unwrap();
        let options = req.options();
        assert_eq!(options.geometry.size, PageSize::A4);
        assert_eq!(options.geometry.margins, Margins::default());
        assert_eq!(options.numbering, ListNumbering::Continuous);
    }

    #[test]
    fn test_request_resolves_page_configuration() {
        let req: GenerateRequest = serde_json::from_str(
            r#"{
                "delta": [{"insert": "x\n"}],
                "page_size": "legal",
                "margins": {"top": 10, "bottom": 10, "left": 25, "right": 25}
            }"#,
        )
        .unwrap();
        let geo = req.options().geometry;
        assert_eq!(geo.size, PageSize::Legal);
        assert_eq!(geo.margins.left, 25.0);
        assert_eq!(geo.margins.top, 10.0);
    }

    #[test]
    fn test_request_tolerates_missing_delta() {
        // Validation happens in the generator, not at deserialize time.
        let req: GenerateRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(req.delta.is_empty());
    }
}
