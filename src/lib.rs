//! # deltadoc
//!
//! Bidirectional converter between the Delta rich-text interchange format
//! and two native document formats: the word package (`.docx`) and the
//! page-layout format (`.pdf`).
//!
//! Delta is an ordered sequence of insert operations carrying inline
//! attributes (bold, italic, underline, strike, script, font, bucketed
//! size, color, background) and block attributes (`align`, `list`) attached
//! to the newline that terminates each block. Both directions are
//! supported for both formats:
//!
//! - **extraction**: native document → Delta operation sequence
//! - **generation**: Delta operation sequence → native document
//!
//! ## Quick Start
//!
//! ```no_run
//! use deltadoc::{extract_path, generate_docx, DeltaOp, GenerateOptions};
//!
//! fn main() -> deltadoc::Result<()> {
//!     // Native document -> Delta
//!     let extraction = extract_path("report.docx")?;
//!     println!("{}", extraction.to_json());
//!
//!     // Delta -> native document
//!     let delta: Vec<DeltaOp> =
//!         serde_json::from_str(r#"[{"insert": "Hello\n"}]"#).expect("valid delta");
//!     let generated = generate_docx(&delta, &GenerateOptions::default())?;
//!     std::fs::write("out.docx", generated.bytes)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Fidelity
//!
//! The attribute set is an intentionally reduced schema: font sizes bucket
//! into small/normal/large, colors normalize to `#RRGGBB`, and native
//! features outside the schema (custom styles, images, headers/footers)
//! are not carried. Round-tripping is lossy by design.

pub mod delta;
pub mod error;
pub mod extract;
pub mod generate;
pub mod geometry;
pub mod model;
pub mod style;

// Re-export commonly used types
pub use delta::{Alignment, Attributes, DeltaOp, Insert, ListKind, TableEmbed};
pub use error::{Diagnostics, Error, Result};
pub use extract::{DeltaExtractor, DocxExtractor, Extraction, ExtractorRegistry, PdfExtractor};
pub use generate::{
    BlockAssembler, DocumentGenerator, DocxGenerator, GenerateOptions, GenerateRequest, Generated,
    ListNumbering, PdfGenerator,
};
pub use geometry::{Margins, PageGeometry, PageSize};
pub use style::{Color, RunStyle, Script, SizeBucket};

use std::path::Path;

/// Extract a Delta sequence from a document on disk; the file extension
/// selects the format.
pub fn extract_path<P: AsRef<Path>>(path: P) -> Result<Extraction> {
    ExtractorRegistry::with_defaults().extract_path(path)
}

/// Extract a Delta sequence from raw document bytes, routing on a file
/// extension (`"docx"` or `"pdf"`).
pub fn extract_bytes(bytes: &[u8], ext: &str) -> Result<Extraction> {
    ExtractorRegistry::with_defaults().extract_bytes(bytes, ext)
}

/// Generate a word package from a Delta sequence.
pub fn generate_docx(ops: &[DeltaOp], options: &GenerateOptions) -> Result<Generated> {
    DocxGenerator::new().generate(ops, options)
}

/// Generate a page-layout document from a Delta sequence.
pub fn generate_pdf(ops: &[DeltaOp], options: &GenerateOptions) -> Result<Generated> {
    PdfGenerator::new().generate(ops, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bytes_unknown_extension() {
        let err = extract_bytes(b"anything", "txt").unwrap_err();
        assert!(matches!(err, Error::UnsupportedSourceFormat(_)));
    }

    #[test]
    fn test_generate_empty_delta_fails() {
        let err = generate_docx(&[], &GenerateOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
        let err = generate_pdf(&[], &GenerateOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_generators_report_mime_types() {
        assert_eq!(
            DocxGenerator::new().mime_type(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(PdfGenerator::new().mime_type(), "application/pdf");
    }

    #[test]
    fn test_request_to_generated_document() {
        let request: GenerateRequest = serde_json::from_str(
            r#"{
                "delta": [{"insert": "Hello\n", "attributes": {"align": "center"}}],
                "page_size": "letter"
            }"#,
        )
        .unwrap();
        let generated = generate_pdf(&request.delta, &request.options()).unwrap();
        assert!(generated.bytes.starts_with(b"%PDF-"));
        assert!(generated.diagnostics.is_empty());
    }
}
