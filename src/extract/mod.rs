//! Document extraction: native document → Delta.
//!
//! Extractors are registered per file extension and dispatched by the
//! registry, so a caller holding raw bytes and a file name never touches a
//! concrete format reader.

mod docx;
mod pdf;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::delta::DeltaOp;
use crate::error::{Diagnostics, Error, Result};

/// The result of extracting one document.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The extracted operation sequence.
    pub delta: Vec<DeltaOp>,

    /// Non-fatal problems recovered during extraction.
    pub diagnostics: Diagnostics,
}

impl Extraction {
    /// The wire shape of an extraction response: `{"delta": [...]}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "delta": self.delta })
    }
}

/// Trait for native-document-to-Delta extractors.
pub trait DeltaExtractor: Send + Sync {
    /// Short format name (e.g. `"docx"`).
    fn name(&self) -> &str;

    /// Supported file extensions, lowercase without the dot.
    fn supported_extensions(&self) -> &[&str];

    /// Extract a Delta sequence from raw document bytes.
    ///
    /// Fails with [`Error::UnsupportedSourceFormat`] when the bytes cannot
    /// be opened by the underlying format reader.
    fn extract(&self, bytes: &[u8]) -> Result<Extraction>;

    /// Check if this extractor handles the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext)
    }
}

/// Registry mapping file extensions to extractors.
pub struct ExtractorRegistry {
    by_extension: HashMap<String, Arc<dyn DeltaExtractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// A registry with both built-in extractors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DocxExtractor::new()));
        registry.register(Arc::new(PdfExtractor::new()));
        registry
    }

    /// Register an extractor for all its extensions.
    pub fn register(&mut self, extractor: Arc<dyn DeltaExtractor>) {
        for ext in extractor.supported_extensions() {
            self.by_extension
                .insert(ext.to_lowercase(), extractor.clone());
        }
    }

    /// Look up an extractor by extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn DeltaExtractor>> {
        self.by_extension.get(&ext.to_lowercase()).cloned()
    }

    /// Whether an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.by_extension.contains_key(&ext.to_lowercase())
    }

    /// All supported extensions.
    pub fn supported_extensions(&self) -> Vec<&str> {
        self.by_extension.keys().map(|s| s.as_str()).collect()
    }

    /// Extract from raw bytes, routing on a file extension.
    pub fn extract_bytes(&self, bytes: &[u8], ext: &str) -> Result<Extraction> {
        let extractor = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedSourceFormat(format!(".{}", ext.to_lowercase())))?;
        extractor.extract(bytes)
    }

    /// Extract from a file on disk, routing on its extension.
    pub fn extract_path<P: AsRef<Path>>(&self, path: P) -> Result<Extraction> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                Error::UnsupportedSourceFormat(format!("{} has no extension", path.display()))
            })?;
        let bytes = std::fs::read(path)?;
        self.extract_bytes(&bytes, ext)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockExtractor;

    impl DeltaExtractor for MockExtractor {
        fn name(&self) -> &str {
            "mock"
        }

        fn supported_extensions(&self) -> &[&str] {
            &["mock", "mk"]
        }

        fn extract(&self, _bytes: &[u8]) -> Result<Extraction> {
            Ok(Extraction {
                delta: vec![DeltaOp::text("mock\n")],
                diagnostics: Diagnostics::new(),
            })
        }
    }

    #[test]
    fn test_registry_defaults() {
        let registry = ExtractorRegistry::with_defaults();
        assert!(registry.supports("docx"));
        assert!(registry.supports("DOCX"));
        assert!(registry.supports("pdf"));
        assert!(!registry.supports("txt"));
    }

    #[test]
    fn test_register_custom() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Arc::new(MockExtractor));
        assert!(registry.supports("mock"));
        assert!(registry.supports("mk"));
        let extraction = registry.extract_bytes(b"", "MK").unwrap();
        assert_eq!(extraction.delta.len(), 1);
    }

    #[test]
    fn test_unknown_extension_fails() {
        let registry = ExtractorRegistry::with_defaults();
        let err = registry.extract_bytes(b"", "txt").unwrap_err();
        assert!(matches!(err, Error::UnsupportedSourceFormat(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_path_without_extension_fails() {
        let registry = ExtractorRegistry::with_defaults();
        let err = registry.extract_path("noextension").unwrap_err();
        assert!(matches!(err, Error::UnsupportedSourceFormat(_)));
    }

    #[test]
    fn test_extraction_wire_shape() {
        let extraction = Extraction {
            delta: vec![DeltaOp::text("x")],
            diagnostics: Diagnostics::new(),
        };
        let json = extraction.to_json();
        assert_eq!(json["delta"][0]["insert"], "x");
    }
}
