//! Error types for the deltadoc library.

use std::io;
use thiserror::Error;

/// Result type alias for deltadoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during conversion.
///
/// Attribute-level failures (`InvalidColor`, `MalformedTableEmbed`) are
/// recovered per operation and recorded in [`crate::Diagnostics`]; they only
/// appear as values of this enum at the point of detection, never as the
/// outcome of a whole conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The request carried no delta operations (or no source reference).
    #[error("no input supplied: {0}")]
    MissingInput(&'static str),

    /// The source file extension is not recognized, or the format reader
    /// could not open the document at all.
    #[error("unsupported source format: {0}")]
    UnsupportedSourceFormat(String),

    /// The remote source could not be retrieved. Produced by transport
    /// layers sitting on top of this crate; defined here so the whole
    /// taxonomy lives in one place.
    #[error("failed to fetch source document: {0}")]
    SourceFetchFailed(String),

    /// A color value was not a recognized hex form.
    #[error("invalid color value: {0:?}")]
    InvalidColor(String),

    /// A table embed did not match the expected rows/columns shape.
    #[error("malformed table embed: {0}")]
    MalformedTableEmbed(String),

    /// Any other internal failure during tree assembly or serialization.
    #[error("conversion failed: {0}")]
    ConversionFailed(String),
}

impl Error {
    /// Whether the failure was caused by the request rather than the
    /// conversion itself. Callers exposing this crate over a transport map
    /// client errors to 4xx and the rest to 5xx.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::MissingInput(_)
                | Error::UnsupportedSourceFormat(_)
                | Error::SourceFetchFailed(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::ConversionFailed(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ConversionFailed(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::ConversionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConversionFailed(err.to_string())
    }
}

/// Non-fatal problems collected while converting one document.
///
/// One malformed fragment never aborts the whole document; it is recovered
/// locally and noted here so callers can surface it if they care.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    notes: Vec<String>,
}

impl Diagnostics {
    /// Create an empty diagnostics list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recovered error.
    pub fn record(&mut self, err: &Error) {
        log::warn!("recovered: {}", err);
        self.notes.push(err.to_string());
    }

    /// Record a free-form note.
    pub fn note(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::warn!("{}", msg);
        self.notes.push(msg);
    }

    /// The collected notes, in occurrence order.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Whether anything was recovered.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Merge another diagnostics list into this one.
    pub fn extend(&mut self, other: Diagnostics) {
        self.notes.extend(other.notes);
    }
}
