//! Error types for the laptrace library.

use std::io;
use thiserror::Error;

/// Result type alias for laptrace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting timing data.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF document is encrypted; timing sheets are published unencrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// None of the known anchor labels for a section were found on any page.
    ///
    /// Fatal for the report being built; other reports continue.
    #[error("Section not found, tried anchors: {tried:?}")]
    SectionNotFound {
        /// The anchor labels that were attempted, in order.
        tried: Vec<String>,
    },

    /// A time string did not match any admissible duration format.
    ///
    /// Malformed timing data indicates a layout mismatch, not a recoverable
    /// case; guessing would corrupt derived statistics downstream.
    #[error("Malformed duration: {0:?}")]
    MalformedDuration(String),

    /// A cross-document join key has no match.
    #[error("Key {key:?} not found in {table}")]
    KeyNotFound {
        /// The driver number or name that was looked up.
        key: String,
        /// The lookup structure that was queried.
        table: &'static str,
    },

    /// An entrant name is missing from the alias table.
    ///
    /// Intentionally strict so unmapped sponsor names are caught at
    /// extraction time instead of leaking into output.
    #[error("Unknown entrant: {0:?}")]
    UnknownEntrant(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Construct a [`Error::KeyNotFound`] for a lookup table.
    pub fn key_not_found(key: impl Into<String>, table: &'static str) -> Self {
        Error::KeyNotFound {
            key: key.into(),
            table,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
