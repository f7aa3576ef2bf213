//! Error types for rentsheet.

use std::io;
use thiserror::Error;

/// Result type alias for rentsheet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while opening or extracting a document.
///
/// Normalization never fails with this type: per-field parse failures are
/// reported through [`crate::normalize::NormalizationReport`] instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input does not start with a PDF header.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The PDF bytes could not be loaded into a document.
    #[error("Failed to open document: {0}")]
    DocumentOpen(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// A page's content stream is missing or malformed.
    #[error("Content stream error: {0}")]
    ContentStream(String),

    /// A referenced image could not be decoded.
    #[error("Failed to decode image {object}: {reason}")]
    ImageDecode {
        /// Object id of the image XObject, e.g. "12 0 R"
        object: String,
        /// Why decoding failed
        reason: String,
    },

    /// A decoded image could not be re-encoded.
    #[error("Failed to encode image: {0}")]
    ImageEncode(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The label dictionary is invalid.
    #[error("Invalid label dictionary: {0}")]
    Config(String),

    /// Error during JSON rendering.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Build an [`Error::ImageDecode`] for the given object id.
    pub fn image_decode(object: lopdf::ObjectId, reason: impl Into<String>) -> Self {
        Error::ImageDecode {
            object: format!("{} {} R", object.0, object.1),
            reason: reason.into(),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::DocumentOpen(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageEncode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_image_decode_names_object() {
        let err = Error::image_decode((12, 0), "unsupported filter JPXDecode");
        assert_eq!(
            err.to_string(),
            "Failed to decode image 12 0 R: unsupported filter JPXDecode"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
