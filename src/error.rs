//! Unified error types for the extraction API.
//!
//! Low-level parsers return `Option` or their own narrow error types; the
//! public API surfaces everything through [`Error`].

use thiserror::Error;

use crate::common::binary::BinaryError;
use crate::ole::OleError;

/// Main error type for extraction operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is neither an OLE compound file nor an OOXML package
    #[error("unsupported file format")]
    UnsupportedFormat,

    /// The container (compound file or zip package) could not be read
    #[error("container error: {0}")]
    Container(String),

    /// The document structures inside the container are malformed
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

impl From<OleError> for Error {
    fn from(err: OleError) -> Self {
        match err {
            OleError::Io(e) => Error::Io(e),
            other => Error::Container(other.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Container(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::InvalidDocument(format!("XML error: {}", err))
    }
}

impl From<BinaryError> for Error {
    fn from(err: BinaryError) -> Self {
        Error::InvalidDocument(err.to_string())
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
