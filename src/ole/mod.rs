//! OLE2 (compound file) container support and the legacy `.doc` extractor.

/// Constants for the compound file format
pub mod consts;

/// Compound file reader
mod file;

/// Windows-1252 piece decoding
pub mod codepage;

/// Legacy Word (.doc) extraction
pub mod doc;

/// PLCF ("plex") structures
pub mod plcf;

/// SPRM iteration
pub mod sprm;

pub use file::{OleError, OleFile, StreamEntry, is_ole_file};
