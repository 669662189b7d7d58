//! Legacy Word (.doc) extraction.
//!
//! A `.doc` file is an OLE2 compound file whose text lives in the
//! "WordDocument" stream, indexed by structures in a companion table stream
//! ("0Table" or "1Table"). Extraction runs in fixed stages:
//!
//! 1. decode the FIB at the head of the main stream,
//! 2. rebuild the piece table mapping character positions to byte ranges,
//! 3. fold character deletions and paragraph marks into the pieces,
//! 4. split and tag the header stories,
//! 5. slice the CP axis into the document regions.

pub mod bookmarks;
pub mod extractor;
pub mod fib;
pub mod headers;
pub mod piece_table;
pub mod properties;

pub use bookmarks::Bookmark;
pub use fib::{Boundaries, Fib};
pub use headers::{HeaderKind, TaggedHeader};
pub use piece_table::{Piece, PieceTable};
