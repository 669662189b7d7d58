//! Longan - text extraction from Microsoft Word documents.
//!
//! This library reads both generations of the Word file format and returns
//! the document text partitioned into semantic regions: body, footnotes,
//! endnotes, headers, footers, annotations, and textboxes.
//!
//! - **Legacy `.doc`** (Word 97+): an OLE2 compound file. The extractor
//!   rebuilds the piece table that maps character positions onto byte ranges
//!   of the WordDocument stream, applies tracked deletions and paragraph
//!   marks from the formatted disk pages, normalizes the header stories, and
//!   slices the character axis into regions.
//! - **OOXML `.docx`**: a zip package of XML parts, walked with a streaming
//!   reader.
//!
//! # Example
//!
//! ```no_run
//! use longan::ExtractOptions;
//!
//! # fn main() -> Result<(), longan::Error> {
//! let doc = longan::extract("report.doc")?;
//! println!("{}", doc.body(&ExtractOptions::default()));
//! println!("{}", doc.headers(&ExtractOptions::default()));
//! # Ok(())
//! # }
//! ```
//!
//! # Example - extracting from memory
//!
//! ```no_run
//! # fn main() -> Result<(), longan::Error> {
//! let bytes = std::fs::read("report.docx").map_err(longan::Error::Io)?;
//! let doc = longan::extract_bytes(&bytes)?;
//! println!("{}", doc.body);
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod document;
pub mod error;
mod filters;
pub mod ole;
pub mod ooxml;

#[cfg(test)]
pub(crate) mod testutil;

pub use document::{Document, ExtractOptions};
pub use error::{Error, Result};
pub use ole::doc::{Bookmark, HeaderKind, TaggedHeader};

use common::detection::{DetectedFormat, detect_format};
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// Extract a Word document from a file path.
///
/// The container format is detected from the file signature; both `.doc`
/// and `.docx` inputs are accepted. Anything else fails with
/// [`Error::UnsupportedFormat`].
pub fn extract<P: AsRef<Path>>(path: P) -> Result<Document> {
    let file = File::open(path)?;
    extract_from_reader(file)
}

/// Extract a Word document from an in-memory byte slice.
pub fn extract_bytes(data: &[u8]) -> Result<Document> {
    extract_from_reader(Cursor::new(data))
}

/// Extract a Word document from any seekable reader.
pub fn extract_from_reader<R: Read + Seek>(mut reader: R) -> Result<Document> {
    let mut signature = [0u8; 4];
    let mut read = 0;
    while read < signature.len() {
        let n = reader.read(&mut signature[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    reader.seek(SeekFrom::Start(0))?;

    match detect_format(&signature[..read]) {
        Some(DetectedFormat::CompoundFile) => ole::doc::extractor::extract(reader),
        Some(DetectedFormat::OfficeOpenXml) => ooxml::docx::extract(reader),
        None => Err(Error::UnsupportedFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testutil::{build_compound_file, build_docx, clx_single_ansi, le32, word_with_fib};

    /// A complete synthetic `.doc`: FIB, one ANSI piece, wrapped in a
    /// compound file.
    fn build_doc_file(body: &[u8]) -> Vec<u8> {
        let mut word = word_with_fib(1024);
        word[0x200..0x200 + body.len()].copy_from_slice(body);
        le32(&mut word, 0x004C, body.len() as u32);
        word[0x0B] = 0x02; // table stream is "1Table"
        let table = clx_single_ansi(0x200, body.len() as u32);
        build_compound_file(&[("WordDocument", &word), ("1Table", &table)])
    }

    #[test]
    fn test_extract_bytes_doc() {
        let file = build_doc_file(b"Hello, world.");
        let doc = extract_bytes(&file).unwrap();
        assert_eq!(doc.body, "Hello, world.");
        assert!(doc.bookmarks().is_empty());
    }

    #[test]
    fn test_extract_bytes_uses_zero_table_stream() {
        let body = b"Zero table";
        let mut word = word_with_fib(1024);
        word[0x200..0x200 + body.len()].copy_from_slice(body);
        le32(&mut word, 0x004C, body.len() as u32);
        // fWhichTblStm clear: the table stream is named "0Table"
        let table = clx_single_ansi(0x200, body.len() as u32);
        let file = build_compound_file(&[("WordDocument", &word), ("0Table", &table)]);

        let doc = extract_bytes(&file).unwrap();
        assert_eq!(doc.body, "Zero table");
    }

    #[test]
    fn test_unsupported_format() {
        let err = extract_bytes(b"this is just plain text, not a document").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat));
    }

    #[test]
    fn test_ole_signature_without_word_streams() {
        let file = build_compound_file(&[("SomeOtherStream", b"x")]);
        let err = extract_bytes(&file).unwrap_err();
        assert!(matches!(err, Error::Container(_)));
    }

    #[test]
    fn test_doc_and_docx_agree_on_body() {
        let doc_file = build_doc_file(b"Same content here.\r");

        let docx_file = build_docx(&[
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0"?><Types><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
            ),
            (
                "word/document.xml",
                r#"<w:document><w:body><w:p><w:r><w:t>Same content here.</w:t></w:r></w:p></w:body></w:document>"#,
            ),
        ]);

        let from_doc = extract_bytes(&doc_file).unwrap();
        let from_docx = extract_bytes(&docx_file).unwrap();

        let normalize = |s: &str| {
            s.split_whitespace().collect::<Vec<_>>().join(" ")
        };
        assert_eq!(normalize(&from_doc.body), normalize(&from_docx.body));
        assert_eq!(from_doc.footnotes, from_docx.footnotes);
        assert_eq!(from_doc.endnotes, from_docx.endnotes);
        assert_eq!(from_doc.annotations, from_docx.annotations);
    }
}
