//! Legacy `.doc` extraction pipeline.
//!
//! The pipeline mirrors how the format itself is layered: open the compound
//! file, decode the FIB, rebuild the piece table, fold the two property
//! passes and the header normalizer into the pieces, then slice the CP axis
//! into regions. Everything after the container is pure buffer work — the
//! main stream and the table stream are read once and the rest is offsets.

use super::super::OleFile;
use super::bookmarks::{Bookmark, parse_bookmarks};
use super::fib::Fib;
use super::headers::{HeaderKind, TaggedHeader, normalize_headers};
use super::piece_table::PieceTable;
use super::properties::{apply_character_deletions, apply_paragraph_marks};
use crate::document::Document;
use crate::error::Result;
use crate::filters::clean_text;
use std::io::{Read, Seek};
use tracing::debug;

/// Extract a document from an OLE compound file reader.
pub(crate) fn extract<R: Read + Seek>(reader: R) -> Result<Document> {
    let mut ole = OleFile::open(reader)?;
    let word = ole.open_stream("WordDocument")?;
    let fib = Fib::parse(&word)?;
    let table = ole.open_stream(fib.table_stream_name())?;
    debug!(
        word_len = word.len(),
        table_len = table.len(),
        table_stream = fib.table_stream_name(),
        "opened document streams"
    );

    build_document(&fib, &word, &table)
}

/// Extract a document given the two raw streams.
pub(crate) fn extract_from_streams(word: &[u8], table: &[u8]) -> Result<Document> {
    let fib = Fib::parse(word)?;
    build_document(&fib, word, table)
}

fn build_document(fib: &Fib, word: &[u8], table: &[u8]) -> Result<Document> {
    let bookmarks = parse_bookmarks(table, fib)?;
    let mut pieces = PieceTable::parse(table, fib.fc_clx, word)?;
    debug!(
        pieces = pieces.pieces().len(),
        total_cp = pieces.total_cp(),
        bookmarks = bookmarks.len(),
        "rebuilt piece table"
    );

    apply_character_deletions(word, table, fib, &mut pieces)?;
    apply_paragraph_marks(word, table, fib, &mut pieces)?;
    let tagged_headers = normalize_headers(table, fib, &mut pieces)?;

    Ok(slice_regions(fib, &pieces, &tagged_headers, bookmarks))
}

/// Partition the CP axis into the seven regions and clean each slice.
fn slice_regions(
    fib: &Fib,
    pieces: &PieceTable,
    tagged_headers: &[TaggedHeader],
    bookmarks: Vec<Bookmark>,
) -> Document {
    let b = &fib.boundaries;
    let mut doc = Document {
        bookmarks,
        ..Document::default()
    };
    let mut cursor = 0u32;

    doc.body = clean_text(&pieces.text_range(cursor, cursor + b.ccp_text));
    cursor += b.ccp_text;

    if b.ccp_ftn > 0 {
        doc.footnotes = clean_text(&pieces.text_range(cursor, cursor + b.ccp_ftn - 1));
        cursor += b.ccp_ftn;
    }

    if b.ccp_hdd > 0 {
        let mut headers = String::new();
        let mut footers = String::new();
        for tagged in tagged_headers {
            match tagged.kind {
                HeaderKind::Header => headers.push_str(&tagged.text),
                HeaderKind::Footer => footers.push_str(&tagged.text),
                _ => {},
            }
        }
        doc.headers = clean_text(&headers);
        doc.footers = clean_text(&footers);
        cursor += b.ccp_hdd;
    }

    if b.ccp_atn > 0 {
        doc.annotations = clean_text(&pieces.text_range(cursor, cursor + b.ccp_atn - 1));
        cursor += b.ccp_atn;
    }

    if b.ccp_edn > 0 {
        doc.endnotes = clean_text(&pieces.text_range(cursor, cursor + b.ccp_edn - 1));
        cursor += b.ccp_edn;
    }

    if b.ccp_txbx > 0 {
        doc.textboxes = clean_text(&pieces.text_range(cursor, cursor + b.ccp_txbx - 1));
        cursor += b.ccp_txbx;
    }

    if b.ccp_hdr_txbx > 0 {
        doc.header_textboxes =
            clean_text(&pieces.text_range(cursor, cursor + b.ccp_hdr_txbx - 1));
    }

    doc
}
