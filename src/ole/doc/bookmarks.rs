//! Bookmark table parsing.
//!
//! Bookmark names live in the SttbfBkmk string table; their CP ranges come
//! from the parallel PlcfBkf (starts) and PlcfBkl (ends) arrays. Nothing in
//! text extraction consumes them, but they are part of the document model
//! and cheap to carry.
//!
//! References:
//! - [MS-DOC] 2.9.258 SttbfBkmk

use super::fib::Fib;
use crate::common::binary::{read_u16_le, read_u32_le};
use crate::error::{Error, Result};

/// A named bookmark with its CP range.
#[derive(Debug, Clone)]
pub struct Bookmark {
    pub name: String,
    pub start_cp: u32,
    pub end_cp: u32,
}

/// Parse the bookmark tables. A document without bookmarks yields an empty
/// list.
pub(crate) fn parse_bookmarks(table: &[u8], fib: &Fib) -> Result<Vec<Bookmark>> {
    if fib.sttbf_bkmk.is_empty() {
        return Ok(Vec::new());
    }

    let slice_for = |name: &str, fc: u32, lcb: u32| -> Result<&[u8]> {
        let start = fc as usize;
        let end = start
            .checked_add(lcb as usize)
            .filter(|&end| end <= table.len())
            .ok_or_else(|| {
                Error::InvalidDocument(format!("{} extends beyond table stream", name))
            })?;
        Ok(&table[start..end])
    };

    let sttb = slice_for("SttbfBkmk", fib.sttbf_bkmk.fc, fib.sttbf_bkmk.lcb)?;
    let bkf = slice_for("PlcfBkf", fib.plcf_bkf.fc, fib.plcf_bkf.lcb)?;
    let bkl = slice_for("PlcfBkl", fib.plcf_bkl.fc, fib.plcf_bkl.lcb)?;

    // fExtend: the name table must hold 16-bit characters
    if read_u16_le(sttb, 0)? != 0xFFFF {
        return Err(Error::InvalidDocument(
            "unexpected single-byte bookmark table".to_string(),
        ));
    }

    let mut bookmarks = Vec::new();
    let mut offset = 6usize;
    let mut index = 0usize;

    while offset + 2 <= sttb.len() {
        let char_count = read_u16_le(sttb, offset)? as usize;
        let byte_len = char_count * 2;
        if offset + 2 + byte_len > sttb.len() {
            break;
        }

        let name_bytes = &sttb[offset + 2..offset + 2 + byte_len];
        let name: String = String::from_utf16_lossy(
            &name_bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect::<Vec<_>>(),
        );

        let (Ok(start_cp), Ok(end_cp)) =
            (read_u32_le(bkf, index * 4), read_u32_le(bkl, index * 4))
        else {
            break;
        };

        bookmarks.push(Bookmark {
            name,
            start_cp,
            end_cp,
        });

        offset += 2 + byte_len;
        index += 1;
    }

    Ok(bookmarks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::doc::fib::Fib;
    use crate::testutil::{le32, word_with_fib};

    fn utf16_bytes(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    fn doc_with_bookmarks(names: &[(&str, u32, u32)]) -> (Vec<u8>, Vec<u8>) {
        let mut sttb = vec![0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00];
        for (name, _, _) in names {
            let encoded = utf16_bytes(name);
            sttb.extend_from_slice(&(name.encode_utf16().count() as u16).to_le_bytes());
            sttb.extend_from_slice(&encoded);
        }
        let mut bkf = Vec::new();
        let mut bkl = Vec::new();
        for (_, start, end) in names {
            bkf.extend_from_slice(&start.to_le_bytes());
            bkl.extend_from_slice(&end.to_le_bytes());
        }

        let mut table = sttb.clone();
        let bkf_off = table.len() as u32;
        table.extend_from_slice(&bkf);
        let bkl_off = table.len() as u32;
        table.extend_from_slice(&bkl);

        let mut word = word_with_fib(1024);
        le32(&mut word, 0x0142, 0); // fcSttbfBkmk
        le32(&mut word, 0x0146, sttb.len() as u32);
        le32(&mut word, 0x014A, bkf_off);
        le32(&mut word, 0x014E, bkf.len() as u32);
        le32(&mut word, 0x0152, bkl_off);
        le32(&mut word, 0x0156, bkl.len() as u32);
        (word, table)
    }

    #[test]
    fn test_no_bookmarks() {
        let word = word_with_fib(1024);
        let fib = Fib::parse(&word).unwrap();
        assert!(parse_bookmarks(&[], &fib).unwrap().is_empty());
    }

    #[test]
    fn test_parse_named_bookmarks() {
        let (word, table) = doc_with_bookmarks(&[("intro", 0, 5), ("conclusion", 40, 60)]);
        let fib = Fib::parse(&word).unwrap();
        let bookmarks = parse_bookmarks(&table, &fib).unwrap();

        assert_eq!(bookmarks.len(), 2);
        assert_eq!(bookmarks[0].name, "intro");
        assert_eq!(bookmarks[0].start_cp, 0);
        assert_eq!(bookmarks[0].end_cp, 5);
        assert_eq!(bookmarks[1].name, "conclusion");
        assert_eq!(bookmarks[1].start_cp, 40);
        assert_eq!(bookmarks[1].end_cp, 60);
    }

    #[test]
    fn test_single_byte_table_rejected() {
        let (word, mut table) = doc_with_bookmarks(&[("a", 0, 1)]);
        table[0] = 0x00;
        table[1] = 0x00;
        let fib = Fib::parse(&word).unwrap();
        assert!(parse_bookmarks(&table, &fib).is_err());
    }
}
