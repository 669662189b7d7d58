//! FKP walking: character-property and paragraph-property passes.
//!
//! Formatting lives in 512-byte FKP pages inside the main stream, located
//! through a bin table (PlcfbteChpx / PlcfbtePapx) in the table stream. Each
//! page carries `crun` runs delimited by file positions, and each run may
//! point at a grpprl. Extraction cares about exactly two properties:
//!
//! - sprmCFRMarkDel in a CHPX grpprl marks a run as a tracked deletion; its
//!   text is blanked to NUL so the cleaning pass drops it.
//! - the paragraph-end SPRM in a PAPX grpprl turns the run's terminating
//!   marks into newlines in the extracted text.
//!
//! References:
//! - [MS-DOC] 2.9.32 ChpxFkp, 2.9.175 PapxFkp

use super::super::plcf::Plex;
use super::super::sprm::{ISPMD_FRMARK_DEL, SPRM_PARAGRAPH_MARK, SprmIter};
use super::fib::{FcLcb, Fib};
use super::piece_table::PieceTable;
use crate::common::binary::read_u32_le;
use crate::error::{Error, Result};
use tracing::debug;

/// Size of an FKP page in bytes
const FKP_PAGE_SIZE: usize = 512;

/// Collect the FKP page numbers referenced by a bin table.
fn fkp_pages(table: &[u8], index: FcLcb) -> Result<Vec<u32>> {
    let fc = index.fc as usize;
    let end = fc
        .checked_add(index.lcb as usize)
        .filter(|&end| end <= table.len())
        .ok_or_else(|| {
            Error::InvalidDocument("bin table extends beyond table stream".to_string())
        })?;

    let plex = Plex::parse(&table[fc..end], 4)
        .ok_or_else(|| Error::InvalidDocument("corrupt bin table".to_string()))?;

    let mut pages = Vec::with_capacity(plex.count());
    for i in 0..plex.count() {
        let payload = plex.payload(i).unwrap_or_default();
        pages.push(read_u32_le(payload, 0)?);
    }
    Ok(pages)
}

/// Fetch one 512-byte FKP page out of the main stream.
fn fkp_page(word: &[u8], page: u32) -> Result<&[u8]> {
    let start = (page as usize)
        .checked_mul(FKP_PAGE_SIZE)
        .ok_or_else(|| Error::InvalidDocument("FKP page number overflow".to_string()))?;
    let end = start + FKP_PAGE_SIZE;
    if end > word.len() {
        return Err(Error::InvalidDocument(format!(
            "FKP page {} beyond main stream",
            page
        )));
    }
    Ok(&word[start..end])
}

/// Apply tracked-deletion CHPX runs: blank each deleted run to NUL.
pub(crate) fn apply_character_deletions(
    word: &[u8],
    table: &[u8],
    fib: &Fib,
    pieces: &mut PieceTable,
) -> Result<()> {
    if fib.plcfbte_chpx.is_empty() {
        return Ok(());
    }

    let pages = fkp_pages(table, fib.plcfbte_chpx)?;
    debug!(pages = pages.len(), "walking CHPX formatted disk pages");

    // Runs deleted back-to-back are extended from the previous end so a
    // deletion split across runs stays one contiguous blanked range.
    let mut last_deletion_end = 0u32;

    for page_no in pages {
        let page = fkp_page(word, page_no)?;
        let crun = page[FKP_PAGE_SIZE - 1] as usize;

        for run in 0..crun {
            let fc = read_u32_le(page, run * 4)?;
            let fc_next = read_u32_le(page, (run + 1) * 4)?;

            let descriptor = *page
                .get((crun + 1) * 4 + run)
                .ok_or_else(|| Error::InvalidDocument("CHPX run index out of page".to_string()))?;
            if descriptor == 0 {
                continue;
            }

            let chpx_offset = descriptor as usize * 2;
            let cb = *page
                .get(chpx_offset)
                .ok_or_else(|| Error::InvalidDocument("CHPX offset out of page".to_string()))?
                as usize;
            let grpprl_end = chpx_offset + 1 + cb;
            if grpprl_end > FKP_PAGE_SIZE {
                return Err(Error::InvalidDocument(
                    "CHPX grpprl beyond page boundary".to_string(),
                ));
            }
            let grpprl = &page[chpx_offset + 1..grpprl_end];

            for sprm in SprmIter::new(grpprl, 0) {
                if sprm.ispmd() != ISPMD_FRMARK_DEL {
                    continue;
                }
                if sprm.operand_byte().unwrap_or(0) & 1 != 1 {
                    continue;
                }

                let start = if last_deletion_end == fc {
                    last_deletion_end
                } else {
                    fc
                };
                pieces.replace_file_range(start, fc_next, '\0');
                last_deletion_end = fc_next;
            }
        }
    }

    Ok(())
}

/// Apply paragraph-end PAPX runs: rewrite each run's marks as newlines.
pub(crate) fn apply_paragraph_marks(
    word: &[u8],
    table: &[u8],
    fib: &Fib,
    pieces: &mut PieceTable,
) -> Result<()> {
    if fib.plcfbte_papx.is_empty() {
        return Ok(());
    }

    let pages = fkp_pages(table, fib.plcfbte_papx)?;
    debug!(pages = pages.len(), "walking PAPX formatted disk pages");

    for page_no in pages {
        let page = fkp_page(word, page_no)?;
        let crun = page[FKP_PAGE_SIZE - 1] as usize;

        for run in 0..crun {
            let fc = read_u32_le(page, run * 4)?;
            let fc_next = read_u32_le(page, (run + 1) * 4)?;

            // PAPX run descriptors are 13 bytes; the first byte locates the
            // property block
            let entry_offset = (crun + 1) * 4 + run * 13;
            let cb_offset = *page
                .get(entry_offset)
                .ok_or_else(|| Error::InvalidDocument("PAPX run index out of page".to_string()))?
                as usize
                * 2;

            let cb = *page
                .get(cb_offset)
                .ok_or_else(|| Error::InvalidDocument("PAPX offset out of page".to_string()))?
                as usize;

            // Two layouts: a non-zero cb spans 2*cb-1 bytes after itself; a
            // zero cb defers to a second count byte spanning 2*cb2 bytes
            let (grpprl_start, grpprl_len) = if cb != 0 {
                (cb_offset + 1, 2 * cb - 1)
            } else {
                let cb2 = *page.get(cb_offset + 1).ok_or_else(|| {
                    Error::InvalidDocument("PAPX offset out of page".to_string())
                })? as usize;
                (cb_offset + 2, 2 * cb2)
            };

            let grpprl_end = grpprl_start + grpprl_len;
            if grpprl_end > FKP_PAGE_SIZE {
                return Err(Error::InvalidDocument(
                    "PAPX grpprl beyond page boundary".to_string(),
                ));
            }
            let grpprl_and_istd = &page[grpprl_start..grpprl_end];

            // Skip the leading stylesheet-index word
            for sprm in SprmIter::new(grpprl_and_istd, 2) {
                if sprm.code == SPRM_PARAGRAPH_MARK {
                    pieces.replace_file_range(fc, fc_next, '\n');
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::doc::fib::Fib;
    use crate::testutil::{
        chpx_deletion_page, clx_single_ansi, le32, papx_paragraph_page, word_with_fib,
    };

    /// Word stream with text at 0x200 and one FKP page at block 2.
    fn doc_with_chpx(text: &[u8], del_start: u32, del_end: u32) -> (Vec<u8>, Vec<u8>) {
        let mut word = word_with_fib(3 * 512);
        word[0x200..0x200 + text.len()].copy_from_slice(text);
        chpx_deletion_page(&mut word, 2, del_start, del_end);
        le32(&mut word, 0x00FA, 0x40); // fcPlcfbteChpx
        le32(&mut word, 0x00FE, 12); // lcbPlcfbteChpx

        let mut table = clx_single_ansi(0x200, text.len() as u32);
        table.resize(0x40, 0);
        // Bin table: one entry pointing at FKP page 2
        le32_push(&mut table, 0);
        le32_push(&mut table, 0x7FFF_FFFF);
        le32_push(&mut table, 2);
        (word, table)
    }

    fn le32_push(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    #[test]
    fn test_tracked_deletion_blanks_run() {
        let text = b"Hello cruel world";
        // " cruel" occupies file bytes 0x205..0x20B
        let (word, table) = doc_with_chpx(text, 0x205, 0x20B);
        let fib = Fib::parse(&word).unwrap();
        let mut pieces = PieceTable::parse(&table, 0, &word).unwrap();

        apply_character_deletions(&word, &table, &fib, &mut pieces).unwrap();

        assert_eq!(pieces.text_range(0, 17), "Hello\0\0\0\0\0\0 world");
    }

    #[test]
    fn test_deletion_pass_is_idempotent() {
        let text = b"Hello cruel world";
        let (word, table) = doc_with_chpx(text, 0x205, 0x20B);
        let fib = Fib::parse(&word).unwrap();
        let mut pieces = PieceTable::parse(&table, 0, &word).unwrap();

        apply_character_deletions(&word, &table, &fib, &mut pieces).unwrap();
        let once = pieces.text_range(0, 17);
        apply_character_deletions(&word, &table, &fib, &mut pieces).unwrap();
        assert_eq!(pieces.text_range(0, 17), once);
    }

    #[test]
    fn test_missing_bin_table_is_skipped() {
        let mut word = word_with_fib(1024);
        word[0x200..0x203].copy_from_slice(b"abc");
        let table = clx_single_ansi(0x200, 3);
        let fib = Fib::parse(&word).unwrap();
        let mut pieces = PieceTable::parse(&table, 0, &word).unwrap();

        apply_character_deletions(&word, &table, &fib, &mut pieces).unwrap();
        apply_paragraph_marks(&word, &table, &fib, &mut pieces).unwrap();
        assert_eq!(pieces.text_range(0, 3), "abc");
    }

    #[test]
    fn test_bin_table_beyond_stream_fails() {
        let mut word = word_with_fib(1024);
        le32(&mut word, 0x00FA, 0x4000); // fc far outside the table stream
        le32(&mut word, 0x00FE, 12);
        let table = clx_single_ansi(0x200, 1);
        word[0x200] = b'x';
        let fib = Fib::parse(&word).unwrap();
        let mut pieces = PieceTable::parse(&table, 0, &word).unwrap();

        assert!(apply_character_deletions(&word, &table, &fib, &mut pieces).is_err());
    }

    #[test]
    fn test_paragraph_mark_becomes_newline() {
        let text = b"First par\rSecond";
        let mut word = word_with_fib(3 * 512);
        word[0x200..0x200 + text.len()].copy_from_slice(text);
        // The run covering the paragraph mark byte at 0x209
        papx_paragraph_page(&mut word, 2, 0x209, 0x20A);
        le32(&mut word, 0x0102, 0x40); // fcPlcfbtePapx
        le32(&mut word, 0x0106, 12); // lcbPlcfbtePapx

        let mut table = clx_single_ansi(0x200, text.len() as u32);
        table.resize(0x40, 0);
        le32_push(&mut table, 0);
        le32_push(&mut table, 0x7FFF_FFFF);
        le32_push(&mut table, 2);

        let fib = Fib::parse(&word).unwrap();
        let mut pieces = PieceTable::parse(&table, 0, &word).unwrap();
        apply_paragraph_marks(&word, &table, &fib, &mut pieces).unwrap();

        assert_eq!(pieces.text_range(0, 16), "First par\nSecond");
    }
}
