//! Header/footer story normalization.
//!
//! The headers region of the CP axis is one undifferentiated run of text; the
//! PlcfHdd index in the table stream splits it into stories. Story order is
//! fixed by the format: three footnote-separator stories, three endnote
//! separator stories, then repeating groups of six (even header, odd header,
//! even footer, odd footer, first-page header, first-page footer).
//!
//! Each story's text is captured before its terminating mark — or, for
//! whitespace-only stories, the whole story — is blanked to NUL so the region
//! slicer never sees the boundary markers.

use super::fib::Fib;
use super::piece_table::PieceTable;
use crate::common::binary::read_u32_le;
use crate::error::{Error, Result};
use tracing::debug;

/// Classification of one story in the headers region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    FootnoteSeparator,
    EndSeparator,
    Header,
    Footer,
}

impl HeaderKind {
    fn for_story(story: usize) -> Self {
        match story {
            0..=2 => HeaderKind::FootnoteSeparator,
            3..=5 => HeaderKind::EndSeparator,
            s if matches!(s % 6, 0 | 1 | 4) => HeaderKind::Header,
            _ => HeaderKind::Footer,
        }
    }
}

/// One tagged sub-story of the headers region.
#[derive(Debug, Clone)]
pub struct TaggedHeader {
    pub kind: HeaderKind,
    pub text: String,
}

/// Split the headers region into tagged stories and blank their boundaries.
///
/// A document without a usable PlcfHdd (fewer than two entries) simply has no
/// tagged headers; that is not an error.
pub(crate) fn normalize_headers(
    table: &[u8],
    fib: &Fib,
    pieces: &mut PieceTable,
) -> Result<Vec<TaggedHeader>> {
    if fib.plcfhdd.lcb < 8 {
        return Ok(Vec::new());
    }

    let fc = fib.plcfhdd.fc as usize;
    let end = fc
        .checked_add(fib.plcfhdd.lcb as usize)
        .filter(|&end| end <= table.len())
        .ok_or_else(|| {
            Error::InvalidDocument("PlcfHdd extends beyond table stream".to_string())
        })?;
    let plcfhdd = &table[fc..end];
    let count = (fib.plcfhdd.lcb / 4) as usize;

    // Story CPs are relative to the start of the headers region
    let offset = fib.boundaries.ccp_text + fib.boundaries.ccp_ftn;
    let region_end = offset + fib.boundaries.ccp_hdd;

    let mut headers = Vec::with_capacity(count - 1);
    let mut start = offset + read_u32_le(plcfhdd, 0)?;

    for i in 1..count {
        let end = (offset + read_u32_le(plcfhdd, i * 4)?).min(region_end);
        let story = i - 1;
        let kind = HeaderKind::for_story(story);

        // Snapshot before the boundary mark is blanked
        let text = pieces.text_range(start, end);

        if contains_non_whitespace(&text) {
            // Keep the content, strip only the terminating mark
            if end > start {
                pieces.replace_cp_range(end - 1, end, '\0');
            }
        } else {
            pieces.replace_cp_range(start, end, '\0');
        }

        headers.push(TaggedHeader { kind, text });
        start = end;
    }

    debug!(stories = headers.len(), "normalized header stories");
    Ok(headers)
}

/// Whitespace here means CR, LF, and the control range 0x02..=0x08.
fn contains_non_whitespace(text: &str) -> bool {
    text.chars()
        .any(|c| c != '\r' && c != '\n' && !('\u{2}'..='\u{8}').contains(&c))
}
