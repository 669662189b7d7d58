//! Piece table reconstruction and CP-indexed text access.
//!
//! Word never rewrites text in place; edits append bytes to the main stream
//! and the piece table (the Clx structure in the table stream) records which
//! byte ranges, in which encoding, make up the logical character sequence.
//! Rebuilding that mapping is the heart of `.doc` extraction: every other
//! structure (FKP runs, header stories, region boundaries) addresses text by
//! character position or by file position, and both resolve through pieces.
//!
//! Each piece keeps its text as a vector of native code units — bytes for
//! Windows-1252 pieces, 16-bit units for UCS-2 pieces — so a character
//! position maps to exactly one unit regardless of what the units decode to.
//! Property passes overwrite unit windows in place; decoding to `String`
//! happens only when a CP range is sliced out.
//!
//! References:
//! - [MS-DOC] 2.4.1 Clx, 2.9.177 PlcPcd, 2.9.179 Pcd

use super::super::codepage;
use super::super::plcf::Plex;
use crate::common::binary::{read_u16_le, read_u32_le};
use crate::error::{Error, Result};

/// Set in a Pcd `fc` word when the piece is 8-bit Windows-1252 text.
const FC_COMPRESSED: u32 = 0x4000_0000;

/// Code units of one piece, stored in the piece's native width.
#[derive(Debug, Clone)]
enum PieceUnits {
    /// Windows-1252, one byte per character
    Ansi(Vec<u8>),
    /// UCS-2 little-endian, one 16-bit unit per character
    Unicode(Vec<u16>),
}

/// One contiguous run of characters in one encoding at one byte offset.
#[derive(Debug, Clone)]
pub struct Piece {
    /// First character position covered by this piece
    pub start_cp: u32,
    /// One past the last character position
    pub end_cp: u32,
    /// Byte offset of the piece's text in the main stream
    pub start_file_pos: u32,
    /// One past the last byte of the piece's text
    pub end_file_pos: u32,
    units: PieceUnits,
}

impl Piece {
    /// Bytes per character: 2 for UCS-2 pieces, 1 for Windows-1252.
    #[inline]
    pub fn bpc(&self) -> u32 {
        match self.units {
            PieceUnits::Ansi(_) => 1,
            PieceUnits::Unicode(_) => 2,
        }
    }

    /// Number of character positions covered.
    #[inline]
    pub fn cp_len(&self) -> u32 {
        self.end_cp - self.start_cp
    }

    /// Decode the whole piece.
    pub fn text(&self) -> String {
        self.slice_units(0, self.cp_len() as usize)
    }

    /// Decode the unit window `[start, end)` (indices relative to the piece).
    fn slice_units(&self, start: usize, end: usize) -> String {
        match &self.units {
            PieceUnits::Ansi(bytes) => {
                let end = end.min(bytes.len());
                let start = start.min(end);
                bytes[start..end].iter().map(|&b| codepage::decode_byte(b)).collect()
            },
            PieceUnits::Unicode(units) => {
                let end = end.min(units.len());
                let start = start.min(end);
                String::from_utf16_lossy(&units[start..end])
            },
        }
    }

    /// Overwrite the unit window `[start, end)` with an ASCII filler.
    fn fill_units(&mut self, start: usize, end: usize, ch: char) {
        debug_assert!(ch.is_ascii());
        match &mut self.units {
            PieceUnits::Ansi(bytes) => {
                let end = end.min(bytes.len());
                let start = start.min(end);
                bytes[start..end].fill(ch as u8);
            },
            PieceUnits::Unicode(units) => {
                let end = end.min(units.len());
                let start = start.min(end);
                units[start..end].fill(ch as u16);
            },
        }
    }
}

/// The ordered piece sequence for one document.
///
/// Pieces tile the CP axis contiguously from 0 to the total character count;
/// lookups clamp and clip so callers can pass region boundaries directly.
#[derive(Debug, Clone)]
pub struct PieceTable {
    pieces: Vec<Piece>,
}

impl PieceTable {
    /// Rebuild the piece table from the Clx structure.
    ///
    /// `fc_clx` is the Clx offset in the table stream; `word` is the main
    /// stream the piece byte ranges point into.
    pub fn parse(table: &[u8], fc_clx: u32, word: &[u8]) -> Result<Self> {
        let mut cursor = fc_clx as usize;

        // Skip Prc (property modifier) blocks: marker byte 0x01, u16 length
        while table.get(cursor) == Some(&0x01) {
            let len = read_u16_le(table, cursor + 1).map_err(corrupt)? as usize;
            cursor += 3 + len;
        }

        // The Pcdt marker introduces the piece descriptor table
        if table.get(cursor) != Some(&0x02) {
            return Err(Error::InvalidDocument("corrupt piece table".to_string()));
        }
        cursor += 1;

        let plcpcd_len = read_u32_le(table, cursor).map_err(corrupt)? as usize;
        cursor += 4;
        let plcpcd_end = cursor
            .checked_add(plcpcd_len)
            .filter(|&end| end <= table.len())
            .ok_or_else(|| Error::InvalidDocument("corrupt piece table".to_string()))?;

        // PlcPcd: n+1 CPs, then n 8-byte piece descriptors
        let plex = Plex::parse(&table[cursor..plcpcd_end], 8)
            .ok_or_else(|| Error::InvalidDocument("corrupt piece table".to_string()))?;

        let mut pieces = Vec::with_capacity(plex.count());
        let mut start_cp = 0u32;

        for i in 0..plex.count() {
            let (cp_start, cp_end) = plex
                .range(i)
                .ok_or_else(|| Error::InvalidDocument("corrupt piece table".to_string()))?;
            if cp_end <= cp_start {
                return Err(Error::InvalidDocument("corrupt piece table".to_string()));
            }
            let cp_len = cp_end - cp_start;

            let pcd = plex.payload(i).unwrap_or_default();
            let fc_raw = read_u32_le(pcd, 2).map_err(corrupt)?;

            // Bit 30 set: compressed Windows-1252, and the offset is doubled
            let (file_pos, bpc) = if fc_raw & FC_COMPRESSED != 0 {
                ((fc_raw & !FC_COMPRESSED) / 2, 1u32)
            } else {
                (fc_raw, 2u32)
            };

            let byte_len = bpc * cp_len;
            let start = file_pos as usize;
            let end = start
                .checked_add(byte_len as usize)
                .filter(|&end| end <= word.len())
                .ok_or_else(|| {
                    Error::InvalidDocument(format!(
                        "piece {} extends beyond main stream ({} + {} > {})",
                        i,
                        file_pos,
                        byte_len,
                        word.len()
                    ))
                })?;

            let units = if bpc == 1 {
                PieceUnits::Ansi(word[start..end].to_vec())
            } else {
                PieceUnits::Unicode(
                    word[start..end]
                        .chunks_exact(2)
                        .map(|c| u16::from_le_bytes([c[0], c[1]]))
                        .collect(),
                )
            };

            pieces.push(Piece {
                start_cp,
                end_cp: start_cp + cp_len,
                start_file_pos: file_pos,
                end_file_pos: file_pos + byte_len,
                units,
            });
            start_cp += cp_len;
        }

        Ok(Self { pieces })
    }

    /// All pieces, ordered by CP.
    #[inline]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Total number of character positions.
    pub fn total_cp(&self) -> u32 {
        self.pieces.last().map(|p| p.end_cp).unwrap_or(0)
    }

    /// Decode the text covering the CP range `[start, end)`.
    ///
    /// Out-of-range boundaries are clamped; an inverted range yields "".
    pub fn text_range(&self, start: u32, end: u32) -> String {
        if end <= start {
            return String::new();
        }

        let mut result = String::new();
        for piece in &self.pieces {
            if piece.end_cp <= start {
                continue;
            }
            if piece.start_cp >= end {
                break;
            }
            let from = start.max(piece.start_cp) - piece.start_cp;
            let to = end.min(piece.end_cp) - piece.start_cp;
            result.push_str(&piece.slice_units(from as usize, to as usize));
        }
        result
    }

    /// Overwrite the CP range `[start, end)` with `ch`, clipping per piece.
    pub fn replace_cp_range(&mut self, start: u32, end: u32, ch: char) {
        for piece in &mut self.pieces {
            if piece.end_cp <= start || piece.start_cp >= end {
                continue;
            }
            let from = start.max(piece.start_cp) - piece.start_cp;
            let to = end.min(piece.end_cp) - piece.start_cp;
            piece.fill_units(from as usize, to as usize, ch);
        }
    }

    /// Overwrite the file-position range `[start, end)` with `ch`.
    ///
    /// Byte offsets are converted to unit indices through each overlapped
    /// piece's width, so a deletion spanning mixed-encoding pieces lands on
    /// the right characters in both.
    pub fn replace_file_range(&mut self, start: u32, end: u32, ch: char) {
        for piece in &mut self.pieces {
            if piece.end_file_pos <= start || piece.start_file_pos >= end {
                continue;
            }
            let bpc = piece.bpc();
            let from = (start.max(piece.start_file_pos) - piece.start_file_pos) / bpc;
            let to = (end.min(piece.end_file_pos) - piece.start_file_pos) / bpc;
            piece.fill_units(from as usize, to as usize, ch);
        }
    }
}

fn corrupt(_: crate::common::binary::BinaryError) -> Error {
    Error::InvalidDocument("corrupt piece table".to_string())
}
