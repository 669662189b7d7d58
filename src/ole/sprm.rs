//! SPRM (Single Property Modifier) iteration.
//!
//! A grpprl is a packed run of SPRMs: a 16-bit opcode followed by an operand
//! whose length is encoded in the opcode's top three bits (the `spra` field).
//! Only two opcodes matter for text extraction — the deleted-run toggle and
//! the paragraph-end mark — but the iterator has to walk every SPRM to find
//! them at the right offsets.
//!
//! References:
//! - [MS-DOC] 2.2.5.1 Prl, 2.6.1 Character Properties

use crate::common::binary::read_u16_le;

/// sprmCFRMarkDel: character run carries a tracked deletion.
pub const ISPMD_FRMARK_DEL: u16 = 0x00;

/// The paragraph-end SPRM as it appears in PAPX grpprls. Matched against the
/// full 16-bit opcode, not just the property identifier.
pub const SPRM_PARAGRAPH_MARK: u16 = 0x2417;

/// One decoded SPRM: the opcode plus a view of its operand bytes.
#[derive(Debug, Clone, Copy)]
pub struct Sprm<'a> {
    /// Full 16-bit opcode
    pub code: u16,
    /// Operand bytes (for `spra == 6` this includes the length prefix)
    pub operand: &'a [u8],
}

impl<'a> Sprm<'a> {
    /// Property identifier: the low nine opcode bits.
    #[inline]
    pub fn ispmd(&self) -> u16 {
        self.code & 0x1FF
    }

    /// Operand-size selector: the top three opcode bits.
    #[inline]
    pub fn spra(&self) -> u8 {
        (self.code >> 13) as u8
    }

    /// First operand byte, if any.
    #[inline]
    pub fn operand_byte(&self) -> Option<u8> {
        self.operand.first().copied()
    }
}

/// Iterator over the SPRMs of a grpprl.
///
/// Stops at the first SPRM whose operand would run past the end of the
/// buffer; a truncated grpprl yields its well-formed prefix.
pub struct SprmIter<'a> {
    grpprl: &'a [u8],
    offset: usize,
}

impl<'a> SprmIter<'a> {
    /// Iterate the SPRMs of `grpprl` starting at `offset`.
    ///
    /// PAPX grpprls start with a two-byte stylesheet index, so their callers
    /// pass `offset = 2`; CHPX grpprls start at zero.
    pub fn new(grpprl: &'a [u8], offset: usize) -> Self {
        Self { grpprl, offset }
    }
}

impl<'a> Iterator for SprmIter<'a> {
    type Item = Sprm<'a>;

    fn next(&mut self) -> Option<Sprm<'a>> {
        if self.offset + 2 > self.grpprl.len() {
            return None;
        }

        let code = read_u16_le(self.grpprl, self.offset).ok()?;
        let operand_start = self.offset + 2;

        let operand_len = match (code >> 13) as u8 {
            0 | 1 => 1,
            2 | 4 | 5 => 2,
            3 => 4,
            6 => {
                // Length-prefixed: one count byte plus that many bytes
                let count = *self.grpprl.get(operand_start)? as usize;
                1 + count
            },
            7 => 3,
            _ => return None,
        };

        let operand_end = operand_start + operand_len;
        if operand_end > self.grpprl.len() {
            return None;
        }

        self.offset = operand_end;
        Some(Sprm {
            code,
            operand: &self.grpprl[operand_start..operand_end],
        })
    }
}
