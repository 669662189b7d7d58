//! File Information Block (FIB) parser.
//!
//! The FIB sits at offset 0 of the WordDocument stream. Everything the
//! extractor needs is at a fixed offset: the magic word, the flag that picks
//! the table stream, the per-region character counts, and the fc/lcb pairs
//! locating structures inside the table stream.
//!
//! References:
//! - [MS-DOC] 2.5.1 Fib, 2.5.7 FibRgLw97, 2.5.8 FibRgFcLcb97

use crate::common::binary::{read_u16_le, read_u32_le};
use crate::error::{Error, Result};

/// Word 97+ magic number (wIdent)
const FIB_MAGIC: u16 = 0xA5EC;

/// fWhichTblStm: set when the table stream is "1Table"
const FLAG_WHICH_TABLE_STREAM: u16 = 0x0200;

// Fixed FIB offsets
const OFF_FLAGS: usize = 0x000A;
const OFF_FC_MIN: usize = 0x0018;
const OFF_CCP_TEXT: usize = 0x004C;
const OFF_CCP_FTN: usize = 0x0050;
const OFF_CCP_HDD: usize = 0x0054;
const OFF_CCP_ATN: usize = 0x005C;
const OFF_CCP_EDN: usize = 0x0060;
const OFF_CCP_TXBX: usize = 0x0064;
const OFF_CCP_HDR_TXBX: usize = 0x0068;
const OFF_PLCFHDD: usize = 0x00F2;
const OFF_PLCFBTE_CHPX: usize = 0x00FA;
const OFF_PLCFBTE_PAPX: usize = 0x0102;
const OFF_STTBF_BKMK: usize = 0x0142;
const OFF_PLCF_BKF: usize = 0x014A;
const OFF_PLCF_BKL: usize = 0x0152;
const OFF_FC_CLX: usize = 0x01A2;

/// Smallest FIB this parser accepts: everything up to and including fcClx.
const FIB_MIN_SIZE: usize = OFF_FC_CLX + 4;

/// An (offset, length) pair pointing into the table stream.
///
/// A zero `lcb` means the structure is not present.
#[derive(Debug, Clone, Copy, Default)]
pub struct FcLcb {
    pub fc: u32,
    pub lcb: u32,
}

impl FcLcb {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lcb == 0
    }
}

/// Character counts of the seven document regions, in CP order.
///
/// Their prefix sums partition the CP axis: body first, then footnotes,
/// headers/footers, annotations, endnotes, textboxes, header textboxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Boundaries {
    /// Byte offset of the start of the text region in the main stream
    pub fc_min: u32,
    pub ccp_text: u32,
    pub ccp_ftn: u32,
    pub ccp_hdd: u32,
    pub ccp_atn: u32,
    pub ccp_edn: u32,
    pub ccp_txbx: u32,
    pub ccp_hdr_txbx: u32,
}

impl Boundaries {
    /// Total number of character positions across all regions.
    pub fn total_cp(&self) -> u32 {
        self.ccp_text
            + self.ccp_ftn
            + self.ccp_hdd
            + self.ccp_atn
            + self.ccp_edn
            + self.ccp_txbx
            + self.ccp_hdr_txbx
    }
}

/// The decoded File Information Block.
#[derive(Debug, Clone)]
pub struct Fib {
    flags: u16,
    pub boundaries: Boundaries,
    pub fc_clx: u32,
    pub plcfhdd: FcLcb,
    pub plcfbte_chpx: FcLcb,
    pub plcfbte_papx: FcLcb,
    pub sttbf_bkmk: FcLcb,
    pub plcf_bkf: FcLcb,
    pub plcf_bkl: FcLcb,
}

impl Fib {
    /// Parse the FIB from the start of the WordDocument stream.
    pub fn parse(word: &[u8]) -> Result<Self> {
        if word.len() < FIB_MIN_SIZE {
            return Err(Error::InvalidDocument(
                "WordDocument stream too short for FIB".to_string(),
            ));
        }

        let magic = read_u16_le(word, 0)?;
        if magic != FIB_MAGIC {
            return Err(Error::InvalidDocument("bad magic".to_string()));
        }

        let flags = read_u16_le(word, OFF_FLAGS)?;

        let boundaries = Boundaries {
            fc_min: read_u32_le(word, OFF_FC_MIN)?,
            ccp_text: read_u32_le(word, OFF_CCP_TEXT)?,
            ccp_ftn: read_u32_le(word, OFF_CCP_FTN)?,
            ccp_hdd: read_u32_le(word, OFF_CCP_HDD)?,
            ccp_atn: read_u32_le(word, OFF_CCP_ATN)?,
            ccp_edn: read_u32_le(word, OFF_CCP_EDN)?,
            ccp_txbx: read_u32_le(word, OFF_CCP_TXBX)?,
            ccp_hdr_txbx: read_u32_le(word, OFF_CCP_HDR_TXBX)?,
        };

        let fc_lcb = |offset: usize| -> Result<FcLcb> {
            Ok(FcLcb {
                fc: read_u32_le(word, offset)?,
                lcb: read_u32_le(word, offset + 4)?,
            })
        };

        Ok(Self {
            flags,
            boundaries,
            fc_clx: read_u32_le(word, OFF_FC_CLX)?,
            plcfhdd: fc_lcb(OFF_PLCFHDD)?,
            plcfbte_chpx: fc_lcb(OFF_PLCFBTE_CHPX)?,
            plcfbte_papx: fc_lcb(OFF_PLCFBTE_PAPX)?,
            sttbf_bkmk: fc_lcb(OFF_STTBF_BKMK)?,
            plcf_bkf: fc_lcb(OFF_PLCF_BKF)?,
            plcf_bkl: fc_lcb(OFF_PLCF_BKL)?,
        })
    }

    /// Name of the table stream selected by the fWhichTblStm flag.
    #[inline]
    pub fn table_stream_name(&self) -> &'static str {
        if self.flags & FLAG_WHICH_TABLE_STREAM != 0 {
            "1Table"
        } else {
            "0Table"
        }
    }
}
