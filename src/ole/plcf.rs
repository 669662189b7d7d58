//! PLCF ("plex") parser.
//!
//! A PLCF maps positions to fixed-size payloads and appears all over the
//! legacy Word format: the piece table (PlcPcd), the FKP bin tables
//! (PlcfbteChpx / PlcfbtePapx), and the bookmark tables all share the layout
//!
//! ```text
//! n+1 little-endian u32 positions, then n payloads of `cb` bytes each
//! ```
//!
//! so `n = (len - 4) / (4 + cb)`.
//!
//! References:
//! - [MS-DOC] 2.2.1 PLC

use crate::common::binary::read_u32_le;
use bytes::Bytes;

/// A parsed plex: the position array plus the payload area.
pub struct Plex {
    positions: Vec<u32>,
    payloads: Bytes,
    cb: usize,
}

impl Plex {
    /// Parse a plex whose payload entries are `cb` bytes each.
    ///
    /// Returns `None` when the buffer cannot hold a well-formed plex.
    ///
    /// # Examples
    ///
    /// ```
    /// use longan::ole::plcf::Plex;
    ///
    /// // Two entries of 2 bytes each, positions 0 / 10 / 20
    /// let data = [
    ///     0x00, 0x00, 0x00, 0x00,
    ///     0x0A, 0x00, 0x00, 0x00,
    ///     0x14, 0x00, 0x00, 0x00,
    ///     0x01, 0x02,
    ///     0x03, 0x04,
    /// ];
    /// let plex = Plex::parse(&data, 2).unwrap();
    /// assert_eq!(plex.count(), 2);
    /// assert_eq!(plex.range(0), Some((0, 10)));
    /// assert_eq!(plex.payload(1), Some(&[0x03, 0x04][..]));
    /// ```
    pub fn parse(data: &[u8], cb: usize) -> Option<Self> {
        if cb == 0 || data.len() < 4 {
            return None;
        }

        let n = (data.len() - 4) / (4 + cb);
        let payload_start = (n + 1) * 4;
        let payload_end = payload_start + n * cb;
        if payload_end > data.len() {
            return None;
        }

        let mut positions = Vec::with_capacity(n + 1);
        for i in 0..=n {
            positions.push(read_u32_le(data, i * 4).ok()?);
        }

        Some(Self {
            positions,
            payloads: Bytes::copy_from_slice(&data[payload_start..payload_end]),
            cb,
        })
    }

    /// Number of payload entries.
    #[inline]
    pub fn count(&self) -> usize {
        if self.positions.is_empty() {
            0
        } else {
            self.positions.len() - 1
        }
    }

    /// Position value at the given index (`count() + 1` values exist).
    #[inline]
    pub fn position(&self, index: usize) -> Option<u32> {
        self.positions.get(index).copied()
    }

    /// Half-open position range covered by entry `index`.
    #[inline]
    pub fn range(&self, index: usize) -> Option<(u32, u32)> {
        Some((self.position(index)?, self.position(index + 1)?))
    }

    /// Payload bytes for entry `index`.
    #[inline]
    pub fn payload(&self, index: usize) -> Option<&[u8]> {
        if index >= self.count() {
            return None;
        }
        Some(&self.payloads[index * self.cb..(index + 1) * self.cb])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_lookup() {
        let data = [
            0x00, 0x00, 0x00, 0x00, // pos 0
            0x0A, 0x00, 0x00, 0x00, // pos 10
            0x14, 0x00, 0x00, 0x00, // pos 20
            0x01, 0x02, // payload 0
            0x03, 0x04, // payload 1
        ];
        let plex = Plex::parse(&data, 2).unwrap();
        assert_eq!(plex.count(), 2);
        assert_eq!(plex.position(2), Some(20));
        assert_eq!(plex.range(0), Some((0, 10)));
        assert_eq!(plex.range(1), Some((10, 20)));
        assert_eq!(plex.range(2), None);
        assert_eq!(plex.payload(0), Some(&[0x01, 0x02][..]));
        assert_eq!(plex.payload(2), None);
    }

    #[test]
    fn test_parse_degenerate() {
        assert!(Plex::parse(&[], 4).is_none());
        assert!(Plex::parse(&[0, 0, 0], 4).is_none());
        assert!(Plex::parse(&[0, 0, 0, 0], 0).is_none());

        // A bare 4-byte position array holds zero entries
        let plex = Plex::parse(&[0, 0, 0, 0], 8).unwrap();
        assert_eq!(plex.count(), 0);
    }
}
