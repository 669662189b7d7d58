//! Little-endian binary readers shared by the OLE structures.
//!
//! Every on-disk structure in the legacy Word format is little-endian; these
//! helpers wrap `zerocopy` reads with bounds checking so callers can use `?`
//! instead of slicing by hand.

use zerocopy::{FromBytes, LE, U16, U32};

/// Binary parsing error type
#[derive(Debug, Clone)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    InsufficientData { expected: usize, available: usize },
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::InsufficientData {
                expected,
                available,
            } => {
                write!(
                    f,
                    "insufficient data: expected {} bytes, got {}",
                    expected, available
                )
            },
        }
    }
}

impl std::error::Error for BinaryError {}

/// Result type for binary reads
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use longan::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    let end = offset.checked_add(2).filter(|&e| e <= data.len()).ok_or(
        BinaryError::InsufficientData {
            expected: offset.saturating_add(2),
            available: data.len(),
        },
    )?;
    // The range is validated above, so the read cannot fail
    Ok(U16::<LE>::read_from_bytes(&data[offset..end])
        .map(|v| v.get())
        .unwrap_or(0))
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use longan::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    let end = offset.checked_add(4).filter(|&e| e <= data.len()).ok_or(
        BinaryError::InsufficientData {
            expected: offset.saturating_add(4),
            available: data.len(),
        },
    )?;
    Ok(U32::<LE>::read_from_bytes(&data[offset..end])
        .map(|v| v.get())
        .unwrap_or(0))
}

/// Decode UTF-16LE bytes into a String, stopping at the first NUL code unit.
///
/// Used for stream names in the compound-file directory and for bookmark
/// names in the SttbfBkmk table.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
