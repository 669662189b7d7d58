//! OLE2 compound file (structured storage) reader.
//!
//! A compound file is a miniature filesystem: a header, a sector allocation
//! table (FAT), a directory of named entries, and for small streams a
//! "ministream" with its own allocation table (MiniFAT). Word keeps its data
//! in root-level streams ("WordDocument", "0Table"/"1Table"), so this reader
//! resolves entries by name without caring about the storage hierarchy.
//!
//! References:
//! - [MS-CFB] Compound File Binary File Format

use super::consts::*;
use crate::common::binary::decode_utf16le;
use std::io::{self, Read, Seek, SeekFrom};
use thiserror::Error;
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw on-disk directory entry (128 bytes).
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawDirEntry {
    /// Entry name in UTF-16LE, null-padded
    name: [u8; 64],
    /// Length of the name in bytes, including the null terminator
    name_len: U16<LE>,
    /// Entry type (1 = storage, 2 = stream, 5 = root)
    entry_type: u8,
    /// Red-black tree node color
    color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    state_bits: U32<LE>,
    creation_time: U64<LE>,
    modified_time: U64<LE>,
    /// First sector of the entry's data
    start_sector: U32<LE>,
    /// Stream size in bytes
    stream_size: U64<LE>,
}

/// A named entry in the compound file directory.
#[derive(Debug, Clone)]
pub struct StreamEntry {
    /// Entry name (UTF-16 decoded)
    pub name: String,
    /// Entry type (`STGTY_STREAM`, `STGTY_STORAGE`, `STGTY_ROOT`)
    pub entry_type: u8,
    /// First sector of the stream data
    pub start_sector: u32,
    /// Stream size in bytes
    pub size: u64,
}

/// Error type for compound file parsing.
#[derive(Error, Debug)]
pub enum OleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("not an OLE compound file")]
    NotOle,
    #[error("corrupted compound file: {0}")]
    Corrupted(String),
    #[error("stream not found: {0}")]
    StreamNotFound(String),
}

/// An opened OLE2 compound file.
///
/// # Examples
///
/// ```no_run
/// use std::fs::File;
/// use longan::ole::OleFile;
///
/// let file = File::open("document.doc")?;
/// let mut ole = OleFile::open(file)?;
/// let word_stream = ole.open_stream("WordDocument")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct OleFile<R: Read + Seek> {
    reader: R,
    sector_size: usize,
    mini_sector_size: usize,
    mini_stream_cutoff: u32,
    /// FAT: maps a sector to the next sector in its chain
    fat: Vec<u32>,
    /// MiniFAT: same, for mini sectors inside the ministream
    minifat: Vec<u32>,
    /// All directory entries, in directory order
    entries: Vec<StreamEntry>,
    /// Ministream bytes, loaded on first small-stream read
    ministream: Option<Vec<u8>>,
}

impl<R: Read + Seek> OleFile<R> {
    /// Open and parse a compound file from a reader.
    pub fn open(mut reader: R) -> Result<Self, OleError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        if file_size < MINIMAL_OLEFILE_SIZE as u64 {
            return Err(OleError::NotOle);
        }

        let mut header = [0u8; 512];
        reader.read_exact(&mut header)?;

        if &header[0..8] != MAGIC {
            return Err(OleError::NotOle);
        }

        let byte_order = u16::from_le_bytes([header[0x1C], header[0x1D]]);
        if byte_order != 0xFFFE {
            return Err(OleError::Corrupted("invalid byte order mark".to_string()));
        }

        let sector_shift = u16::from_le_bytes([header[0x1E], header[0x1F]]);
        let mini_sector_shift = u16::from_le_bytes([header[0x20], header[0x21]]);
        let sector_size = 1usize << sector_shift;
        let mini_sector_size = 1usize << mini_sector_shift;
        if sector_size != 512 && sector_size != 4096 {
            return Err(OleError::Corrupted(format!(
                "unsupported sector size {}",
                sector_size
            )));
        }

        let first_dir_sector = u32::from_le_bytes([
            header[0x30],
            header[0x31],
            header[0x32],
            header[0x33],
        ]);
        let mini_stream_cutoff = u32::from_le_bytes([
            header[0x38],
            header[0x39],
            header[0x3A],
            header[0x3B],
        ]);
        let first_minifat_sector = u32::from_le_bytes([
            header[0x3C],
            header[0x3D],
            header[0x3E],
            header[0x3F],
        ]);
        let num_minifat_sectors = u32::from_le_bytes([
            header[0x40],
            header[0x41],
            header[0x42],
            header[0x43],
        ]);
        let first_difat_sector = u32::from_le_bytes([
            header[0x44],
            header[0x45],
            header[0x46],
            header[0x47],
        ]);

        let mut ole = OleFile {
            reader,
            sector_size,
            mini_sector_size,
            mini_stream_cutoff,
            fat: Vec::new(),
            minifat: Vec::new(),
            entries: Vec::new(),
            ministream: None,
        };

        ole.load_fat(&header, first_difat_sector)?;
        ole.load_directory(first_dir_sector)?;
        if num_minifat_sectors > 0 && first_minifat_sector != ENDOFCHAIN {
            ole.load_minifat(first_minifat_sector)?;
        }

        Ok(ole)
    }

    /// Load the FAT from the 109 header DIFAT slots plus any chained
    /// DIFAT sectors.
    fn load_fat(&mut self, header: &[u8; 512], first_difat_sector: u32) -> Result<(), OleError> {
        let mut fat_sectors = Vec::new();

        for i in 0..109 {
            let offset = 0x4C + i * 4;
            let sector = u32::from_le_bytes([
                header[offset],
                header[offset + 1],
                header[offset + 2],
                header[offset + 3],
            ]);
            if sector == FREESECT || sector == ENDOFCHAIN {
                break;
            }
            fat_sectors.push(sector);
        }

        let entries_per_difat = self.sector_size / 4 - 1;
        let mut difat_sector = first_difat_sector;
        // Bounded walk so a cyclic DIFAT chain cannot spin forever
        let mut difat_budget = 4096;
        while difat_sector != ENDOFCHAIN && difat_sector != FREESECT && difat_budget > 0 {
            difat_budget -= 1;
            let data = self.read_sector(difat_sector)?;
            for i in 0..entries_per_difat {
                let offset = i * 4;
                let sector = u32::from_le_bytes([
                    data[offset],
                    data[offset + 1],
                    data[offset + 2],
                    data[offset + 3],
                ]);
                if sector == FREESECT || sector == ENDOFCHAIN {
                    break;
                }
                fat_sectors.push(sector);
            }
            let next_offset = entries_per_difat * 4;
            difat_sector = u32::from_le_bytes([
                data[next_offset],
                data[next_offset + 1],
                data[next_offset + 2],
                data[next_offset + 3],
            ]);
        }

        let entries_per_sector = self.sector_size / 4;
        self.fat.reserve(fat_sectors.len() * entries_per_sector);
        for &sector_id in &fat_sectors {
            let data = self.read_sector(sector_id)?;
            for i in 0..entries_per_sector {
                let offset = i * 4;
                self.fat.push(u32::from_le_bytes([
                    data[offset],
                    data[offset + 1],
                    data[offset + 2],
                    data[offset + 3],
                ]));
            }
        }

        Ok(())
    }

    /// Load and decode every directory entry.
    fn load_directory(&mut self, first_dir_sector: u32) -> Result<(), OleError> {
        let dir_data = self.read_chain(first_dir_sector)?;

        for chunk in dir_data.chunks_exact(DIRENTRY_SIZE) {
            let raw = RawDirEntry::read_from_bytes(chunk)
                .map_err(|_| OleError::Corrupted("bad directory entry".to_string()))?;

            let name_len = (raw.name_len.get() as usize).saturating_sub(2).min(64);
            let name = decode_utf16le(&raw.name[..name_len]);

            // 512-byte-sector files only use the low half of the size field
            let size = if self.sector_size == 512 {
                raw.stream_size.get() & 0xFFFFFFFF
            } else {
                raw.stream_size.get()
            };

            self.entries.push(StreamEntry {
                name,
                entry_type: raw.entry_type,
                start_sector: raw.start_sector.get(),
                size,
            });
        }

        Ok(())
    }

    /// Load the MiniFAT stream.
    fn load_minifat(&mut self, first_minifat_sector: u32) -> Result<(), OleError> {
        let data = self.read_chain(first_minifat_sector)?;
        self.minifat = data
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(())
    }

    /// Read one sector. Sector 0 starts right after the 512-byte header.
    fn read_sector(&mut self, sector_id: u32) -> Result<Vec<u8>, OleError> {
        let position = (sector_id as u64 + 1) * self.sector_size as u64;
        self.reader.seek(SeekFrom::Start(position))?;
        let mut buffer = vec![0u8; self.sector_size];
        self.reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Read a full sector chain by following the FAT.
    fn read_chain(&mut self, start_sector: u32) -> Result<Vec<u8>, OleError> {
        let mut data = Vec::new();
        let mut sector = start_sector;
        // A chain longer than the FAT itself must contain a cycle
        let mut remaining = self.fat.len() + 1;

        while sector != ENDOFCHAIN {
            if sector as usize >= self.fat.len() {
                return Err(OleError::Corrupted("sector index outside FAT".to_string()));
            }
            if remaining == 0 {
                return Err(OleError::Corrupted("cyclic FAT chain".to_string()));
            }
            remaining -= 1;

            let sector_data = self.read_sector(sector)?;
            data.extend_from_slice(&sector_data);
            sector = self.fat[sector as usize];
        }

        Ok(data)
    }

    /// Read a small stream from the ministream by following the MiniFAT.
    fn read_mini_chain(&mut self, start_sector: u32, size: u64) -> Result<Vec<u8>, OleError> {
        if self.ministream.is_none() {
            let root = self
                .entries
                .iter()
                .find(|e| e.entry_type == STGTY_ROOT)
                .ok_or_else(|| OleError::Corrupted("missing root entry".to_string()))?;
            let start = root.start_sector;
            let data = self.read_chain(start)?;
            self.ministream = Some(data);
        }

        let ministream = self.ministream.as_ref().unwrap();
        let mut data = Vec::new();
        let mut sector = start_sector;
        let mut remaining = self.minifat.len() + 1;

        while sector != ENDOFCHAIN {
            if sector as usize >= self.minifat.len() {
                return Err(OleError::Corrupted(
                    "sector index outside MiniFAT".to_string(),
                ));
            }
            if remaining == 0 {
                return Err(OleError::Corrupted("cyclic MiniFAT chain".to_string()));
            }
            remaining -= 1;

            let position = sector as usize * self.mini_sector_size;
            let end = position + self.mini_sector_size;
            if end > ministream.len() {
                return Err(OleError::Corrupted(
                    "mini sector beyond ministream".to_string(),
                ));
            }
            data.extend_from_slice(&ministream[position..end]);
            sector = self.minifat[sector as usize];
        }

        data.truncate(size as usize);
        Ok(data)
    }

    /// Open a stream by name and return its contents.
    ///
    /// Lookup is case-insensitive, matching how Word resolves stream names.
    pub fn open_stream(&mut self, name: &str) -> Result<Vec<u8>, OleError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.entry_type == STGTY_STREAM && e.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| OleError::StreamNotFound(name.to_string()))?;

        if entry.size < self.mini_stream_cutoff as u64 {
            self.read_mini_chain(entry.start_sector, entry.size)
        } else {
            let mut data = self.read_chain(entry.start_sector)?;
            data.truncate(entry.size as usize);
            Ok(data)
        }
    }

    /// Check whether a stream with the given name exists.
    pub fn exists(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.entry_type == STGTY_STREAM && e.name.eq_ignore_ascii_case(name))
    }

    /// Names of all streams in the file, in directory order.
    pub fn stream_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.entry_type == STGTY_STREAM)
            .map(|e| e.name.as_str())
            .collect()
    }
}

/// Check whether the data starts with the OLE compound file signature.
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= MINIMAL_OLEFILE_SIZE && &data[0..8] == MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_compound_file;
    use std::io::Cursor;

    #[test]
    fn test_not_ole() {
        let data = vec![0u8; 2048];
        let result = OleFile::open(Cursor::new(data));
        assert!(matches!(result, Err(OleError::NotOle)));
    }

    #[test]
    fn test_too_small() {
        let mut data = MAGIC.to_vec();
        data.resize(600, 0);
        let result = OleFile::open(Cursor::new(data));
        assert!(matches!(result, Err(OleError::NotOle)));
    }

    #[test]
    fn test_open_streams() {
        let word = b"word stream bytes".to_vec();
        let table = vec![0xABu8; 700];
        let file = build_compound_file(&[("WordDocument", &word), ("1Table", &table)]);

        let mut ole = OleFile::open(Cursor::new(file)).unwrap();
        assert!(ole.exists("WordDocument"));
        assert!(ole.exists("worddocument"));
        assert!(!ole.exists("0Table"));
        assert_eq!(ole.stream_names(), vec!["WordDocument", "1Table"]);

        assert_eq!(ole.open_stream("WordDocument").unwrap(), word);
        assert_eq!(ole.open_stream("1Table").unwrap(), table);
        assert!(matches!(
            ole.open_stream("Data"),
            Err(OleError::StreamNotFound(_))
        ));
    }

    #[test]
    fn test_stream_size_is_respected() {
        // A 5-byte stream occupies a whole sector; reads must truncate
        let word = b"12345".to_vec();
        let file = build_compound_file(&[("WordDocument", &word)]);
        let mut ole = OleFile::open(Cursor::new(file)).unwrap();
        assert_eq!(ole.open_stream("WordDocument").unwrap().len(), 5);
    }
}
