//! Builders for synthetic documents used across the test modules.
//!
//! Binary-path tests assemble WordDocument/table stream pairs (and, for the
//! container tests, whole compound files) byte by byte; OOXML tests build
//! in-memory zip packages.

use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Write a little-endian u32 into `buf` at `offset`.
pub(crate) fn le32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Write a little-endian u16 into `buf` at `offset`.
pub(crate) fn le16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

/// A zeroed WordDocument stream of `len` bytes with a valid FIB magic.
pub(crate) fn word_with_fib(len: usize) -> Vec<u8> {
    let mut word = vec![0u8; len];
    word[0] = 0xEC;
    word[1] = 0xA5;
    word
}

/// A Clx holding a single Windows-1252 piece of `cp_len` characters stored
/// at byte `file_pos` of the main stream.
pub(crate) fn clx_single_ansi(file_pos: u32, cp_len: u32) -> Vec<u8> {
    clx_with_pieces(&[(file_pos, cp_len, false)])
}

/// A Clx holding a single UCS-2 piece.
pub(crate) fn clx_single_unicode(file_pos: u32, cp_len: u32) -> Vec<u8> {
    clx_with_pieces(&[(file_pos, cp_len, true)])
}

/// A Clx for a run of pieces given as `(file_pos, cp_len, is_unicode)`.
///
/// CP boundaries are laid out contiguously from zero, matching how the
/// extractor assigns piece positions.
pub(crate) fn clx_with_pieces(pieces: &[(u32, u32, bool)]) -> Vec<u8> {
    let n = pieces.len() as u32;
    let plcpcd_len = 4 * (n + 1) + 8 * n;

    let mut clx = vec![0x02];
    clx.extend_from_slice(&plcpcd_len.to_le_bytes());

    let mut cp = 0u32;
    clx.extend_from_slice(&cp.to_le_bytes());
    for &(_, cp_len, _) in pieces {
        cp += cp_len;
        clx.extend_from_slice(&cp.to_le_bytes());
    }

    for &(file_pos, _, is_unicode) in pieces {
        let fc = if is_unicode {
            file_pos
        } else {
            (file_pos * 2) | 0x4000_0000
        };
        clx.extend_from_slice(&[0, 0]); // Pcd flags
        clx.extend_from_slice(&fc.to_le_bytes());
        clx.extend_from_slice(&[0, 0]); // prm
    }

    clx
}

/// Install a CHPX FKP page at 512-byte block `page` of the main stream,
/// holding one run `[fc_start, fc_end)` whose grpprl carries an active
/// sprmCFRMarkDel.
pub(crate) fn chpx_deletion_page(word: &mut [u8], page: u32, fc_start: u32, fc_end: u32) {
    let base = page as usize * 512;
    let block = &mut word[base..base + 512];

    le32(block, 0, fc_start);
    le32(block, 4, fc_end);
    // One run: descriptor byte sits after the crun+1 fc values
    block[8] = 0x40; // grpprl at offset 0x80
    block[0x80] = 3; // cb
    block[0x81] = 0x00; // sprm 0x0800: ispmd 0, spra 0
    block[0x82] = 0x08;
    block[0x83] = 0x01; // operand: deletion flag set
    block[511] = 1; // crun
}

/// Install a PAPX FKP page at block `page` with one run `[fc_start, fc_end)`
/// whose grpprl carries the paragraph-end SPRM.
pub(crate) fn papx_paragraph_page(word: &mut [u8], page: u32, fc_start: u32, fc_end: u32) {
    let base = page as usize * 512;
    let block = &mut word[base..base + 512];

    le32(block, 0, fc_start);
    le32(block, 4, fc_end);
    // 13-byte run entry; its first byte locates the property block
    block[8] = 0x40; // cb byte at offset 0x80
    block[0x80] = 3; // cb: grpprl+istd spans 2*3-1 = 5 bytes
    block[0x81] = 0x00; // istd
    block[0x82] = 0x00;
    block[0x83] = 0x17; // sprm 0x2417
    block[0x84] = 0x24;
    block[0x85] = 0x00; // operand
    block[511] = 1; // crun
}

/// Assemble a minimal OLE compound file holding the given root streams.
///
/// Streams are placed in FAT sectors only (the mini-stream cutoff is set to
/// zero), which keeps the layout simple: header, one FAT sector, one
/// directory sector, then the stream data.
pub(crate) fn build_compound_file(streams: &[(&str, &[u8])]) -> Vec<u8> {
    const SECTOR: usize = 512;
    const ENDOFCHAIN: u32 = 0xFFFFFFFE;
    const FREESECT: u32 = 0xFFFFFFFF;

    assert!(streams.len() <= 3, "directory sector holds four entries");

    // Sector plan: 0 = FAT, 1 = directory, 2.. = stream data
    let mut sector_of_stream = Vec::new();
    let mut next_sector = 2u32;
    for (_, data) in streams {
        let sectors = data.len().div_ceil(SECTOR).max(1) as u32;
        sector_of_stream.push((next_sector, sectors));
        next_sector += sectors;
    }
    let total_sectors = next_sector as usize;

    let mut file = vec![0u8; (total_sectors + 1) * SECTOR];

    // Header
    file[0..8].copy_from_slice(b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1");
    file[0x1A] = 3; // DLL version
    file[0x1C] = 0xFE; // byte order
    file[0x1D] = 0xFF;
    file[0x1E] = 9; // sector shift (512)
    file[0x20] = 6; // mini sector shift (64)
    le32(&mut file, 0x2C, 1); // FAT sector count
    le32(&mut file, 0x30, 1); // first directory sector
    le32(&mut file, 0x38, 0); // mini stream cutoff: nothing is mini
    le32(&mut file, 0x3C, ENDOFCHAIN); // first MiniFAT sector
    le32(&mut file, 0x40, 0); // MiniFAT sector count
    le32(&mut file, 0x44, ENDOFCHAIN); // first DIFAT sector
    le32(&mut file, 0x48, 0); // DIFAT sector count
    le32(&mut file, 0x4C, 0); // DIFAT[0]: FAT lives in sector 0
    for i in 1..109 {
        le32(&mut file, 0x4C + i * 4, FREESECT);
    }

    // FAT (sector 0)
    let fat_base = SECTOR;
    for i in 0..SECTOR / 4 {
        le32(&mut file, fat_base + i * 4, FREESECT);
    }
    le32(&mut file, fat_base, 0xFFFFFFFD); // sector 0: FAT sector marker
    le32(&mut file, fat_base + 4, ENDOFCHAIN); // sector 1: directory
    for &(start, count) in &sector_of_stream {
        for s in start..start + count {
            let next = if s == start + count - 1 {
                ENDOFCHAIN
            } else {
                s + 1
            };
            le32(&mut file, fat_base + s as usize * 4, next);
        }
    }

    // Directory (sector 1)
    let dir_base = 2 * SECTOR;
    write_dir_entry(&mut file, dir_base, "Root Entry", 5, ENDOFCHAIN, 0);
    for (i, ((name, data), &(start, _))) in
        streams.iter().zip(sector_of_stream.iter()).enumerate()
    {
        write_dir_entry(
            &mut file,
            dir_base + (i + 1) * 128,
            name,
            2,
            start,
            data.len() as u32,
        );
    }

    // Stream data
    for ((_, data), &(start, _)) in streams.iter().zip(sector_of_stream.iter()) {
        let base = (start as usize + 1) * SECTOR;
        file[base..base + data.len()].copy_from_slice(data);
    }

    file
}

fn write_dir_entry(
    file: &mut [u8],
    base: usize,
    name: &str,
    entry_type: u8,
    start_sector: u32,
    size: u32,
) {
    let utf16: Vec<u8> = name.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    file[base..base + utf16.len()].copy_from_slice(&utf16);
    le16(file, base + 64, (utf16.len() + 2) as u16);
    file[base + 66] = entry_type;
    le32(file, base + 68, 0xFFFFFFFF); // sid_left
    le32(file, base + 72, 0xFFFFFFFF); // sid_right
    le32(file, base + 76, 0xFFFFFFFF); // sid_child
    le32(file, base + 116, start_sector);
    le32(file, base + 120, size);
}

/// Build an in-memory `.docx` package from `(name, content)` parts.
pub(crate) fn build_docx(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in parts {
        zip.start_file(name.to_string(), options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
