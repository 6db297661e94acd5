//! Table directory reconstruction at a candidate offset.
//!
//! Most candidates are coincidental signature matches, so every structural
//! problem is reported as `Ok(None)`. Only genuine I/O failures are errors.

use crate::error::Result;
use crate::sfnt::{SfntHeader, TableRecord, HEADER_SIZE, TABLE_RECORD_SIZE};
use log::debug;
use std::io::{self, Read, Seek, SeekFrom};

/// Header plus records of one validated sfnt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDirectory {
    pub header: SfntHeader,
    pub records: Vec<TableRecord>,
}

impl TableDirectory {
    pub fn find(&self, tag: &[u8; 4]) -> Option<&TableRecord> {
        self.records.iter().find(|r| &r.tag == tag)
    }

    /// Smallest span from the font start covering every table.
    pub fn span(&self) -> u64 {
        self.records.iter().map(TableRecord::end).max().unwrap_or(0)
    }
}

/// Run `f` and put the stream cursor back where it was, whatever `f` did.
pub(crate) fn preserving_position<S, T, F>(stream: &mut S, f: F) -> io::Result<T>
where
    S: Seek + ?Sized,
    F: FnOnce(&mut S) -> io::Result<T>,
{
    let saved = stream.stream_position()?;
    let out = f(stream);
    stream.seek(SeekFrom::Start(saved))?;
    out
}

/// Read `buf.len()` bytes at `pos`, or `Ok(false)` if they are not all inside
/// the first `file_size` bytes of the stream.
pub(crate) fn read_at<S: Read + Seek + ?Sized>(
    stream: &mut S,
    pos: u64,
    buf: &mut [u8],
    file_size: u64,
) -> io::Result<bool> {
    match pos.checked_add(buf.len() as u64) {
        Some(end) if end <= file_size => {}
        _ => return Ok(false),
    }
    stream.seek(SeekFrom::Start(pos))?;
    match stream.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Parse and validate the sfnt header at `base`, then read its records.
pub fn read_directory<S: Read + Seek + ?Sized>(
    stream: &mut S,
    base: u64,
    file_size: u64,
) -> Result<Option<TableDirectory>> {
    let dir = preserving_position(stream, |s| {
        let mut raw = [0u8; HEADER_SIZE];
        if !read_at(s, base, &mut raw, file_size)? {
            debug!("0x{base:x}: header runs past end of file");
            return Ok(None);
        }
        let header = SfntHeader::parse(&raw);
        if !header.is_consistent() {
            debug!(
                "0x{base:x}: inconsistent header (tables={}, searchRange={}, rangeShift={})",
                header.num_tables, header.search_range, header.range_shift
            );
            return Ok(None);
        }

        let mut records = Vec::with_capacity(usize::from(header.num_tables));
        let mut pos = base + HEADER_SIZE as u64;
        for _ in 0..header.num_tables {
            let mut raw = [0u8; TABLE_RECORD_SIZE];
            if !read_at(s, pos, &mut raw, file_size)? {
                debug!("0x{base:x}: table records run past end of file");
                return Ok(None);
            }
            records.push(TableRecord::parse(&raw));
            pos += TABLE_RECORD_SIZE as u64;
        }
        Ok(Some(TableDirectory { header, records }))
    })?;
    Ok(dir)
}

/// Sum of big-endian u32 words over a table, modulo 2^32.
///
/// A short final word is right-padded with zeros. Returns `None` when the
/// table does not fit inside the file.
pub fn table_checksum<S: Read + Seek + ?Sized>(
    stream: &mut S,
    base: u64,
    record: &TableRecord,
    file_size: u64,
    buffer_size: usize,
) -> Result<Option<u32>> {
    let start = base + u64::from(record.offset);
    match start.checked_add(u64::from(record.length)) {
        Some(end) if end <= file_size => {}
        _ => return Ok(None),
    }
    let block = (buffer_size / 4).max(1) * 4;

    let sum = preserving_position(stream, |s| {
        s.seek(SeekFrom::Start(start))?;
        let mut remaining = u64::from(record.length);
        let mut buf = vec![0u8; block];
        let mut sum = 0u32;
        while remaining > 0 {
            let n = remaining.min(block as u64) as usize;
            s.read_exact(&mut buf[..n])?;
            sum = checksum_words(&buf[..n], sum);
            remaining -= n as u64;
        }
        Ok(sum)
    });
    match sum {
        Ok(sum) => Ok(Some(sum)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Accumulate `data` as big-endian words onto `sum`.
///
/// Only the last call for a table may pass a length that is not a multiple
/// of four.
pub fn checksum_words(data: &[u8], mut sum: u32) -> u32 {
    let mut words = data.chunks_exact(4);
    for word in &mut words {
        sum = sum.wrapping_add(u32::from_be_bytes([word[0], word[1], word[2], word[3]]));
    }
    let tail = words.remainder();
    if !tail.is_empty() {
        let mut padded = [0u8; 4];
        padded[..tail.len()].copy_from_slice(tail);
        sum = sum.wrapping_add(u32::from_be_bytes(padded));
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(version: &[u8; 4], tables: u16, search: u16, shift: u16) -> Vec<u8> {
        let mut out = version.to_vec();
        for v in [tables, search, 1, shift] {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out
    }

    fn record_bytes(tag: &[u8; 4], offset: u32, length: u32) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&offset.to_be_bytes());
        out.extend_from_slice(&length.to_be_bytes());
        out
    }

    fn directory_at(stream: &[u8], base: u64) -> Option<TableDirectory> {
        let mut cur = Cursor::new(stream);
        read_directory(&mut cur, base, stream.len() as u64).unwrap()
    }

    #[test]
    fn accepts_consistent_header() {
        let mut data = header_bytes(&[0, 1, 0, 0], 3, 32, 16);
        data.extend(record_bytes(b"cmap", 60, 4));
        data.extend(record_bytes(b"head", 64, 8));
        data.extend(record_bytes(b"name", 72, 10));
        let dir = directory_at(&data, 0).unwrap();
        assert_eq!(dir.records.len(), 3);
        assert_eq!(dir.span(), 82);
        assert_eq!(dir.find(b"head").map(|r| r.offset), Some(64));
        assert!(dir.find(b"glyf").is_none());
    }

    #[test]
    fn rejects_bad_range_shift() {
        let mut data = header_bytes(&[0, 1, 0, 0], 3, 32, 20);
        data.extend(vec![0u8; 48]);
        assert!(directory_at(&data, 0).is_none());
    }

    #[test]
    fn rejects_zero_tables() {
        let data = header_bytes(b"OTTO", 0, 0, 0);
        assert!(directory_at(&data, 0).is_none());
        let data = header_bytes(b"OTTO", 0, 16, 65520);
        assert!(directory_at(&data, 0).is_none());
    }

    #[test]
    fn rejects_header_past_end() {
        let data = header_bytes(b"OTTO", 1, 16, 0);
        assert!(directory_at(&data[..11], 0).is_none());
        let mut shifted = vec![0u8; 4];
        shifted.extend(header_bytes(b"OTTO", 1, 16, 16));
        assert!(directory_at(&shifted, 5).is_none());
    }

    #[test]
    fn rejects_truncated_records() {
        let mut data = header_bytes(&[0, 1, 0, 0], 3, 32, 16);
        data.extend(record_bytes(b"cmap", 60, 4));
        assert!(directory_at(&data, 0).is_none());
    }

    #[test]
    fn restores_stream_position() {
        let mut data = header_bytes(b"OTTO", 1, 16, 0);
        data.extend(record_bytes(b"name", 0, 0));
        let mut cur = Cursor::new(&data[..]);
        cur.set_position(7);
        let _ = read_directory(&mut cur, 0, data.len() as u64).unwrap();
        assert_eq!(cur.position(), 7);
    }

    #[test]
    fn checksum_pads_final_word() {
        assert_eq!(checksum_words(&[0, 0, 0, 1, 0, 0, 0, 2], 0), 3);
        assert_eq!(checksum_words(&[0x01], 0), 0x0100_0000);
        assert_eq!(checksum_words(&[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 2], 0), 1);
    }

    #[test]
    fn checksum_over_blocks() {
        let mut data = vec![0u8; 8];
        let table: Vec<u8> = (1u8..=11).collect();
        data.extend_from_slice(&table);
        let record = TableRecord {
            tag: *b"test",
            checksum: 0,
            offset: 8,
            length: table.len() as u32,
        };
        let expected = checksum_words(&table, 0);
        for buffer in [1, 4, 5, 8, 4096] {
            let mut cur = Cursor::new(&data[..]);
            let got = table_checksum(&mut cur, 0, &record, data.len() as u64, buffer).unwrap();
            assert_eq!(got, Some(expected), "buffer {buffer}");
            assert_eq!(cur.position(), 0);
        }
    }

    #[test]
    fn checksum_out_of_bounds() {
        let data = vec![0u8; 16];
        let record = TableRecord {
            tag: *b"test",
            checksum: 0,
            offset: 12,
            length: 8,
        };
        let mut cur = Cursor::new(&data[..]);
        assert_eq!(table_checksum(&mut cur, 0, &record, 16, 64).unwrap(), None);
    }
}
