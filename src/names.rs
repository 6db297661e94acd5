//! Decoding of the `name` table.
//!
//! Only strings that decode as UTF-8 are harvested. Anything else (legacy
//! Macintosh encodings, broken offsets) is skipped record by record.

use crate::directory::{preserving_position, read_at};
use crate::error::Result;
use crate::sfnt::{
    NameRecord, NameTableHeader, TableRecord, NAME_HEADER_SIZE, NAME_ID_FAMILY,
    NAME_ID_SUBFAMILY, NAME_RECORD_SIZE,
};
use log::trace;
use std::collections::BTreeMap;
use std::io::{Read, Seek};

/// Decoded naming table of one font.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameTable {
    pub header: Option<NameTableHeader>,
    /// Every record that could be read, in table order.
    pub records: Vec<NameRecord>,
    /// First successfully decoded string per name id.
    pub strings: BTreeMap<u16, String>,
}

impl NameTable {
    pub fn get(&self, name_id: u16) -> Option<&str> {
        self.strings.get(&name_id).map(String::as_str)
    }

    pub fn family(&self) -> Option<&str> {
        self.get(NAME_ID_FAMILY)
    }

    pub fn subfamily(&self) -> Option<&str> {
        self.get(NAME_ID_SUBFAMILY)
    }
}

/// Decode the `name` table described by `table` of the font at `base`.
///
/// Returns `None` when the table header itself lies outside the file. The
/// stream position is left unchanged.
pub fn decode_names<S: Read + Seek + ?Sized>(
    stream: &mut S,
    base: u64,
    table: &TableRecord,
    file_size: u64,
) -> Result<Option<NameTable>> {
    let table_start = base + u64::from(table.offset);
    let names = preserving_position(stream, |s| {
        let mut raw = [0u8; NAME_HEADER_SIZE];
        if !read_at(s, table_start, &mut raw, file_size)? {
            trace!("0x{base:x}: name table header outside file");
            return Ok(None);
        }
        let header = NameTableHeader::parse(&raw);
        let storage = table_start + u64::from(header.storage_offset);

        let mut names = NameTable {
            header: Some(header),
            ..NameTable::default()
        };
        let mut pos = table_start + NAME_HEADER_SIZE as u64;
        for _ in 0..header.count {
            let mut raw = [0u8; NAME_RECORD_SIZE];
            if !read_at(s, pos, &mut raw, file_size)? {
                trace!("0x{base:x}: name records truncated");
                break;
            }
            pos += NAME_RECORD_SIZE as u64;
            let record = NameRecord::parse(&raw);
            names.records.push(record);

            if names.strings.contains_key(&record.name_id) {
                continue;
            }
            let mut value = vec![0u8; usize::from(record.length)];
            if !read_at(s, storage + u64::from(record.offset), &mut value, file_size)? {
                trace!("0x{base:x}: name id {} string outside file", record.name_id);
                continue;
            }
            match String::from_utf8(value) {
                Ok(text) => {
                    names.strings.insert(record.name_id, text);
                }
                Err(_) => trace!("0x{base:x}: name id {} is not UTF-8", record.name_id),
            }
        }
        Ok(Some(names))
    })?;
    Ok(names)
}
