//! Binary layout of the sfnt container pieces this crate reads.
//!
//! All multi-byte fields are big endian. Parsers take exactly-sized byte
//! arrays so callers decide how the bytes were obtained.

use serde::Serialize;
use std::fmt;

/// Width of every recognised signature in bytes.
pub const SIGNATURE_LEN: usize = 4;
/// `version`, `numTables`, `searchRange`, `entrySelector`, `rangeShift`.
pub const HEADER_SIZE: usize = 12;
/// `tag`, `checksum`, `offset`, `length`.
pub const TABLE_RECORD_SIZE: usize = 16;
/// `format`, `count`, `stringOffset`.
pub const NAME_HEADER_SIZE: usize = 6;
/// Six u16 fields.
pub const NAME_RECORD_SIZE: usize = 12;

/// Name id of the font family string.
pub const NAME_ID_FAMILY: u16 = 1;
/// Name id of the font subfamily string.
pub const NAME_ID_SUBFAMILY: u16 = 2;

/// Tag of the naming table.
pub const NAME_TAG: [u8; 4] = *b"name";

/// Magic values that may open an sfnt container or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Signature {
    /// `00 01 00 00`
    TrueType,
    /// `true`, used by Apple TrueType fonts.
    AppleTrue,
    /// `typ1`, PostScript outlines wrapped in an sfnt.
    Type1,
    /// `OTTO`, CFF based OpenType.
    OpenType,
    /// `tccf`, a font collection header.
    Collection,
}

/// Every signature together with its bytes, in match priority order.
pub static SIGNATURES: [(Signature, [u8; SIGNATURE_LEN]); 5] = [
    (Signature::TrueType, [0x00, 0x01, 0x00, 0x00]),
    (Signature::AppleTrue, *b"true"),
    (Signature::Type1, *b"typ1"),
    (Signature::OpenType, *b"OTTO"),
    (Signature::Collection, *b"tccf"),
];

impl Signature {
    /// Match a 4-byte window against the known signatures.
    pub fn from_bytes(window: &[u8]) -> Option<Self> {
        SIGNATURES
            .iter()
            .find(|(_, magic)| magic[..] == *window)
            .map(|(sig, _)| *sig)
    }

    /// Raw magic bytes.
    pub fn bytes(self) -> [u8; SIGNATURE_LEN] {
        SIGNATURES
            .iter()
            .find(|(sig, _)| *sig == self)
            .map(|(_, magic)| *magic)
            .unwrap_or_default()
    }

    /// Collections are detected but never carved.
    pub fn is_collection(self) -> bool {
        self == Signature::Collection
    }

    /// TrueType flavoured version tags get a `.ttf` extension.
    pub fn is_truetype(self) -> bool {
        matches!(
            self,
            Signature::TrueType | Signature::AppleTrue | Signature::Type1
        )
    }

    /// File extension used for a carved font with this version tag.
    pub fn extension(self) -> &'static str {
        if self.is_truetype() {
            "ttf"
        } else {
            "otf"
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&tag_to_string(&self.bytes()))
    }
}

/// Render a 4-byte tag, escaping non printable bytes.
pub fn tag_to_string(tag: &[u8; 4]) -> String {
    if tag.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        tag.iter().map(|&b| b as char).collect()
    } else {
        format!("0x{}", hex::encode(tag))
    }
}

/// The offset table at the start of every sfnt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SfntHeader {
    #[serde(serialize_with = "serialize_tag")]
    pub version: [u8; 4],
    pub num_tables: u16,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl SfntHeader {
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            version: [bytes[0], bytes[1], bytes[2], bytes[3]],
            num_tables: be_u16(bytes, 4),
            search_range: be_u16(bytes, 6),
            entry_selector: be_u16(bytes, 8),
            range_shift: be_u16(bytes, 10),
        }
    }

    /// Check the binary search metadata OpenType mandates.
    ///
    /// A coincidental signature match almost never satisfies
    /// `rangeShift == numTables * 16 - searchRange`.
    pub fn is_consistent(&self) -> bool {
        if self.num_tables == 0 || self.search_range == 0 || self.range_shift == 0 {
            return false;
        }
        let expected = i64::from(self.num_tables) * 16 - i64::from(self.search_range);
        i64::from(self.range_shift) == expected
    }

    pub fn signature(&self) -> Option<Signature> {
        Signature::from_bytes(&self.version)
    }

    /// Bytes occupied by the header plus its table records.
    pub fn directory_len(&self) -> u64 {
        HEADER_SIZE as u64 + TABLE_RECORD_SIZE as u64 * u64::from(self.num_tables)
    }
}

/// One table directory entry. `offset` is relative to the font start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableRecord {
    #[serde(serialize_with = "serialize_tag")]
    pub tag: [u8; 4],
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

impl TableRecord {
    pub fn parse(bytes: &[u8; TABLE_RECORD_SIZE]) -> Self {
        Self {
            tag: [bytes[0], bytes[1], bytes[2], bytes[3]],
            checksum: be_u32(bytes, 4),
            offset: be_u32(bytes, 8),
            length: be_u32(bytes, 12),
        }
    }

    /// First byte past the table, relative to the font start.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NameTableHeader {
    pub format: u16,
    pub count: u16,
    /// Start of string storage, relative to the `name` table.
    pub storage_offset: u16,
}

impl NameTableHeader {
    pub fn parse(bytes: &[u8; NAME_HEADER_SIZE]) -> Self {
        Self {
            format: be_u16(bytes, 0),
            count: be_u16(bytes, 2),
            storage_offset: be_u16(bytes, 4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub length: u16,
    /// Relative to the string storage.
    pub offset: u16,
}

impl NameRecord {
    pub fn parse(bytes: &[u8; NAME_RECORD_SIZE]) -> Self {
        Self {
            platform_id: be_u16(bytes, 0),
            encoding_id: be_u16(bytes, 2),
            language_id: be_u16(bytes, 4),
            name_id: be_u16(bytes, 6),
            length: be_u16(bytes, 8),
            offset: be_u16(bytes, 10),
        }
    }
}

fn be_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

fn be_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn serialize_tag<S: serde::Serializer>(tag: &[u8; 4], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&tag_to_string(tag))
}
