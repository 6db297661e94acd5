//! Extraction planning and the final copy to disk.

use crate::config::{Collisions, Config};
use crate::directory::{preserving_position, TableDirectory};
use crate::error::{CarveError, Result};
use crate::names::NameTable;
use crate::sfnt::Signature;
use log::debug;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Characters that may not appear in a carved file name.
pub const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '\0'];

/// One font to copy out of the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionTarget {
    pub filename: String,
    pub start_offset: u64,
    pub length: u64,
}

/// Strip characters that are illegal in file names on common platforms.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c) && !c.is_ascii_control())
        .collect()
}

/// `"<family> - <subfamily>"`, or just the family.
pub fn display_name(names: &NameTable) -> Option<String> {
    let family = names.family()?;
    Some(match names.subfamily() {
        Some(sub) => format!("{family} - {sub}"),
        None => family.to_string(),
    })
}

/// Hex SHA-256 over `length` bytes at `start`, read in `block`-sized pieces.
pub fn content_digest<S: Read + Seek + ?Sized>(
    stream: &mut S,
    start: u64,
    length: u64,
    block: usize,
) -> Result<String> {
    let digest = preserving_position(stream, |s| {
        s.seek(SeekFrom::Start(start))?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; block.max(1)];
        let mut remaining = length;
        while remaining > 0 {
            let n = remaining.min(buf.len() as u64) as usize;
            s.read_exact(&mut buf[..n])?;
            hasher.update(&buf[..n]);
            remaining -= n as u64;
        }
        Ok(hasher.finalize())
    })?;
    Ok(hex::encode(digest))
}

/// Decide whether and under which name the font at `base` is carved.
pub fn plan_target<S: Read + Seek + ?Sized>(
    stream: &mut S,
    base: u64,
    directory: &TableDirectory,
    names: Option<&NameTable>,
    file_size: u64,
    config: &Config,
) -> Result<Option<ExtractionTarget>> {
    let length = directory.span();
    if length == 0 || base.checked_add(length).map_or(true, |end| end > file_size) {
        debug!("0x{base:x}: tables span {length} bytes past end of file");
        return Ok(None);
    }

    let named = names
        .and_then(display_name)
        .map(|n| sanitize_filename(&n))
        .filter(|n| !n.trim_matches(|c: char| c == '.' || c == ' ').is_empty());
    let stem = match named {
        Some(stem) => stem,
        None if config.save_unidentified => {
            content_digest(stream, base, length, config.hash_buffer_size)?
        }
        None => {
            debug!("0x{base:x}: no family name, skipping");
            return Ok(None);
        }
    };

    let ext = directory
        .header
        .signature()
        .unwrap_or(Signature::OpenType)
        .extension();
    Ok(Some(ExtractionTarget {
        filename: format!("{stem}.{ext}"),
        start_offset: base,
        length,
    }))
}

/// Give later targets a distinct name when two want the same file.
pub fn resolve_collisions(targets: &mut [ExtractionTarget], policy: Collisions) {
    if policy == Collisions::Overwrite {
        return;
    }
    let mut taken = HashSet::new();
    for target in targets.iter_mut() {
        if !taken.insert(target.filename.clone()) {
            let (stem, ext) = match target.filename.rsplit_once('.') {
                Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
                None => (target.filename.clone(), String::new()),
            };
            target.filename = format!("{stem} (0x{:x}){ext}", target.start_offset);
            taken.insert(target.filename.clone());
        }
    }
}

/// Copy the planned byte range into `out_dir`. Returns the written path.
pub fn extract_target<S: Read + Seek + ?Sized>(
    stream: &mut S,
    target: &ExtractionTarget,
    out_dir: &Path,
) -> Result<PathBuf> {
    let path = out_dir.join(&target.filename);
    let copied = preserving_position(stream, |s| {
        s.seek(SeekFrom::Start(target.start_offset))?;
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        let copied = io::copy(&mut (&mut *s).take(target.length), &mut writer)?;
        writer.flush()?;
        Ok(copied)
    });
    let fail = |source| CarveError::Extract {
        path: path.clone(),
        source,
    };
    let copied = copied.map_err(fail)?;
    if copied != target.length {
        return Err(fail(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("copied {copied} of {} bytes", target.length),
        )));
    }
    Ok(path)
}
