#![allow(dead_code)]
//! Synthetic sfnt builder shared by the integration tests.

use sfntcarve::checksum_words;

pub const TRUETYPE: [u8; 4] = [0x00, 0x01, 0x00, 0x00];
pub const OPENTYPE: [u8; 4] = *b"OTTO";

/// Encode a `name` table holding `(name_id, raw bytes)` entries on the
/// Macintosh platform.
pub fn name_table(entries: &[(u16, &[u8])]) -> Vec<u8> {
    let storage = 6 + 12 * entries.len();
    let mut out = Vec::new();
    for v in [0u16, entries.len() as u16, storage as u16] {
        out.extend_from_slice(&v.to_be_bytes());
    }
    let mut strings = Vec::new();
    for (id, value) in entries {
        for v in [1u16, 0, 0, *id, value.len() as u16, strings.len() as u16] {
            out.extend_from_slice(&v.to_be_bytes());
        }
        strings.extend_from_slice(value);
    }
    out.extend(strings);
    out
}

/// Assemble an sfnt from `tables`. The result ends exactly at the end of the
/// last table, so it is the span a carver should copy.
pub fn sfnt(version: [u8; 4], tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let n = tables.len() as u16;
    let mut pow = 1u16;
    while pow * 2 <= n {
        pow *= 2;
    }
    let search_range = pow * 16;
    let entry_selector = pow.trailing_zeros() as u16;
    let range_shift = n * 16 - search_range;

    let mut out = version.to_vec();
    for v in [n, search_range, entry_selector, range_shift] {
        out.extend_from_slice(&v.to_be_bytes());
    }

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (i, (tag, data)) in tables.iter().enumerate() {
        out.extend_from_slice(tag);
        out.extend_from_slice(&checksum_words(data, 0).to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        body.extend_from_slice(data);
        offset += data.len();
        if i + 1 < tables.len() {
            while body.len() % 4 != 0 {
                body.push(0);
                offset += 1;
            }
        }
    }
    out.extend(body);
    out
}

/// Three-table font named `family` / `subfamily`.
pub fn named_font(version: [u8; 4], family: &str, subfamily: Option<&str>) -> Vec<u8> {
    let mut entries: Vec<(u16, &[u8])> = vec![(1, family.as_bytes())];
    if let Some(sub) = subfamily {
        entries.push((2, sub.as_bytes()));
    }
    sfnt(
        version,
        &[
            (*b"head", vec![0xAB; 54]),
            (*b"glyf", (0u8..=200).collect()),
            (*b"name", name_table(&entries)),
        ],
    )
}

/// Three-table font without a `name` table.
pub fn unnamed_font(version: [u8; 4]) -> Vec<u8> {
    sfnt(
        version,
        &[
            (*b"head", vec![0x5A; 54]),
            (*b"glyf", (0u8..=120).rev().collect()),
            (*b"loca", vec![1, 2, 3, 4, 5, 6]),
        ],
    )
}

/// Deterministic filler bytes free of every signature.
pub fn filler(len: usize, seed: u64) -> Vec<u8> {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    // 0x80..=0xFF never forms an ASCII tag or `00 01 00 00`
    (0..len).map(|_| rng.gen_range(0x80u8..=0xFF)).collect()
}

/// `filler` with `font` placed at `offset`.
pub fn embed(font: &[u8], offset: usize, total: usize, seed: u64) -> Vec<u8> {
    let mut data = filler(total, seed);
    data[offset..offset + font.len()].copy_from_slice(font);
    data
}
