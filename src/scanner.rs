//! Streaming signature scan over an arbitrary reader.
//!
//! The reader is consumed in fixed-size chunks through an overlap window that
//! keeps the last `PAD` bytes of the previous fill, so a signature split across
//! two reads is still seen as one contiguous 4-byte window.

use crate::sfnt::{Signature, SIGNATURE_LEN};
use std::collections::VecDeque;
use std::io::{self, Read};

/// Bytes carried from one fill to the next.
pub const PAD: usize = SIGNATURE_LEN - 1;

/// A 4-byte window matching one of the known signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Absolute offset of the first signature byte.
    pub offset: u64,
    pub signature: Signature,
}

impl Hit {
    /// Whether this hit should go through validation and carving.
    pub fn is_candidate(&self) -> bool {
        !self.signature.is_collection()
    }
}

/// Fixed-capacity buffer retaining the tail of the previous fill.
struct OverlapWindow {
    buf: Vec<u8>,
    /// Valid bytes in `buf`.
    len: usize,
    /// Absolute stream offset of `buf[0]`.
    base: u64,
}

impl OverlapWindow {
    fn new(chunk_size: usize) -> Self {
        Self {
            buf: vec![0; PAD + chunk_size],
            len: 0,
            base: 0,
        }
    }

    /// Move the carried tail to the front and read the next chunk behind it.
    /// Returns the number of fresh bytes read.
    fn refill<R: Read>(&mut self, reader: &mut R) -> io::Result<usize> {
        let keep = self.len.min(PAD);
        let drop = self.len - keep;
        self.buf.copy_within(drop..self.len, 0);
        self.base += drop as u64;
        self.len = keep;

        let read = read_full(reader, &mut self.buf[keep..])?;
        self.len = keep + read;
        Ok(read)
    }

    fn windows(&self) -> impl Iterator<Item = (u64, &[u8])> + '_ {
        let base = self.base;
        self.buf[..self.len]
            .windows(SIGNATURE_LEN)
            .enumerate()
            .map(move |(i, w)| (base + i as u64, w))
    }
}

/// Read until `buf` is full or the reader reports end of stream.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Lazy, single pass signature scanner.
///
/// Yields every hit in ascending offset order, collections included. The
/// result does not depend on `chunk_size`.
pub struct Scanner<R> {
    reader: R,
    window: OverlapWindow,
    chunk_size: usize,
    pending: VecDeque<Hit>,
    scanned: u64,
    done: bool,
}

impl<R: Read> Scanner<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            reader,
            window: OverlapWindow::new(chunk_size),
            chunk_size,
            pending: VecDeque::new(),
            scanned: 0,
            done: false,
        }
    }

    /// Total bytes pulled from the reader so far.
    pub fn bytes_scanned(&self) -> u64 {
        self.scanned
    }

    fn next_chunk(&mut self) -> io::Result<()> {
        let read = self.window.refill(&mut self.reader)?;
        self.scanned += read as u64;
        if read < self.chunk_size {
            self.done = true;
        }
        // The carried tail is shorter than a signature, so every window here
        // touches at least one fresh byte and none was seen last round.
        for (offset, bytes) in self.window.windows() {
            if let Some(signature) = Signature::from_bytes(bytes) {
                self.pending.push_back(Hit { offset, signature });
            }
        }
        Ok(())
    }
}

impl<R: Read> Iterator for Scanner<R> {
    type Item = io::Result<Hit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(hit) = self.pending.pop_front() {
                return Some(Ok(hit));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.next_chunk() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

/// Collect every hit in `reader`.
pub fn scan_hits<R: Read>(reader: R, chunk_size: usize) -> io::Result<Vec<Hit>> {
    Scanner::new(reader, chunk_size).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out at most `step` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn offsets(data: &[u8], chunk: usize) -> Vec<u64> {
        scan_hits(Cursor::new(data), chunk)
            .unwrap()
            .into_iter()
            .map(|h| h.offset)
            .collect()
    }

    #[test]
    fn signature_at_stream_start() {
        assert_eq!(offsets(b"OTTOxxxx", 16), vec![0]);
        assert_eq!(offsets(b"OTTO", 1), vec![0]);
    }

    #[test]
    fn no_hit_before_stream_start() {
        // A zero pad in front of `01 00 00` would look like a TrueType tag.
        assert!(offsets(&[0x01, 0x00, 0x00, 0x7f], 2).is_empty());
        assert!(offsets(&[0x01, 0x00, 0x00], 8).is_empty());
    }

    #[test]
    fn no_hit_past_stream_end() {
        assert!(offsets(&[0xff, 0x00, 0x01], 2).is_empty());
        assert!(offsets(&[0xff, 0x00, 0x01, 0x00], 3).is_empty());
    }

    #[test]
    fn split_across_chunks() {
        let mut data = vec![b'.'; 6];
        data.extend_from_slice(b"true");
        data.extend_from_slice(b"....");
        // chunk boundary at 8 splits the tag 2/2
        assert_eq!(offsets(&data, 8), vec![6]);
        assert_eq!(offsets(&data, 7), vec![6]);
        assert_eq!(offsets(&data, 9), vec![6]);
    }

    #[test]
    fn overlapping_matches() {
        // 00 01 00 00 01 00 00 contains the TrueType tag twice, overlapping.
        let data = [0x00, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00];
        assert_eq!(offsets(&data, 1), vec![0, 3]);
        assert_eq!(offsets(&data, 4096), vec![0, 3]);
    }

    #[test]
    fn collections_are_tagged() {
        let hits = scan_hits(Cursor::new(b"..tccf..OTTO"), 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].signature, Signature::Collection);
        assert!(!hits[0].is_candidate());
        assert_eq!(hits[1].offset, 8);
        assert!(hits[1].is_candidate());
    }

    #[test]
    fn short_reads_do_not_end_the_scan() {
        let mut data = vec![0xAAu8; 40];
        data[30..34].copy_from_slice(b"typ1");
        let reader = Trickle {
            data: &data,
            step: 3,
        };
        let hits = scan_hits(reader, 16).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].offset, 30);
    }

    #[test]
    fn counts_scanned_bytes() {
        let data = vec![7u8; 100];
        let mut scanner = Scanner::new(Cursor::new(&data), 32);
        assert!(scanner.next().is_none());
        assert_eq!(scanner.bytes_scanned(), 100);
    }

    #[test]
    fn empty_input() {
        assert!(offsets(b"", 4).is_empty());
    }
}
