//! Carving of OpenType/TrueType fonts embedded in raw binary blobs.
//!
//! A run scans the input for sfnt signatures, validates the table directory
//! behind each hit, reads the family and subfamily names from the `name`
//! table and copies each recognised font out as its own file.

pub mod carve;
pub mod config;
pub mod directory;
pub mod error;
pub mod extract;
pub mod io_utils;
pub mod names;
pub mod report;
pub mod scanner;
pub mod sfnt;

pub use carve::{inspect_candidate, CandidateReport, CarveSummary, Carver, ExtractFailure, TableReport};
pub use config::{Collisions, Config};
pub use directory::{checksum_words, read_directory, table_checksum, TableDirectory};
pub use error::{CarveError, Result};
pub use extract::{
    content_digest, display_name, extract_target, plan_target, resolve_collisions,
    sanitize_filename, ExtractionTarget,
};
pub use names::{decode_names, NameTable};
pub use scanner::{scan_hits, Hit, Scanner};
pub use sfnt::{NameRecord, NameTableHeader, SfntHeader, Signature, TableRecord};
