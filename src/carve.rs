//! Per-candidate pipeline and the whole-file carving run.
//!
//! Candidates are independent: a rejected or failing candidate never affects
//! the others. Only I/O errors on the source abort a run.

use crate::config::Config;
use crate::directory::{read_directory, table_checksum};
use crate::error::{CarveError, Result};
use crate::extract::{extract_target, plan_target, resolve_collisions, ExtractionTarget};
use crate::names::{decode_names, NameTable};
use crate::scanner::{Hit, Scanner};
use crate::sfnt::{NameRecord, NameTableHeader, SfntHeader, TableRecord, NAME_TAG};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

/// One table record together with its recomputed checksum.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    #[serde(flatten)]
    pub record: TableRecord,
    /// `None` when the table lies outside the file.
    pub computed_checksum: Option<u32>,
}

impl TableReport {
    pub fn checksum_ok(&self) -> bool {
        self.computed_checksum == Some(self.record.checksum)
    }
}

/// Everything known about one structurally valid candidate.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    /// Position of the hit in scan order.
    pub index: usize,
    pub offset: u64,
    pub header: SfntHeader,
    pub tables: Vec<TableReport>,
    pub name_header: Option<NameTableHeader>,
    pub name_records: Vec<NameRecord>,
    pub names: BTreeMap<u16, String>,
    /// `None` when the candidate is not going to be carved.
    pub target: Option<ExtractionTarget>,
}

impl CandidateReport {
    pub fn family(&self) -> Option<&str> {
        self.names.get(&crate::sfnt::NAME_ID_FAMILY).map(String::as_str)
    }

    pub fn subfamily(&self) -> Option<&str> {
        self.names
            .get(&crate::sfnt::NAME_ID_SUBFAMILY)
            .map(String::as_str)
    }
}

/// Validate, decode and plan the candidate at `offset`.
///
/// Returns `Ok(None)` when the bytes there are not an sfnt.
pub fn inspect_candidate<S: Read + Seek + ?Sized>(
    stream: &mut S,
    index: usize,
    offset: u64,
    file_size: u64,
    config: &Config,
) -> Result<Option<CandidateReport>> {
    let Some(directory) = read_directory(stream, offset, file_size)? else {
        return Ok(None);
    };

    let mut tables = Vec::with_capacity(directory.records.len());
    for record in &directory.records {
        let computed_checksum =
            table_checksum(stream, offset, record, file_size, config.checksum_buffer_size)?;
        tables.push(TableReport {
            record: *record,
            computed_checksum,
        });
    }

    let names: Option<NameTable> = match directory.find(&NAME_TAG) {
        Some(record) => decode_names(stream, offset, record, file_size)?,
        None => None,
    };
    let target = plan_target(
        stream,
        offset,
        &directory,
        names.as_ref(),
        file_size,
        config,
    )?;

    let names = names.unwrap_or_default();
    Ok(Some(CandidateReport {
        index,
        offset,
        header: directory.header,
        tables,
        name_header: names.header,
        name_records: names.records,
        names: names.strings,
        target,
    }))
}

/// An extraction that could not be written.
#[derive(Debug)]
pub struct ExtractFailure {
    pub target: ExtractionTarget,
    pub error: CarveError,
}

/// Outcome of a carving run.
#[derive(Debug, Default)]
pub struct CarveSummary {
    /// Signature matches, collections included.
    pub hits: usize,
    /// Offsets of collection headers that were skipped.
    pub collections: Vec<u64>,
    /// Structurally valid candidates, in scan order.
    pub candidates: Vec<CandidateReport>,
    pub extracted: Vec<PathBuf>,
    pub failures: Vec<ExtractFailure>,
}

impl CarveSummary {
    pub fn targets(&self) -> impl Iterator<Item = &ExtractionTarget> {
        self.candidates.iter().filter_map(|c| c.target.as_ref())
    }
}

/// Drives scan, validation and extraction with one configuration.
pub struct Carver {
    config: Config,
}

impl Carver {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Forward scan of `reader`, consuming it.
    pub fn scan<R: Read>(&self, reader: R) -> Result<Vec<Hit>> {
        let hits = Scanner::new(reader, self.config.chunk_size).collect::<std::io::Result<_>>()?;
        Ok(hits)
    }

    /// Validate every hit and plan the carve. Nothing is written.
    pub fn analyze<S: Read + Seek + ?Sized>(
        &self,
        stream: &mut S,
        hits: &[Hit],
        file_size: u64,
    ) -> Result<CarveSummary> {
        let mut summary = CarveSummary {
            hits: hits.len(),
            ..CarveSummary::default()
        };
        for (index, hit) in hits.iter().enumerate() {
            if !hit.is_candidate() {
                debug!("0x{:x}: font collection, skipped", hit.offset);
                summary.collections.push(hit.offset);
                continue;
            }
            if let Some(report) =
                inspect_candidate(stream, index, hit.offset, file_size, &self.config)?
            {
                info!(
                    "0x{:x}: valid {} with {} tables",
                    report.offset,
                    hit.signature,
                    report.tables.len()
                );
                summary.candidates.push(report);
            }
        }

        let mut targets: Vec<ExtractionTarget> = summary.targets().cloned().collect();
        resolve_collisions(&mut targets, self.config.collisions);
        let mut renamed = targets.into_iter();
        for candidate in &mut summary.candidates {
            if let Some(target) = candidate.target.as_mut() {
                if let Some(resolved) = renamed.next() {
                    *target = resolved;
                }
            }
        }
        Ok(summary)
    }

    /// Write every planned target into `out_dir`.
    ///
    /// Failures are recorded per target and do not stop the others.
    pub fn extract_all<S: Read + Seek + ?Sized>(
        &self,
        stream: &mut S,
        summary: &mut CarveSummary,
        out_dir: &Path,
    ) {
        if self.config.dry_run {
            return;
        }
        let targets: Vec<ExtractionTarget> = summary.targets().cloned().collect();
        for target in targets {
            match extract_target(stream, &target, out_dir) {
                Ok(path) => {
                    info!("wrote {} ({} bytes)", path.display(), target.length);
                    summary.extracted.push(path);
                }
                Err(error) => {
                    warn!("{error}");
                    summary.failures.push(ExtractFailure { target, error });
                }
            }
        }
    }

    /// Scan `input` and carve every identified font into `out_dir`.
    pub fn carve_file(&self, input: &Path, out_dir: &Path) -> Result<CarveSummary> {
        let mut file = File::open(input)?;
        let file_size = file.metadata()?.len();
        if !self.config.dry_run {
            fs::create_dir_all(out_dir)?;
        }
        let hits = self.scan(&mut file)?;
        let mut summary = self.analyze(&mut file, &hits, file_size)?;
        self.extract_all(&mut file, &mut summary, out_dir);
        Ok(summary)
    }
}
