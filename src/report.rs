//! Human readable and tabular renderings of a carving run.

use crate::carve::{CandidateReport, CarveSummary};
use crate::sfnt::tag_to_string;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

/// Multi-line description of one accepted candidate.
pub fn render_candidate(report: &CandidateReport) -> String {
    let h = &report.header;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "found valid offset ({}) at 0x{:x}: version={} numTables={} searchRange={} entrySelector={} rangeShift={}",
        report.index,
        report.offset,
        tag_to_string(&h.version),
        h.num_tables,
        h.search_range,
        h.entry_selector,
        h.range_shift,
    );
    for (i, table) in report.tables.iter().enumerate() {
        let r = &table.record;
        let computed = match table.computed_checksum {
            Some(sum) => format!("0x{sum:08x}"),
            None => "out of bounds".to_string(),
        };
        let _ = writeln!(
            out,
            "{i:3} {} checksum=0x{:08x} offset={} length={} computed={} match={}",
            tag_to_string(&r.tag),
            r.checksum,
            r.offset,
            r.length,
            computed,
            table.checksum_ok(),
        );
    }
    for (id, value) in &report.names {
        let _ = writeln!(out, "    name {id:>3}: {value:?}");
    }
    match &report.target {
        Some(t) => {
            let _ = writeln!(out, "    -> {} ({} bytes)", t.filename, t.length);
        }
        None => {
            let _ = writeln!(out, "    -> not extracted");
        }
    }
    out
}

/// Closing totals for a run.
pub fn render_totals(summary: &CarveSummary, dry_run: bool) -> String {
    let planned = summary.targets().count();
    let mut out = String::new();
    let _ = writeln!(out, "#signature hits: {}", summary.hits);
    let _ = writeln!(out, "#collections skipped: {}", summary.collections.len());
    let _ = writeln!(out, "#valid candidates: {}", summary.candidates.len());
    if dry_run {
        let _ = writeln!(out, "#planned fonts: {planned} (dry run)");
    } else {
        let _ = writeln!(out, "#extracted fonts: {}", summary.extracted.len());
        let _ = writeln!(out, "#failed extractions: {}", summary.failures.len());
    }
    out
}

#[derive(Serialize)]
struct CsvRow<'a> {
    offset: u64,
    version: String,
    tables: u16,
    family: &'a str,
    subfamily: &'a str,
    bad_checksums: usize,
    filename: &'a str,
    length: u64,
}

/// One CSV row per valid candidate.
pub fn write_csv<W: Write>(summary: &CarveSummary, writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for c in &summary.candidates {
        wtr.serialize(CsvRow {
            offset: c.offset,
            version: tag_to_string(&c.header.version),
            tables: c.header.num_tables,
            family: c.family().unwrap_or(""),
            subfamily: c.subfamily().unwrap_or(""),
            bad_checksums: c.tables.iter().filter(|t| !t.checksum_ok()).count(),
            filename: c.target.as_ref().map_or("", |t| t.filename.as_str()),
            length: c.target.as_ref().map_or(0, |t| t.length),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    hits: usize,
    collections: &'a [u64],
    candidates: &'a [CandidateReport],
    extracted: Vec<String>,
    failures: Vec<String>,
}

/// Pretty JSON of the whole run.
pub fn write_json<W: Write>(summary: &CarveSummary, writer: W) -> serde_json::Result<()> {
    let doc = JsonSummary {
        hits: summary.hits,
        collections: &summary.collections,
        candidates: &summary.candidates,
        extracted: summary
            .extracted
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        failures: summary.failures.iter().map(|f| f.error.to_string()).collect(),
    };
    serde_json::to_writer_pretty(writer, &doc)
}
