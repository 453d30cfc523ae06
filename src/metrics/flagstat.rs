//! Alignment summary counts extracted from samtools flagstat reports.
//!
//! A flagstat report is a fixed sequence of lines of the form
//! `<count> + <count> <description>` (QC-passed and QC-failed counts). The
//! four counts of interest are read by line position, which is how the
//! upstream tool defines its output. Since positional reads would silently
//! misread a report if the tool ever reordered its lines, the description at
//! each consumed position is checked against the role expected there and any
//! drift fails the parse.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::errors::Error;
use crate::errors::Result;
use crate::metrics::sample_files;
use crate::table::Record;
use crate::table::SAMPLE_ID;
use crate::table::Table;

/// Column layout of the flagstat metrics table.
const COLUMNS: &[&str] = &[
    SAMPLE_ID,
    "total_reads",
    "total_mapped_reads",
    "total_duplicate_reads",
    "total_properly_paired",
];

/// The consumed line positions and the description each one must start with.
const EXPECTED_ROLES: &[(usize, &str)] = &[
    (0, "in total"),
    (1, "duplicates"),
    (2, "mapped"),
    (6, "properly paired"),
];

/// Metrics pulled from one flagstat report.
#[derive(Clone, Copy, Debug)]
pub struct FlagstatMetrics {
    /// Total number of reads.
    pub total_reads: i64,

    /// Number of mapped reads.
    pub total_mapped_reads: i64,

    /// Number of reads marked as duplicates.
    pub total_duplicate_reads: i64,

    /// Number of properly paired reads.
    pub total_properly_paired: i64,
}

impl FlagstatMetrics {
    /// Converts these metrics into the table record for `sample_id`.
    pub fn into_record(self, sample_id: &str) -> Record {
        let mut record = Record::new();

        record.insert(SAMPLE_ID, sample_id);
        record.insert("total_reads", self.total_reads);
        record.insert("total_mapped_reads", self.total_mapped_reads);
        record.insert("total_duplicate_reads", self.total_duplicate_reads);
        record.insert("total_properly_paired", self.total_properly_paired);

        record
    }
}

/// Parses the counts within a single flagstat report.
pub fn parse<P>(src: P) -> Result<FlagstatMetrics>
where
    P: AsRef<Path>,
{
    let src = src.as_ref();

    let file = File::open(src).map_err(|source| Error::Read {
        path: src.to_path_buf(),
        source,
    })?;

    let pattern = Regex::new(r"^(\d+) \+ (\d+) (.+)$").unwrap();

    let mut lines = Vec::new();

    for result in BufReader::new(file).lines() {
        let line = result.map_err(|source| Error::Read {
            path: src.to_path_buf(),
            source,
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let captures = pattern.captures(&line).ok_or_else(|| {
            Error::malformed(src, format!("unrecognized flagstat line '{}'", line))
        })?;

        let count = captures[1].parse::<i64>().map_err(|e| {
            Error::malformed(src, format!("invalid count in flagstat line '{}': {}", line, e))
        })?;

        lines.push((count, captures[3].to_string()));
    }

    for (index, role) in EXPECTED_ROLES {
        match lines.get(*index) {
            Some((_, description)) if description.starts_with(role) => {}
            Some((_, description)) => {
                return Err(Error::malformed(
                    src,
                    format!(
                        "expected line {} to describe '{}', found '{}'",
                        index, role, description
                    ),
                ));
            }
            None => {
                return Err(Error::malformed(
                    src,
                    format!("expected at least 7 lines, found {}", lines.len()),
                ));
            }
        }
    }

    Ok(FlagstatMetrics {
        total_reads: lines[0].0,
        total_duplicate_reads: lines[1].0,
        total_mapped_reads: lines[2].0,
        total_properly_paired: lines[6].0,
    })
}

/// Extracts flagstat metrics for every sample report within `dir`.
pub fn extract<P>(dir: P) -> Result<Table>
where
    P: AsRef<Path>,
{
    let mut table = Table::with_columns("flagstat", COLUMNS);

    for (sample_id, path) in sample_files(dir)? {
        debug!("  [*] parsing {}", path.display());

        let metrics = parse(&path)?;
        table.push(metrics.into_record(&sample_id))?;
    }

    Ok(table)
}
