//! Duplication metrics extracted from MarkDuplicates reports.
//!
//! The report's metrics block counts examined and duplicate reads separately
//! for unpaired reads and read pairs. The overall duplication fraction is
//! recomputed here (rather than trusting the report's own PERCENT_DUPLICATION
//! column) so that optical duplicates are folded in:
//!
//! ```text
//!                unpaired duplicates + (pair duplicates + optical pair duplicates) * 2
//! duplication = --------------------------------------------------------------------
//!                       unpaired examined + pairs examined * 2
//! ```
//!
//! A library with nothing examined has a duplication fraction of zero.

use std::path::Path;

use tracing::debug;

use crate::errors::Result;
use crate::metrics::sample_files;
use crate::table::Record;
use crate::table::SAMPLE_ID;
use crate::table::Table;
use crate::utils::formats::picard;

/// Column layout of the duplication metrics table.
const COLUMNS: &[&str] = &[
    SAMPLE_ID,
    "unpaired_mapped_reads",
    "paired_mapped_reads",
    "unpaired_duplicate_reads",
    "paired_duplicate_reads",
    "unmapped_reads",
    "percent_duplicate_reads",
    "estimated_library_size",
];

/// Metrics pulled from one MarkDuplicates report.
#[derive(Clone, Debug)]
pub struct DuplicationMetrics {
    /// Unpaired mapped reads examined for duplication.
    pub unpaired_mapped_reads: i64,

    /// Mapped read pairs examined for duplication.
    pub paired_mapped_reads: i64,

    /// Unpaired reads marked as duplicates.
    pub unpaired_duplicate_reads: i64,

    /// Read pairs marked as duplicates.
    pub paired_duplicate_reads: i64,

    /// Unmapped reads, carried through as raw report text.
    pub unmapped_reads: String,

    /// Fraction of examined reads marked as duplicates.
    pub percent_duplicate_reads: f64,

    /// Estimated library size, carried through as raw report text.
    pub estimated_library_size: String,
}

impl DuplicationMetrics {
    /// Converts these metrics into the table record for `sample_id`.
    pub fn into_record(self, sample_id: &str) -> Record {
        let mut record = Record::new();

        record.insert(SAMPLE_ID, sample_id);
        record.insert("unpaired_mapped_reads", self.unpaired_mapped_reads);
        record.insert("paired_mapped_reads", self.paired_mapped_reads);
        record.insert("unpaired_duplicate_reads", self.unpaired_duplicate_reads);
        record.insert("paired_duplicate_reads", self.paired_duplicate_reads);
        record.insert("unmapped_reads", self.unmapped_reads);
        record.insert("percent_duplicate_reads", self.percent_duplicate_reads);
        record.insert("estimated_library_size", self.estimated_library_size);

        record
    }
}

/// Parses the duplication metrics within a single MarkDuplicates report.
pub fn parse<P>(src: P) -> Result<DuplicationMetrics>
where
    P: AsRef<Path>,
{
    let metrics = picard::read_metrics_class(src)?;

    let unpaired_mapped_reads = metrics.parse_field::<i64>("unpaired_reads_examined")?;
    let paired_mapped_reads = metrics.parse_field::<i64>("read_pairs_examined")?;
    let unpaired_duplicate_reads = metrics.parse_field::<i64>("unpaired_read_duplicates")?;
    let paired_duplicate_reads = metrics.parse_field::<i64>("read_pair_duplicates")?;
    let optical_pair_duplicates = metrics.parse_field::<i64>("read_pair_optical_duplicates")?;

    // These two fields are left blank by some tool versions when the library
    // is too shallow to estimate, so they are carried through as text.
    let unmapped_reads = or_nan(metrics.field("unmapped_reads")?);
    let estimated_library_size = or_nan(metrics.field("estimated_library_size")?);

    let numerator =
        unpaired_duplicate_reads + (paired_duplicate_reads + optical_pair_duplicates) * 2;
    let denominator = unpaired_mapped_reads + paired_mapped_reads * 2;

    let percent_duplicate_reads = if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    };

    Ok(DuplicationMetrics {
        unpaired_mapped_reads,
        paired_mapped_reads,
        unpaired_duplicate_reads,
        paired_duplicate_reads,
        unmapped_reads,
        percent_duplicate_reads,
        estimated_library_size,
    })
}

/// Extracts duplication metrics for every sample report within `dir`.
pub fn extract<P>(dir: P) -> Result<Table>
where
    P: AsRef<Path>,
{
    let mut table = Table::with_columns("duplication", COLUMNS);

    for (sample_id, path) in sample_files(dir)? {
        debug!("  [*] parsing {}", path.display());

        let metrics = parse(&path)?;
        table.push(metrics.into_record(&sample_id))?;
    }

    Ok(table)
}

/// Blank report fields become the literal text `nan`.
fn or_nan(value: &str) -> String {
    if value.is_empty() {
        String::from("nan")
    } else {
        value.to_string()
    }
}
