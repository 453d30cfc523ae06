//! Insert size metrics extracted from CollectInsertSizeMetrics reports.
//!
//! The three insert size statistics are carried through as raw report text
//! rather than reparsed numbers, so whatever precision the tool printed is
//! what lands in the output.
//!
//! A missing report is not an error here: the upstream tool exits
//! successfully without writing one when a sample has too few reads, so the
//! statistics are zeroed instead.

use std::path::Path;

use tracing::debug;

use crate::errors::Result;
use crate::metrics::sample_files;
use crate::table::Record;
use crate::table::SAMPLE_ID;
use crate::table::Table;
use crate::utils::formats::picard;

/// Column layout of the insert size metrics table.
const COLUMNS: &[&str] = &[
    SAMPLE_ID,
    "median_insert_size",
    "mean_insert_size",
    "standard_deviation_insert_size",
];

/// Metrics pulled from one CollectInsertSizeMetrics report.
#[derive(Clone, Debug)]
pub struct InsertSizeMetrics {
    /// Median insert size as printed by the tool.
    pub median_insert_size: String,

    /// Mean insert size as printed by the tool.
    pub mean_insert_size: String,

    /// Insert size standard deviation as printed by the tool.
    pub standard_deviation: String,
}

impl InsertSizeMetrics {
    /// The zero-valued metrics substituted for a sample whose report was
    /// never written.
    pub fn absent() -> Self {
        InsertSizeMetrics {
            median_insert_size: String::from("0"),
            mean_insert_size: String::from("0"),
            standard_deviation: String::from("0"),
        }
    }

    /// Converts these metrics into the table record for `sample_id`.
    pub fn into_record(self, sample_id: &str) -> Record {
        let mut record = Record::new();

        record.insert(SAMPLE_ID, sample_id);
        record.insert("median_insert_size", self.median_insert_size);
        record.insert("mean_insert_size", self.mean_insert_size);
        record.insert("standard_deviation_insert_size", self.standard_deviation);

        record
    }
}

/// Parses the insert size metrics within a single CollectInsertSizeMetrics
/// report, substituting zeroes if the report does not exist.
pub fn parse<P>(src: P) -> Result<InsertSizeMetrics>
where
    P: AsRef<Path>,
{
    let src = src.as_ref();

    if !src.is_file() {
        return Ok(InsertSizeMetrics::absent());
    }

    let metrics = picard::read_metrics_class(src)?;

    Ok(InsertSizeMetrics {
        median_insert_size: metrics.field("median_insert_size")?.to_string(),
        mean_insert_size: metrics.field("mean_insert_size")?.to_string(),
        standard_deviation: metrics.field("standard_deviation")?.to_string(),
    })
}

/// Extracts insert size metrics for every sample report within `dir`.
pub fn extract<P>(dir: P) -> Result<Table>
where
    P: AsRef<Path>,
{
    let mut table = Table::with_columns("insert", COLUMNS);

    for (sample_id, path) in sample_files(dir)? {
        debug!("  [*] parsing {}", path.display());

        let metrics = parse(&path)?;
        table.push(metrics.into_record(&sample_id))?;
    }

    Ok(table)
}
