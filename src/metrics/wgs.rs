//! Coverage metrics extracted from CollectWgsMetrics reports.
//!
//! Two numbers are kept per sample: the mean coverage depth, read directly
//! from the metrics block, and the coverage breadth, recovered from the
//! coverage histogram. Breadth is the fraction of the genome territory
//! covered at least once, so it is the territory minus the histogram's zero
//! bin, over the territory.

use std::path::Path;

use tracing::debug;

use crate::errors::Error;
use crate::errors::Result;
use crate::metrics::sample_files;
use crate::table::Record;
use crate::table::SAMPLE_ID;
use crate::table::Table;
use crate::utils::formats::picard;

/// Column layout of the coverage metrics table.
const COLUMNS: &[&str] = &[SAMPLE_ID, "coverage_depth", "coverage_breadth"];

/// First field of the coverage histogram's header row.
const HISTOGRAM_BIN_LABEL: &str = "coverage";

/// Metrics pulled from one CollectWgsMetrics report.
#[derive(Clone, Copy, Debug)]
pub struct WgsMetrics {
    /// Mean coverage over the genome territory.
    pub coverage_depth: f64,

    /// Fraction of the genome territory covered by at least one read.
    pub coverage_breadth: f64,
}

impl WgsMetrics {
    /// Converts these metrics into the table record for `sample_id`.
    pub fn into_record(self, sample_id: &str) -> Record {
        let mut record = Record::new();

        record.insert(SAMPLE_ID, sample_id);
        record.insert("coverage_depth", self.coverage_depth);
        record.insert("coverage_breadth", self.coverage_breadth);

        record
    }
}

/// Parses the coverage metrics within a single CollectWgsMetrics report.
pub fn parse<P>(src: P) -> Result<WgsMetrics>
where
    P: AsRef<Path>,
{
    let src = src.as_ref();

    let metrics = picard::read_metrics_class(src)?;

    let genome_territory = metrics.parse_field::<i64>("genome_territory")?;
    let coverage_depth = metrics.parse_field::<f64>("mean_coverage")?;

    if genome_territory <= 0 {
        return Err(Error::malformed(
            src,
            format!("genome territory must be positive, found {}", genome_territory),
        ));
    }

    let histogram = picard::read_histogram(src, HISTOGRAM_BIN_LABEL)?;

    let uncovered = match histogram.get(&0) {
        Some(count) => *count,
        None => return Err(Error::malformed(src, "coverage histogram has no zero bin")),
    };

    let coverage_breadth =
        (genome_territory as f64 - uncovered as f64) / genome_territory as f64;

    Ok(WgsMetrics {
        coverage_depth,
        coverage_breadth,
    })
}

/// Extracts coverage metrics for every sample report within `dir`.
pub fn extract<P>(dir: P) -> Result<Table>
where
    P: AsRef<Path>,
{
    let mut table = Table::with_columns("wgs", COLUMNS);

    for (sample_id, path) in sample_files(dir)? {
        debug!("  [*] parsing {}", path.display());

        let metrics = parse(&path)?;
        table.push(metrics.into_record(&sample_id))?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::table::Value;

    fn report(territory: &str, mean: &str, zero_bin: Option<&str>) -> String {
        let mut contents = format!(
            "## htsjdk.samtools.metrics.StringHeader\n\
             # CollectWgsMetrics INPUT=sample.bam OUTPUT=sample.wgs.txt\n\
             \n\
             ## METRICS CLASS\tpicard.analysis.CollectWgsMetrics$WgsMetrics\n\
             GENOME_TERRITORY\tMEAN_COVERAGE\tSD_COVERAGE\tMEDIAN_COVERAGE\n\
             {}\t{}\t11.2\t28\n\
             \n\
             ## HISTOGRAM\tjava.lang.Integer\n\
             coverage\thigh_quality_coverage_count\n",
            territory, mean
        );

        if let Some(count) = zero_bin {
            contents.push_str(&format!("0\t{}\n", count));
        }

        contents.push_str("1\t93347098\n2\t2264802\n");
        contents
    }

    #[test]
    pub fn test_depth_and_breadth_from_a_well_formed_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s1.wgs.txt");
        std::fs::write(&path, report("3000000000", "30.5", Some("150000000"))).unwrap();

        let metrics = parse(&path).unwrap();

        assert_eq!(metrics.coverage_depth, 30.5);
        assert_eq!(metrics.coverage_breadth, 0.95);
    }

    #[test]
    pub fn test_breadth_stays_within_the_unit_interval() {
        let dir = tempfile::tempdir().unwrap();

        for (territory, uncovered) in [("100", "0"), ("100", "37"), ("100", "100")] {
            let path = dir.path().join("s1.wgs.txt");
            std::fs::write(&path, report(territory, "1.0", Some(uncovered))).unwrap();

            let metrics = parse(&path).unwrap();
            assert!((0.0..=1.0).contains(&metrics.coverage_breadth));
        }
    }

    #[test]
    pub fn test_a_zero_genome_territory_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s1.wgs.txt");
        std::fs::write(&path, report("0", "0.0", Some("0"))).unwrap();

        let err = parse(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }

    #[test]
    pub fn test_a_histogram_without_a_zero_bin_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s1.wgs.txt");
        std::fs::write(&path, report("3000000000", "30.5", None)).unwrap();

        let err = parse(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }

    #[test]
    pub fn test_extracts_a_directory_into_a_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("s1.wgs.txt"),
            report("1000", "2.5", Some("250")),
        )
        .unwrap();

        let table = extract(dir.path()).unwrap();

        assert_eq!(table.columns(), COLUMNS);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].get("coverage_depth"), Some(&Value::from(2.5)));
        assert_eq!(
            table.rows()[0].get("coverage_breadth"),
            Some(&Value::from(0.75))
        );
    }
}
