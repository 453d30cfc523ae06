//! Extraction and aggregation of metrics tables into one per-sample report.
//!
//! The alignment pipeline leaves behind a metrics directory with one
//! subdirectory per category (duplication, flagstat, coverage, insert size),
//! each holding one report per sample. Extraction parses every category into
//! a table and folds the tables together with inner joins on the sample
//! identifier, so the merged report holds exactly the samples that appear in
//! every required category.
//!
//! The insert size category is special cased twice: a sample's missing report
//! is zero-filled (see [`crate::metrics::insert_size`]), and when the
//! category holds no reports at all (a single-end run) its columns are left
//! out of the merged report entirely.

use std::path::PathBuf;

use tracing::info;

use crate::errors::Result;
use crate::metrics::duplication;
use crate::metrics::flagstat;
use crate::metrics::insert_size;
use crate::metrics::sample_sheet;
use crate::metrics::wgs;
use crate::table::Join;
use crate::table::SAMPLE_ID;
use crate::table::Table;

pub mod command;

/// Subdirectory holding MarkDuplicates reports.
pub const DUPLICATION_DIR: &str = "duplication_metrics";

/// Subdirectory holding flagstat reports.
pub const FLAGSTAT_DIR: &str = "flagstat_metrics";

/// Subdirectory holding CollectInsertSizeMetrics reports.
pub const INSERT_DIR: &str = "insert_metrics";

/// Subdirectory holding CollectWgsMetrics reports.
pub const WGS_DIR: &str = "wgs_metrics";

/// Column prepended when a library identifier is supplied.
pub const LIBRARY_ID: &str = "library_id";

/// Configuration for one extraction run.
#[derive(Clone, Debug)]
pub struct ExtractConfig {
    /// Root metrics directory produced by the alignment pipeline.
    pub metrics_dir: PathBuf,

    /// Path the merged table is written to.
    pub out_file: PathBuf,

    /// Optional library identifier prepended as a constant column.
    pub library_id: Option<String>,

    /// Optional sample sheet whose annotations are merged into the report.
    pub samplesheet: Option<PathBuf>,
}

/// Builds the merged per-sample metrics table for `config`.
pub fn extract_table(config: &ExtractConfig) -> Result<Table> {
    let duplication = duplication::extract(config.metrics_dir.join(DUPLICATION_DIR))?;
    info!("  [*] duplication: {} sample(s)", duplication.len());

    let flagstat = flagstat::extract(config.metrics_dir.join(FLAGSTAT_DIR))?;
    info!("  [*] flagstat: {} sample(s)", flagstat.len());

    let wgs = wgs::extract(config.metrics_dir.join(WGS_DIR))?;
    info!("  [*] coverage: {} sample(s)", wgs.len());

    let mut table = flagstat
        .join(duplication, SAMPLE_ID, Join::Inner)?
        .join(wgs, SAMPLE_ID, Join::Inner)?;

    // Single-end runs produce no insert size reports at all, in which case
    // the whole category is left out of the merged report.
    let insert = insert_size::extract(config.metrics_dir.join(INSERT_DIR))?;
    info!("  [*] insert size: {} sample(s)", insert.len());

    if !insert.is_empty() {
        table = table.join(insert, SAMPLE_ID, Join::Inner)?;
    }

    if let Some(library_id) = &config.library_id {
        table.prepend_column(LIBRARY_ID, library_id.as_str())?;
    }

    if let Some(samplesheet) = &config.samplesheet {
        let annotations = sample_sheet::parse(samplesheet)?;
        info!("  [*] sample sheet: {} sample(s)", annotations.len());

        table = table.join(annotations, SAMPLE_ID, Join::Inner)?;
    }

    Ok(table)
}

/// Runs a full extraction: builds the merged table for `config` and writes it
/// to the configured output path as comma-separated text.
///
/// The table is assembled completely before any bytes are written, so a
/// failed run leaves no partial output behind. The written table is returned.
pub fn run(config: &ExtractConfig) -> Result<Table> {
    let table = extract_table(config)?;
    table.write_csv(&config.out_file, b',', "")?;
    Ok(table)
}

#[cfg(test)]
mod tests {

    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::errors::Error;
    use crate::table::Value;

    fn write_duplication(dir: &Path, sample_id: &str, pairs: u64, dups: u64) {
        fs::write(
            dir.join(format!("{}.markdups.txt", sample_id)),
            format!(
                "## METRICS CLASS\tpicard.sam.DuplicationMetrics\n\
                 LIBRARY\tUNPAIRED_READS_EXAMINED\tREAD_PAIRS_EXAMINED\t\
                 SECONDARY_OR_SUPPLEMENTARY_RDS\tUNMAPPED_READS\t\
                 UNPAIRED_READ_DUPLICATES\tREAD_PAIR_DUPLICATES\t\
                 READ_PAIR_OPTICAL_DUPLICATES\tPERCENT_DUPLICATION\t\
                 ESTIMATED_LIBRARY_SIZE\n\
                 lib1\t0\t{}\t0\t5\t0\t{}\t0\t0.1\t8888\n",
                pairs, dups
            ),
        )
        .unwrap();
    }

    fn write_flagstat(dir: &Path, sample_id: &str, total: u64) {
        fs::write(
            dir.join(format!("{}.flagstat.txt", sample_id)),
            format!(
                "{total} + 0 in total (QC-passed reads + QC-failed reads)\n\
                 50 + 0 duplicates\n\
                 900 + 0 mapped (90.00%:-nan%)\n\
                 {total} + 0 paired in sequencing\n\
                 500 + 0 read1\n\
                 500 + 0 read2\n\
                 800 + 0 properly paired (80.00%:-nan%)\n\
                 880 + 0 with itself and mate mapped\n\
                 20 + 0 singletons (2.00%:-nan%)\n"
            ),
        )
        .unwrap();
    }

    fn write_wgs(dir: &Path, sample_id: &str) {
        fs::write(
            dir.join(format!("{}.wgs.txt", sample_id)),
            "## METRICS CLASS\tpicard.analysis.CollectWgsMetrics$WgsMetrics\n\
             GENOME_TERRITORY\tMEAN_COVERAGE\tSD_COVERAGE\n\
             1000\t2.5\t1.1\n\
             \n\
             ## HISTOGRAM\tjava.lang.Integer\n\
             coverage\thigh_quality_coverage_count\n\
             0\t250\n\
             1\t750\n",
        )
        .unwrap();
    }

    fn write_insert(dir: &Path, sample_id: &str) {
        fs::write(
            dir.join(format!("{}.insert.txt", sample_id)),
            "## METRICS CLASS\tpicard.analysis.InsertSizeMetrics\n\
             MEDIAN_INSERT_SIZE\tMEAN_INSERT_SIZE\tSTANDARD_DEVIATION\n\
             210\t215.101873\t15.354708\n",
        )
        .unwrap();
    }

    fn metrics_tree(samples: &[&str], with_insert: bool) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();

        for sub in [DUPLICATION_DIR, FLAGSTAT_DIR, INSERT_DIR, WGS_DIR] {
            fs::create_dir(root.path().join(sub)).unwrap();
        }

        for sample_id in samples {
            write_duplication(&root.path().join(DUPLICATION_DIR), sample_id, 100, 10);
            write_flagstat(&root.path().join(FLAGSTAT_DIR), sample_id, 1000);
            write_wgs(&root.path().join(WGS_DIR), sample_id);

            if with_insert {
                write_insert(&root.path().join(INSERT_DIR), sample_id);
            }
        }

        root
    }

    #[test]
    pub fn test_merges_every_category_in_the_documented_column_order() {
        let root = metrics_tree(&["s1", "s2"], true);

        let samplesheet = root.path().join("samplesheet.csv");
        fs::write(
            &samplesheet,
            "[Data],,,,,,,,,\n\
             Sample_ID,Sample_Name,Sample_Plate,Sample_Well,I7_Index_ID,index,I5_Index_ID,index2,Sample_Project,Description\n\
             s1,SA928,R4-C12,R4_C12,i7-12,ACGT,i5-4,TGCA,PX0218,CC=C1;EC=A\n\
             s2,SA928,R4-C13,R4_C13,i7-13,ACGT,i5-4,TGCA,PX0218,CC=C2;EC=B\n",
        )
        .unwrap();

        let config = ExtractConfig {
            metrics_dir: root.path().to_path_buf(),
            out_file: root.path().join("metrics_table.csv"),
            library_id: Some(String::from("PX0218")),
            samplesheet: Some(samplesheet),
        };

        let table = run(&config).unwrap();
        assert_eq!(table.len(), 2);

        let contents = fs::read_to_string(&config.out_file).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(
            header,
            "library_id,sample_id,total_reads,total_mapped_reads,\
             total_duplicate_reads,total_properly_paired,unpaired_mapped_reads,\
             paired_mapped_reads,unpaired_duplicate_reads,paired_duplicate_reads,\
             unmapped_reads,percent_duplicate_reads,estimated_library_size,\
             coverage_depth,coverage_breadth,median_insert_size,mean_insert_size,\
             standard_deviation_insert_size,cell_call,experimental_condition,\
             sample_well,sample_plate,i5_index,i7_index"
        );

        let back = Table::read_csv(&config.out_file, b',').unwrap();
        let row = &back.rows()[0];
        assert_eq!(row.get(LIBRARY_ID), Some(&Value::from("PX0218")));
        assert_eq!(row.get(SAMPLE_ID), Some(&Value::from("s1")));
        assert_eq!(row.get("total_reads"), Some(&Value::from("1000")));
        assert_eq!(row.get("percent_duplicate_reads"), Some(&Value::from("0.1")));
        assert_eq!(row.get("coverage_breadth"), Some(&Value::from("0.75")));
        assert_eq!(row.get("mean_insert_size"), Some(&Value::from("215.101873")));
        assert_eq!(row.get("cell_call"), Some(&Value::from("C1")));
    }

    #[test]
    pub fn test_a_single_end_run_has_no_insert_size_columns() {
        let root = metrics_tree(&["s1"], false);

        let config = ExtractConfig {
            metrics_dir: root.path().to_path_buf(),
            out_file: root.path().join("metrics_table.csv"),
            library_id: None,
            samplesheet: None,
        };

        let table = run(&config).unwrap();

        assert!(!table.columns().iter().any(|c| c == "median_insert_size"));
        assert!(!table.columns().iter().any(|c| c == "library_id"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    pub fn test_extraction_is_deterministic() {
        let root = metrics_tree(&["s3", "s1", "s2"], true);

        let first = root.path().join("first.csv");
        let second = root.path().join("second.csv");

        for out_file in [&first, &second] {
            let config = ExtractConfig {
                metrics_dir: root.path().to_path_buf(),
                out_file: out_file.to_path_buf(),
                library_id: None,
                samplesheet: None,
            };

            run(&config).unwrap();
        }

        assert_eq!(
            fs::read_to_string(&first).unwrap(),
            fs::read_to_string(&second).unwrap()
        );
    }

    #[test]
    pub fn test_samples_missing_from_a_category_are_dropped() {
        let root = metrics_tree(&["s1", "s2"], true);

        // s3 only has a flagstat report, so the inner join chain drops it.
        write_flagstat(&root.path().join(FLAGSTAT_DIR), "s3", 1000);

        let config = ExtractConfig {
            metrics_dir: root.path().to_path_buf(),
            out_file: root.path().join("metrics_table.csv"),
            library_id: None,
            samplesheet: None,
        };

        let table = run(&config).unwrap();

        assert_eq!(table.len(), 2);
        assert!(!table
            .rows()
            .iter()
            .any(|row| row.get(SAMPLE_ID) == Some(&Value::from("s3"))));
    }

    #[test]
    pub fn test_a_missing_category_directory_aborts_without_partial_output() {
        let root = metrics_tree(&["s1"], true);
        fs::remove_dir_all(root.path().join(WGS_DIR)).unwrap();

        let config = ExtractConfig {
            metrics_dir: root.path().to_path_buf(),
            out_file: root.path().join("metrics_table.csv"),
            library_id: None,
            samplesheet: None,
        };

        let err = run(&config).unwrap_err();

        assert!(matches!(err, Error::MissingRequiredFile { .. }));
        assert!(!config.out_file.exists());
    }
}
