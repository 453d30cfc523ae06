//! Utilities related to reading Picard-style metrics report files.
//!
//! Picard tools write loosely structured reports: a free-text preamble of
//! `htsjdk` headers and command lines, a metrics block opened by a literal
//! `## METRICS CLASS` marker line, and (for some tools) a histogram block
//! opened by `## HISTOGRAM`. The metrics block is a tab-separated header row
//! followed by one row of values. Column names are matched case-insensitively
//! since their capitalization differs between tool versions.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Lines;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::Error;
use crate::errors::Result;

//==================//
// Useful constants //
//==================//

/// Marker line opening the metrics block of a report.
pub const METRICS_CLASS_MARKER: &str = "## METRICS CLASS";

/// Marker line opening the histogram block of a report.
pub const HISTOGRAM_MARKER: &str = "## HISTOGRAM";

//================//
// Metrics blocks //
//================//

/// The metrics block of a report: one row of values addressed by case-folded
/// column name.
#[derive(Debug)]
pub struct MetricsClass {
    /// Path the block was read from, kept for error messages.
    path: PathBuf,

    /// Case-folded column name to position within the value row. When a
    /// header repeats a name, the last occurrence wins.
    columns: HashMap<String, usize>,

    /// The raw fields of the value row.
    values: Vec<String>,
}

impl MetricsClass {
    /// Looks up the raw text of the field named `name` (case-insensitive).
    ///
    /// Fails if the column is absent from the header or if the value row is
    /// too short to hold it.
    pub fn field(&self, name: &str) -> Result<&str> {
        let index = self.columns.get(&name.to_lowercase()).ok_or_else(|| {
            Error::malformed(
                &self.path,
                format!("metrics block has no '{}' column", name),
            )
        })?;

        match self.values.get(*index) {
            Some(value) => Ok(value.as_str()),
            None => Err(Error::malformed(
                &self.path,
                format!("metrics row has no value for '{}'", name),
            )),
        }
    }

    /// Looks up the field named `name` and parses it.
    pub fn parse_field<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.field(name)?;

        value.parse::<T>().map_err(|e| {
            Error::malformed(
                &self.path,
                format!("field '{}' has invalid value '{}': {}", name, value, e),
            )
        })
    }
}

/// Reads the metrics block of the report at `src`.
///
/// The file is scanned line by line until the [`METRICS_CLASS_MARKER`] line.
/// The next two non-empty lines are taken as the tab-separated header and
/// value rows. A report without the marker, or one that ends before both rows
/// are seen, is malformed.
pub fn read_metrics_class<P>(src: P) -> Result<MetricsClass>
where
    P: AsRef<Path>,
{
    let src = src.as_ref();
    let mut lines = open_lines(src)?;

    loop {
        let line = match lines.next() {
            Some(result) => result.map_err(|source| Error::Read {
                path: src.to_path_buf(),
                source,
            })?,
            None => {
                return Err(Error::malformed(
                    src,
                    format!("no '{}' block found", METRICS_CLASS_MARKER),
                ))
            }
        };

        if line.starts_with(METRICS_CLASS_MARKER) {
            break;
        }
    }

    let header = next_block_row(src, &mut lines)?;
    let values = next_block_row(src, &mut lines)?;

    let columns = header
        .iter()
        .enumerate()
        .map(|(index, name)| (name.to_lowercase(), index))
        .collect::<HashMap<String, usize>>();

    Ok(MetricsClass {
        path: src.to_path_buf(),
        columns,
        values,
    })
}

//============//
// Histograms //
//============//

/// Reads the histogram block of the report at `src` as a mapping from bin to
/// count.
///
/// Everything after the [`HISTOGRAM_MARKER`] line is part of the block. Empty
/// lines are skipped, as is the column header row (recognized by its first
/// field equaling `bin_label`). Remaining rows must start with two integral
/// fields; any further fields are ignored.
pub fn read_histogram<P>(src: P, bin_label: &str) -> Result<BTreeMap<u64, u64>>
where
    P: AsRef<Path>,
{
    let src = src.as_ref();
    let mut lines = open_lines(src)?;

    let mut found = false;

    for result in &mut lines {
        let line = result.map_err(|source| Error::Read {
            path: src.to_path_buf(),
            source,
        })?;

        if line.starts_with(HISTOGRAM_MARKER) {
            found = true;
            break;
        }
    }

    if !found {
        return Err(Error::malformed(
            src,
            format!("no '{}' block found", HISTOGRAM_MARKER),
        ));
    }

    let mut histogram = BTreeMap::new();

    for result in lines {
        let line = result.map_err(|source| Error::Read {
            path: src.to_path_buf(),
            source,
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let first = fields.next().unwrap_or_default();

        if first == bin_label {
            continue;
        }

        let bin = first.parse::<u64>().map_err(|e| {
            Error::malformed(src, format!("invalid histogram bin '{}': {}", first, e))
        })?;

        let count = fields
            .next()
            .ok_or_else(|| {
                Error::malformed(src, format!("histogram bin {} has no count", bin))
            })?
            .parse::<u64>()
            .map_err(|e| {
                Error::malformed(src, format!("invalid count for histogram bin {}: {}", bin, e))
            })?;

        histogram.insert(bin, count);
    }

    Ok(histogram)
}

//=================//
// Utility Methods //
//=================//

/// Opens `src` for buffered line-by-line reading.
fn open_lines(src: &Path) -> Result<Lines<BufReader<File>>> {
    let file = File::open(src).map_err(|source| Error::Read {
        path: src.to_path_buf(),
        source,
    })?;

    Ok(BufReader::new(file).lines())
}

/// Pulls the next non-empty line and splits it on tabs. Errors if the file
/// ends first.
fn next_block_row(src: &Path, lines: &mut Lines<BufReader<File>>) -> Result<Vec<String>> {
    for result in lines {
        let line = result.map_err(|source| Error::Read {
            path: src.to_path_buf(),
            source,
        })?;

        if line.trim().is_empty() {
            continue;
        }

        return Ok(line.split('\t').map(String::from).collect());
    }

    Err(Error::malformed(src, "metrics block is truncated"))
}

#[cfg(test)]
mod tests {

    use std::io::Write;

    use super::*;

    fn write_report(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    pub fn test_reads_the_block_after_a_preamble_with_case_folded_names() {
        let (_dir, path) = write_report(
            "## htsjdk.samtools.metrics.StringHeader\n\
             # MarkDuplicates INPUT=[sample.bam] OUTPUT=sample.markdups.bam\n\
             ## htsjdk.samtools.metrics.StringHeader\n\
             # Started on: Fri Jun 13 10:12:31 PDT 2014\n\
             \n\
             ## METRICS CLASS\tpicard.sam.DuplicationMetrics\n\
             LIBRARY\tUNPAIRED_READS_EXAMINED\tREAD_PAIRS_EXAMINED\n\
             lib1\t52\t16754\n",
        );

        let metrics = read_metrics_class(&path).unwrap();

        assert_eq!(metrics.field("library").unwrap(), "lib1");
        assert_eq!(metrics.field("unpaired_reads_examined").unwrap(), "52");
        assert_eq!(metrics.parse_field::<u64>("read_pairs_examined").unwrap(), 16754);
    }

    #[test]
    pub fn test_trailing_empty_fields_are_preserved() {
        let (_dir, path) = write_report(
            "## METRICS CLASS\tpicard.sam.DuplicationMetrics\n\
             LIBRARY\tESTIMATED_LIBRARY_SIZE\n\
             lib1\t\n",
        );

        let metrics = read_metrics_class(&path).unwrap();
        assert_eq!(metrics.field("estimated_library_size").unwrap(), "");
    }

    #[test]
    pub fn test_a_missing_column_is_malformed() {
        let (_dir, path) = write_report(
            "## METRICS CLASS\tx\n\
             LIBRARY\n\
             lib1\n",
        );

        let metrics = read_metrics_class(&path).unwrap();
        let err = metrics.field("read_pairs_examined").unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }

    #[test]
    pub fn test_an_unparsable_field_is_malformed() {
        let (_dir, path) = write_report(
            "## METRICS CLASS\tx\n\
             READ_PAIRS_EXAMINED\n\
             not-a-number\n",
        );

        let metrics = read_metrics_class(&path).unwrap();
        let err = metrics.parse_field::<u64>("read_pairs_examined").unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }

    #[test]
    pub fn test_a_report_without_the_marker_is_malformed() {
        let (_dir, path) = write_report("just some text\nand some more\n");

        let err = read_metrics_class(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }

    #[test]
    pub fn test_a_truncated_block_is_malformed() {
        let (_dir, path) = write_report("## METRICS CLASS\tx\nLIBRARY\n");

        let err = read_metrics_class(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }

    #[test]
    pub fn test_reads_a_histogram_skipping_its_header_row() {
        let (_dir, path) = write_report(
            "## METRICS CLASS\tpicard.analysis.WgsMetrics\n\
             GENOME_TERRITORY\tMEAN_COVERAGE\n\
             3101804739\t0.99\n\
             \n\
             ## HISTOGRAM\tjava.lang.Integer\n\
             coverage\thigh_quality_coverage_count\n\
             0\t2945462552\n\
             1\t93347098\n\
             2\t2264802\n",
        );

        let histogram = read_histogram(&path, "coverage").unwrap();

        assert_eq!(histogram.get(&0), Some(&2945462552));
        assert_eq!(histogram.get(&1), Some(&93347098));
        assert_eq!(histogram.get(&2), Some(&2264802));
        assert_eq!(histogram.len(), 3);
    }

    #[test]
    pub fn test_a_report_without_a_histogram_is_malformed() {
        let (_dir, path) = write_report(
            "## METRICS CLASS\tx\n\
             GENOME_TERRITORY\n\
             100\n",
        );

        let err = read_histogram(&path, "coverage").unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }

    #[test]
    pub fn test_junk_in_a_histogram_is_malformed() {
        let (_dir, path) = write_report(
            "## HISTOGRAM\tjava.lang.Integer\n\
             coverage\tcount\n\
             zero\t10\n",
        );

        let err = read_histogram(&path, "coverage").unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }
}
