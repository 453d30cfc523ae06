//! Sample annotations parsed from an Illumina sample sheet.
//!
//! A sample sheet is a comma-separated manifest with several preamble
//! sections (`[Header]`, `[Reads]`, and so on) that are skipped wholesale up
//! to the `[Data]` section. The `[Data]` section opens with a column header
//! row, which must match the layout this parser indexes by exactly, followed
//! by one row per sample.
//!
//! Each sample's `Description` field is itself a small `key=value` record
//! delimited by semicolons, carrying the cell call (`CC`) and experimental
//! condition (`EC`) assigned during plate setup.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use itertools::Itertools;
use tracing::debug;

use crate::errors::Error;
use crate::errors::Result;
use crate::table::Record;
use crate::table::SAMPLE_ID;
use crate::table::Table;

/// Column layout of the sample annotation table.
const COLUMNS: &[&str] = &[
    SAMPLE_ID,
    "cell_call",
    "experimental_condition",
    "sample_well",
    "sample_plate",
    "i5_index",
    "i7_index",
];

/// Marker line opening the data section.
const DATA_MARKER: &str = "[Data]";

/// Accepted spellings of the first column header within the data section.
const ID_HEADERS: &[&str] = &["Sample_ID", "Sample-ID"];

/// The column headers that must follow the sample id header, in order.
const DATA_HEADERS: &[&str] = &[
    "Sample_Name",
    "Sample_Plate",
    "Sample_Well",
    "I7_Index_ID",
    "index",
    "I5_Index_ID",
    "index2",
    "Sample_Project",
    "Description",
];

/// Annotations for one sample, pulled from a single data row.
#[derive(Clone, Debug)]
pub struct SampleSheetRecord {
    /// The sample identifier.
    pub sample_id: String,

    /// The cell call decoded from the description (`CC` key).
    pub cell_call: String,

    /// The experimental condition decoded from the description (`EC` key).
    pub experimental_condition: String,

    /// The well the sample was drawn from.
    pub sample_well: String,

    /// The plate the sample was drawn from.
    pub sample_plate: String,

    /// The i5 index barcode.
    pub i5_index: String,

    /// The i7 index barcode.
    pub i7_index: String,
}

impl SampleSheetRecord {
    /// Converts these annotations into a table record.
    pub fn into_record(self) -> Record {
        let mut record = Record::new();

        record.insert(SAMPLE_ID, self.sample_id);
        record.insert("cell_call", self.cell_call);
        record.insert("experimental_condition", self.experimental_condition);
        record.insert("sample_well", self.sample_well);
        record.insert("sample_plate", self.sample_plate);
        record.insert("i5_index", self.i5_index);
        record.insert("i7_index", self.i7_index);

        record
    }
}

/// Parses a sample sheet into the sample annotation table.
pub fn parse<P>(src: P) -> Result<Table>
where
    P: AsRef<Path>,
{
    let src = src.as_ref();

    if !src.is_file() {
        return Err(Error::MissingRequiredFile {
            path: src.to_path_buf(),
        });
    }

    debug!("  [*] parsing {}", src.display());

    let file = File::open(src).map_err(|source| Error::Read {
        path: src.to_path_buf(),
        source,
    })?;

    let mut table = Table::with_columns("samplesheet", COLUMNS);

    let mut in_data = false;
    let mut header_seen = false;

    for result in BufReader::new(file).lines() {
        let line = result.map_err(|source| Error::Read {
            path: src.to_path_buf(),
            source,
        })?;

        let fields = line.trim().split(',').collect::<Vec<&str>>();

        // (1) Skip the preamble sections up to the data marker.
        if !in_data {
            if fields[0] == DATA_MARKER {
                in_data = true;
            }

            continue;
        }

        if fields.iter().all(|field| field.is_empty()) {
            continue;
        }

        // (2) The first row of the data section must be the column header.
        if !header_seen {
            validate_header(src, &fields)?;
            header_seen = true;
            continue;
        }

        // (3) Everything else is one sample per row.
        let record = parse_row(src, &fields)?;
        table.push(record.into_record())?;
    }

    if !in_data {
        return Err(Error::malformed(
            src,
            format!("no '{}' section found", DATA_MARKER),
        ));
    }

    if !header_seen {
        return Err(Error::malformed(
            src,
            format!("no column header found after '{}'", DATA_MARKER),
        ));
    }

    Ok(table)
}

/// Checks that the data section's column header matches the layout rows are
/// indexed by.
fn validate_header(src: &Path, fields: &[&str]) -> Result<()> {
    if !ID_HEADERS.contains(&fields[0]) {
        return Err(Error::malformed(
            src,
            format!(
                "expected the '{}' column header after '{}', found '{}'",
                ID_HEADERS[0], DATA_MARKER, fields[0]
            ),
        ));
    }

    if &fields[1..] != DATA_HEADERS {
        return Err(Error::malformed(
            src,
            format!(
                "unexpected data columns: expected [{}], found [{}]",
                DATA_HEADERS.iter().join(", "),
                fields[1..].iter().join(", ")
            ),
        ));
    }

    Ok(())
}

/// Parses a single data row into its sample annotations.
///
/// The plate, well, and index fields may be blank, in which case fixed
/// placeholder values are substituted.
fn parse_row(src: &Path, fields: &[&str]) -> Result<SampleSheetRecord> {
    if fields.len() < 10 {
        return Err(Error::malformed(
            src,
            format!("sample row has {} columns, expected 10", fields.len()),
        ));
    }

    let description = fields[9];

    let cell_call = description_field(src, description, "CC")?;
    let experimental_condition = description_field(src, description, "EC")?;

    Ok(SampleSheetRecord {
        sample_id: fields[0].to_string(),
        cell_call,
        experimental_condition,
        sample_well: or_default(fields[3], "R1_C1"),
        sample_plate: or_default(fields[2], "R1-C1"),
        i5_index: or_default(fields[4], "i5-1"),
        i7_index: or_default(fields[6], "i7-1"),
    })
}

/// Looks up `key` within a semicolon-delimited `key=value` description.
fn description_field(src: &Path, description: &str, key: &str) -> Result<String> {
    for part in description.split(';') {
        let mut fields = part.split('=');

        if fields.next() == Some(key) {
            return match fields.next() {
                Some(value) => Ok(value.to_string()),
                None => Err(Error::malformed(
                    src,
                    format!("description entry '{}' has no value", part),
                )),
            };
        }
    }

    Err(Error::malformed(
        src,
        format!("description '{}' is missing the '{}' entry", description, key),
    ))
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
