//! In-memory tables of per-sample quality control metrics.
//!
//! Everything this tool extracts or aggregates flows through a [`Table`]: an
//! ordered list of column names plus one [`Record`] per sample. Column order
//! is significant from end to end. The first record pushed into a table fixes
//! the column set, every later record must match it exactly, and the CSV
//! writer emits columns in exactly that order. Keeping the order in the data
//! structure (rather than sorting at write time) is what lets each extractor
//! define the layout of its section of the final report.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::errors::Error;
use crate::errors::Result;

pub mod join;
pub mod value;

pub use self::join::Join;
pub use self::value::Value;

//==================//
// Useful constants //
//==================//

/// The column on which per-sample metrics tables are joined.
pub const SAMPLE_ID: &str = "sample_id";

//=========//
// Records //
//=========//

/// A single row within a [`Table`]: an insertion-ordered mapping from column
/// name to cell value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Record(IndexMap::new())
    }

    /// Appends a column to the record (or overwrites it in place if the
    /// column already exists).
    pub fn insert<V>(&mut self, column: &str, value: V)
    where
        V: Into<Value>,
    {
        self.0.insert(column.to_string(), value.into());
    }

    /// Gets the value stored under `column`, if any.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// The column names of this record in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Iterates over the `(column, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// The number of columns in this record.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record holds no columns at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (String, Value)>,
    {
        Record(iter.into_iter().collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

//========//
// Tables //
//========//

/// An ordered collection of [`Record`]s sharing one column layout.
#[derive(Clone, Debug)]
pub struct Table {
    /// Human-readable name used in log lines and error messages.
    name: String,

    /// Column names in output order.
    columns: Vec<String>,

    /// One record per sample, in the order they were pushed.
    rows: Vec<Record>,
}

impl Table {
    /// Creates an empty table with no columns. The first record pushed into
    /// the table establishes the column layout.
    pub fn new<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Table {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Creates an empty table with a fixed column layout.
    ///
    /// Extractors use this so that a table keeps its header even when no
    /// reports were found to fill it.
    pub fn with_columns<S>(name: S, columns: &[&str]) -> Self
    where
        S: Into<String>,
    {
        Table {
            name: name.into(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// The name of this table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column names of this table in output order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The records of this table in insertion order.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// The number of records in this table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether this table holds no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a record to the table.
    ///
    /// The first record pushed fixes the table's columns. Every subsequent
    /// record must carry exactly the same columns in the same order, else an
    /// [`Error::MismatchedColumns`] is returned.
    pub fn push(&mut self, record: Record) -> Result<()> {
        if self.columns.is_empty() && self.rows.is_empty() {
            self.columns = record.columns().cloned().collect();
        } else if !record.columns().eq(self.columns.iter()) {
            return Err(Error::MismatchedColumns {
                table: self.name.clone(),
                reason: format!(
                    "expected [{}], found [{}]",
                    self.columns.iter().join(", "),
                    record.columns().join(", ")
                ),
            });
        }

        self.rows.push(record);
        Ok(())
    }

    /// Inserts a new column at the front of the table, assigning `value` to
    /// every existing record. Errors if the column already exists.
    pub fn prepend_column<V>(&mut self, column: &str, value: V) -> Result<()>
    where
        V: Into<Value>,
    {
        if self.columns.iter().any(|c| c == column) {
            return Err(Error::MismatchedColumns {
                table: self.name.clone(),
                reason: format!("column '{}' already exists", column),
            });
        }

        let value = value.into();
        self.columns.insert(0, column.to_string());

        for row in &mut self.rows {
            let mut rebuilt = IndexMap::with_capacity(row.len() + 1);
            rebuilt.insert(column.to_string(), value.clone());
            rebuilt.extend(row.0.drain(..));
            row.0 = rebuilt;
        }

        Ok(())
    }

    /// Reads a delimited file into a table.
    ///
    /// The first line is taken as the header. Empty fields become
    /// [`Value::Null`]; everything else is carried through verbatim as text.
    /// The table is named after the file stem.
    pub fn read_csv<P>(src: P, delimiter: u8) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let src = src.as_ref();

        if !src.exists() {
            return Err(Error::MissingRequiredFile {
                path: src.to_path_buf(),
            });
        }

        let name = src
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| String::from("table"));

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .from_path(src)
            .map_err(|e| read_error(src, e))?;

        let headers = reader.headers().map_err(|e| read_error(src, e))?.clone();

        let mut seen = HashSet::new();
        for column in headers.iter() {
            if !seen.insert(column) {
                return Err(Error::malformed(
                    src,
                    format!("duplicate column '{}'", column),
                ));
            }
        }

        // Seed the columns from the header so that a file holding nothing
        // but a header line still reads back as a table with that layout.
        let mut table = Table::new(name);
        table.columns = headers.iter().map(|column| column.to_string()).collect();

        for result in reader.records() {
            let row = result.map_err(|e| read_error(src, e))?;

            let record = headers
                .iter()
                .zip(row.iter())
                .map(|(column, field)| {
                    let value = if field.is_empty() {
                        Value::Null
                    } else {
                        Value::from(field)
                    };

                    (column.to_string(), value)
                })
                .collect::<Record>();

            table.push(record)?;
        }

        Ok(table)
    }

    /// Writes the table to `dst` as a delimited file.
    ///
    /// The header line lists the table's columns in order. [`Value::Null`]
    /// cells are rendered as `na_rep`; all other values use their display
    /// form (in particular, not-a-number floats render as `nan`).
    pub fn write_csv<P>(&self, dst: P, delimiter: u8, na_rep: &str) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let dst = dst.as_ref();

        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(dst)
            .map_err(|source| Error::Write {
                path: dst.to_path_buf(),
                source,
            })?;

        writer
            .write_record(&self.columns)
            .map_err(|source| Error::Write {
                path: dst.to_path_buf(),
                source,
            })?;

        for row in &self.rows {
            let fields = self.columns.iter().map(|column| match row.get(column) {
                Some(value) if !value.is_null() => value.to_string(),
                _ => na_rep.to_string(),
            });

            writer.write_record(fields).map_err(|source| Error::Write {
                path: dst.to_path_buf(),
                source,
            })?;
        }

        writer.flush().map_err(|source| Error::Write {
            path: dst.to_path_buf(),
            source: source.into(),
        })?;

        Ok(())
    }
}

/// Classifies a failure from the CSV reader: I/O problems surface as read
/// errors, anything else means the file's contents were malformed.
fn read_error(path: &Path, err: csv::Error) -> Error {
    let message = err.to_string();

    match err.into_kind() {
        csv::ErrorKind::Io(source) => Error::Read {
            path: path.to_path_buf(),
            source,
        },
        _ => Error::malformed(path, message),
    }
}
