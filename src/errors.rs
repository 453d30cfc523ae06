//! Error types shared across the crate.
//!
//! The taxonomy distinguishes inputs that are absent from inputs that exist
//! but do not look like the report format they claim to be. Conditions the
//! extraction recovers from locally (a tolerated missing insert-size report,
//! a zero duplication denominator, a sample dropped by an inner join) are
//! not errors and have no variant here.

use std::io;
use std::path::PathBuf;

/// Error type for every fallible operation in this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A directory or file that must exist for extraction to proceed does
    /// not.
    #[error("missing required input: {}", .path.display())]
    MissingRequiredFile {
        /// Path that was expected to exist.
        path: PathBuf,
    },

    /// An input file exists but its shape does not match the expected report
    /// format: a marker line is absent, a block is truncated, a column is
    /// unknown or unparsable, a histogram bucket is missing.
    #[error("malformed file {}: {reason}", .path.display())]
    MalformedFile {
        /// Path of the offending file.
        path: PathBuf,
        /// What, specifically, did not line up.
        reason: String,
    },

    /// The underlying read failed partway through an input.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path being read.
        path: PathBuf,
        /// Originating I/O error.
        source: io::Error,
    },

    /// The output table could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Path being written.
        path: PathBuf,
        /// Originating writer error.
        source: csv::Error,
    },

    /// A record was pushed onto a table whose column layout it does not
    /// share.
    #[error("record does not match the columns of table '{table}': {reason}")]
    MismatchedColumns {
        /// Name of the table being built.
        table: String,
        /// What disagreed.
        reason: String,
    },

    /// Two tables could not be joined.
    #[error("cannot merge '{left}' and '{right}': {reason}")]
    Merge {
        /// Name of the left table.
        left: String,
        /// Name of the right table.
        right: String,
        /// Why the join is impossible.
        reason: String,
    },

    /// A merge was requested with no input tables at all.
    #[error("no input tables to merge")]
    NoInputTables,
}

impl Error {
    /// Convenience constructor for [`Error::MalformedFile`].
    pub fn malformed<P, R>(path: P, reason: R) -> Self
    where
        P: Into<PathBuf>,
        R: Into<String>,
    {
        Error::MalformedFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias using this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
