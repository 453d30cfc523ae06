//! Merging of already-extracted metrics tables.
//!
//! Downstream summary steps combine the extraction output with tables
//! produced elsewhere in the pipeline (copy number calls, clustering order,
//! and the like). Those tables share a key column but rarely cover the same
//! set of samples, so this module folds an arbitrary list of delimited files
//! into one table with a configurable join key, join flavor, and fill text
//! for the gaps an outer join leaves behind.

use std::path::PathBuf;

use tracing::info;

use crate::errors::Error;
use crate::errors::Result;
use crate::table::Join;
use crate::table::Table;

pub mod command;

/// Configuration for one merge run.
#[derive(Clone, Debug)]
pub struct MergeConfig {
    /// Tables to merge, folded left to right.
    pub src: Vec<PathBuf>,

    /// Path the merged table is written to.
    pub output: PathBuf,

    /// Column the tables are joined on.
    pub on: String,

    /// How records missing from one side of a join are treated.
    pub how: Join,

    /// Text written for cells holding no value after an outer join.
    pub fill: String,

    /// Field delimiter of the input and output tables.
    pub delimiter: u8,
}

/// Runs a full merge: reads every source table, folds them into one from
/// left to right, and writes the result to the configured output path. The
/// merged table is returned.
pub fn run(config: &MergeConfig) -> Result<Table> {
    let mut merged: Option<Table> = None;

    for src in &config.src {
        let table = Table::read_csv(src, config.delimiter)?;
        info!("  [*] {}: {} record(s)", src.display(), table.len());

        merged = match merged {
            Some(left) => Some(left.join(table, &config.on, config.how)?),
            None => Some(table),
        };
    }

    let merged = merged.ok_or(Error::NoInputTables)?;
    merged.write_csv(&config.output, config.delimiter, &config.fill)?;

    Ok(merged)
}
