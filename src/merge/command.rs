//! Functionality related to the `scqc merge` command itself.

use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use clap::Args;
use num_format::Locale;
use num_format::ToFormattedString;
use tracing::debug;
use tracing::info;

use crate::merge;
use crate::merge::MergeConfig;
use crate::table::Join;
use crate::table::SAMPLE_ID;

//========================//
// Command line arguments //
//========================//

/// Command line arguments for `scqc merge`.
#[derive(Args)]
pub struct MergeArgs {
    /// Delimited tables to merge, folded left to right.
    #[arg(value_name = "TABLE", num_args = 2.., required = true)]
    src: Vec<PathBuf>,

    /// Path to the file where the merged table will be written.
    #[arg(short = 'o', long, value_name = "PATH")]
    output: PathBuf,

    /// Column to join the tables on.
    #[arg(long, value_name = "COLUMN", default_value = SAMPLE_ID)]
    on: String,

    /// How records missing from one of the tables are treated.
    #[arg(long, value_enum, default_value_t = Join::Inner)]
    how: Join,

    /// Text written for cells holding no value after an outer join.
    #[arg(long, value_name = "STRING", default_value = "NA")]
    fill: String,

    /// Field delimiter used by the input and output tables.
    #[arg(short = 'd', long, value_name = "CHAR", default_value_t = ',')]
    delimiter: char,
}

//==============//
// Main command //
//==============//

/// Main method for the `scqc merge` subcommand.
pub fn merge(args: MergeArgs) -> anyhow::Result<()> {
    info!("Starting merge command...");
    debug!("Arguments:");
    debug!("  [*] Sources: {:?}", args.src);
    debug!("  [*] Output: {}", args.output.display());
    debug!("  [*] Join on: {}", args.on);
    debug!("  [*] Join flavor: {}", args.how);
    debug!("  [*] Fill: {:?}", args.fill);

    if !args.delimiter.is_ascii() {
        bail!("delimiter must be an ASCII character: {:?}", args.delimiter);
    }

    let config = MergeConfig {
        src: args.src,
        output: args.output,
        on: args.on,
        how: args.how,
        fill: args.fill,
        delimiter: args.delimiter as u8,
    };

    let table = merge::run(&config).context("merging tables")?;

    info!(
        "  [*] Wrote {} record(s) to {}.",
        table.len().to_formatted_string(&Locale::en),
        config.output.display()
    );

    Ok(())
}
