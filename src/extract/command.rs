//! Functionality related to the `scqc extract` command itself.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use num_format::Locale;
use num_format::ToFormattedString;
use tracing::debug;
use tracing::info;

use crate::extract;
use crate::extract::ExtractConfig;

//========================//
// Command line arguments //
//========================//

/// Command line arguments for `scqc extract`.
#[derive(Args)]
pub struct ExtractArgs {
    /// Metrics directory generated by the alignment pipeline.
    #[arg(value_name = "DIR")]
    metrics_dir: PathBuf,

    /// Path to the .csv file where the merged table will be written.
    #[arg(value_name = "CSV")]
    out_file: PathBuf,

    /// Optional identifier for the library, prepended as a constant column.
    #[arg(short = 'l', long, value_name = "STRING")]
    library_id: Option<String>,

    /// Optional sample sheet whose annotations are merged into the table.
    #[arg(short = 's', long, value_name = "PATH")]
    samplesheet: Option<PathBuf>,
}

//==============//
// Main command //
//==============//

/// Main method for the `scqc extract` subcommand.
pub fn extract(args: ExtractArgs) -> anyhow::Result<()> {
    info!("Starting extract command...");
    debug!("Arguments:");
    debug!("  [*] Metrics directory: {}", args.metrics_dir.display());
    debug!("  [*] Output file: {}", args.out_file.display());
    debug!("  [*] Library id: {:?}", args.library_id);
    debug!("  [*] Sample sheet: {:?}", args.samplesheet);

    let config = ExtractConfig {
        metrics_dir: args.metrics_dir,
        out_file: args.out_file,
        library_id: args.library_id,
        samplesheet: args.samplesheet,
    };

    let table = extract::run(&config).with_context(|| {
        format!("extracting metrics from {}", config.metrics_dir.display())
    })?;

    info!(
        "  [*] Wrote {} sample(s) to {}.",
        table.len().to_formatted_string(&Locale::en),
        config.out_file.display()
    );

    Ok(())
}
