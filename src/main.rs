use clap::Parser;
use clap::Subcommand;
use git_testament::git_testament;
use git_testament::render_testament;

use scqc::extract::command::ExtractArgs;
use scqc::merge::command::MergeArgs;

git_testament!(TESTAMENT);

/// Collects per-sample quality control metrics into one table per library.
#[derive(Parser)]
#[command(name = "scqc", version = render_testament!(TESTAMENT), propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Only errors are printed to the stderr stream.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// All available information, including debug information, is printed to
    /// stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extracts and merges the metrics tables within a metrics directory.
    Extract(ExtractArgs),

    /// Merges already-extracted delimited tables on a shared key column.
    Merge(MergeArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut level = tracing::Level::INFO;
    if cli.quiet {
        level = tracing::Level::ERROR;
    } else if cli.verbose {
        level = tracing::Level::DEBUG;
    }

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match cli.command {
        Commands::Extract(args) => scqc::extract::command::extract(args),
        Commands::Merge(args) => scqc::merge::command::merge(args),
    }
}
