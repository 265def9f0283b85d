use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::overlap::OverlapArgs;
use commands::seeddb::SeeddbArgs;
use commands::seqdb::SeqdbArgs;

#[derive(Parser)]
#[command(name = "pancake")]
#[command(about = "Pancake - all-vs-all overlap detection for HiFi reads")]
#[command(version)]
#[command(long_about = "
Pancake computes all-vs-all overlaps among long, low-error reads.

Typical run:
  pancake seqdb reads reads.fasta
  pancake seeddb reads.seqdb reads
  pancake overlap reads reads > overlaps.m4
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Number of worker threads (defaults to all cores)
    #[arg(short, long, global = true)]
    threads: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert FASTA/FASTQ files into a SeqDB
    Seqdb(SeqdbArgs),
    /// Compute minimizer seeds of a SeqDB into a SeedDB
    Seeddb(SeeddbArgs),
    /// Overlap a query DB pair against a target DB pair, writing M4 rows
    Overlap(OverlapArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    match &cli.command {
        Commands::Seqdb(args) => commands::seqdb::run(args),
        Commands::Seeddb(args) => commands::seeddb::run(args),
        Commands::Overlap(args) => commands::overlap::run(args),
    }
}
