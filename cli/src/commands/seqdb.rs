//! The `seqdb` subcommand: FASTA/FASTQ in, SeqDB out.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pancake_core::fasta::import_fastx;
use pancake_core::{SeqDbWriter, SeqDbWriterParams};

const MB: f64 = 1024.0 * 1024.0;

#[derive(Args)]
pub struct SeqdbArgs {
    /// The prefix of the output SeqDB files
    pub prefix: PathBuf,

    /// Input FASTA/FASTQ files, optionally gzipped
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Sequence buffer size in MB. Has to be >= 0.0
    #[arg(long, default_value_t = 8.0)]
    pub buffer_size: f64,

    /// Block size in MB of stored payload
    #[arg(long, default_value_t = 100.0)]
    pub block_size: f64,

    /// Payload file rotation threshold in MB
    #[arg(long, default_value_t = 1024.0)]
    pub file_block_size: f64,

    /// Store raw ASCII bases instead of the 2-bit packing
    #[arg(long)]
    pub uncompressed: bool,
}

pub fn run(args: &SeqdbArgs) -> Result<()> {
    let params = SeqDbWriterParams {
        use_compression: !args.uncompressed,
        flush_size: (args.buffer_size * MB) as i64,
        file_block_size: (args.file_block_size * MB) as i64,
        block_size: (args.block_size * MB) as i64,
    };
    let mut writer = SeqDbWriter::new(&args.prefix, params)
        .with_context(|| format!("creating a SeqDB at prefix '{}'", args.prefix.display()))?;

    let mut total = 0usize;
    for input in &args.inputs {
        let count = import_fastx(input, &mut writer)
            .with_context(|| format!("importing '{}'", input.display()))?;
        log::info!("imported {count} sequences from '{}'", input.display());
        total += count;
    }
    writer.finish().context("finalizing the SeqDB")?;
    log::info!(
        "wrote {total} sequences to '{}.seqdb'",
        args.prefix.display()
    );
    Ok(())
}
