//! The `seeddb` subcommand: compute minimizer seeds from a SeqDB.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pancake_core::{extract_seeds, SeedDbWriter, SeedDbWriterParams, SeedParams, SeqDbReader};

#[derive(Args)]
pub struct SeeddbArgs {
    /// Path to the SeqDB index to process
    pub input: PathBuf,

    /// The prefix of the output SeedDB files
    pub prefix: PathBuf,

    /// Kmer size for indexing
    #[arg(short, long, default_value_t = 30)]
    pub kmer_size: i32,

    /// Minimizer window size for indexing
    #[arg(short, long, default_value_t = 80)]
    pub window: i32,

    /// Enable homopolymer compression
    #[arg(long)]
    pub use_hpc: bool,

    /// Maximum length of a homopolymer to compress
    #[arg(long, default_value_t = 10)]
    pub max_hpc_len: i32,

    /// Write seeds for each block into a separate file
    #[arg(long)]
    pub split_blocks: bool,
}

pub fn run(args: &SeeddbArgs) -> Result<()> {
    let seed_params = SeedParams {
        k: args.kmer_size,
        w: args.window,
        use_hpc: args.use_hpc,
        max_hpc_len: args.max_hpc_len,
        use_rc: true,
    };

    let mut reader = SeqDbReader::open(&args.input)
        .with_context(|| format!("opening SeqDB '{}'", args.input.display()))?;
    let mut writer = SeedDbWriter::new(
        &args.prefix,
        seed_params,
        SeedDbWriterParams {
            split_blocks: args.split_blocks,
        },
    )
    .with_context(|| format!("creating a SeedDB at prefix '{}'", args.prefix.display()))?;

    let num_blocks = reader.index().num_blocks();
    for block_id in 0..num_blocks {
        let block = reader
            .load_block(block_id)
            .with_context(|| format!("loading SeqDB block {block_id}"))?;
        for seq in block.iter() {
            let seeds = extract_seeds(&seq.bases, seq.id, &seed_params)
                .with_context(|| format!("seeding sequence {} ('{}')", seq.id, seq.header))?;
            writer.add_seeds(&seq.header, seq.len(), &seeds)?;
        }
        writer.mark_block_end();
        log::debug!("seeded block {}/{num_blocks}", block_id + 1);
    }

    writer.finish().context("finalizing the SeedDB")?;
    log::info!(
        "wrote seeds for {} sequences to '{}.seeddb'",
        reader.index().num_sequences(),
        args.prefix.display()
    );
    Ok(())
}
