//! The `overlap` subcommand: all-vs-all overlapping, M4 rows to stdout.

use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::Args;

use pancake_core::{
    run_overlaps, MapperParams, PipelineParams, SeedDbReader, SeqDbReader,
};

#[derive(Args)]
pub struct OverlapArgs {
    /// Prefix of the target SeqDB/SeedDB pair
    pub target_prefix: PathBuf,

    /// Prefix of the query SeqDB/SeedDB pair
    pub query_prefix: PathBuf,

    /// Fraction of the most frequent seed keys to suppress per target block
    #[arg(long, default_value_t = 0.0002)]
    pub freq_percentile: f64,

    /// Minimum overlap identity in percent
    #[arg(long, default_value_t = 98.0)]
    pub min_idt: f64,

    /// Minimum mapped span on either sequence
    #[arg(long, default_value_t = 1000)]
    pub min_map_len: i32,

    /// Minimum query length
    #[arg(long, default_value_t = 50)]
    pub min_qlen: i32,

    /// Minimum number of seeds in a chain
    #[arg(long, default_value_t = 3)]
    pub min_num_seeds: i32,

    /// Diagonal bandwidth for chaining
    #[arg(long, default_value_t = 100)]
    pub chain_bandwidth: i32,

    /// Minimum chain span on either sequence
    #[arg(long, default_value_t = 1000)]
    pub min_chain_span: i32,

    /// Alignment band as a fraction of the shorter sequence length
    #[arg(long, default_value_t = 0.01)]
    pub align_bandwidth: f64,

    /// Alignment diff budget as a fraction of the query length
    #[arg(long, default_value_t = 0.03)]
    pub align_max_diff: f64,

    /// Allow only one overlap per query-target pair (tandem dedup)
    #[arg(long)]
    pub one_hit_per_target: bool,

    /// Keep only overlaps where the target ID is smaller than the query ID
    #[arg(long)]
    pub skip_symmetric: bool,

    /// Keep query self-hits
    #[arg(long)]
    pub allow_self_hits: bool,

    /// Print numeric sequence IDs instead of headers
    #[arg(long)]
    pub write_ids: bool,
}

pub fn run(args: &OverlapArgs) -> Result<()> {
    let open_pair = |prefix: &PathBuf| -> Result<(SeqDbReader, SeedDbReader)> {
        let seqdb_path = PathBuf::from(format!("{}.seqdb", prefix.display()));
        let seeddb_path = PathBuf::from(format!("{}.seeddb", prefix.display()));
        let seqdb = SeqDbReader::open(&seqdb_path)
            .with_context(|| format!("opening SeqDB '{}'", seqdb_path.display()))?;
        let seeddb = SeedDbReader::open(&seeddb_path)
            .with_context(|| format!("opening SeedDB '{}'", seeddb_path.display()))?;
        Ok((seqdb, seeddb))
    };

    let (mut target_seqdb, mut target_seeddb) = open_pair(&args.target_prefix)?;
    let (mut query_seqdb, mut query_seeddb) = open_pair(&args.query_prefix)?;

    let params = PipelineParams {
        mapper: MapperParams {
            min_query_len: args.min_qlen,
            min_target_len: args.min_qlen,
            chain_bandwidth: args.chain_bandwidth,
            min_num_seeds: args.min_num_seeds,
            min_chain_span: args.min_chain_span,
            skip_self_hits: !args.allow_self_hits,
            skip_symmetric_overlaps: args.skip_symmetric,
            one_hit_per_target: args.one_hit_per_target,
            align_bandwidth: args.align_bandwidth,
            align_max_diff: args.align_max_diff,
            min_identity: args.min_idt,
            min_mapped_span: args.min_map_len,
        },
        freq_percentile: args.freq_percentile,
    };

    let target_headers: Vec<String> = target_seqdb
        .index()
        .seq_lines
        .iter()
        .map(|sl| sl.header.clone())
        .collect();

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let cancel = AtomicBool::new(false);
    let mut num_overlaps = 0u64;

    run_overlaps(
        &mut target_seqdb,
        &mut target_seeddb,
        &mut query_seqdb,
        &mut query_seeddb,
        &params,
        &cancel,
        |result| {
            for ovl in &result.overlaps {
                let row = if args.write_ids {
                    ovl.to_m4_row(None, None)
                } else {
                    ovl.to_m4_row(
                        Some(&result.query_header),
                        target_headers.get(ovl.b_id as usize).map(String::as_str),
                    )
                };
                if let Err(e) = writeln!(out, "{row}") {
                    log::error!("failed to write an overlap row: {e}");
                }
                num_overlaps += 1;
            }
        },
    )
    .context("running the overlap pipeline")?;

    out.flush()?;
    log::info!("wrote {num_overlaps} overlaps");
    Ok(())
}
