//! The overlap pipeline driver.
//!
//! Blocks are the unit of memory residency: one target block (sequences,
//! seeds and the index built over them) is resident at a time, and the
//! queries of each query block fan out across rayon workers against it.
//! A failing block load is logged and skipped; a failing query yields an
//! empty overlap list and never aborts the batch. Cancellation is
//! cooperative, checked between blocks and between queries.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::index::{SeedIndex, SeedIndexError};
use crate::mapper::{Mapper, MapperParams};
use crate::overlap::Overlap;
use crate::seeddb::{validate_matching_params, validate_paired, SeedDbError, SeedDbReader};
use crate::seqdb::{SeqDbError, SeqDbReader};

/// Result type for pipeline runs
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("SeqDB error: {0}")]
    SeqDb(#[from] SeqDbError),

    #[error("SeedDB error: {0}")]
    SeedDb(#[from] SeedDbError),

    #[error("Seed index error: {0}")]
    SeedIndex(#[from] SeedIndexError),
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineParams {
    pub mapper: MapperParams,
    /// Fraction of the most frequent seed keys suppressed per target block.
    pub freq_percentile: f64,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            mapper: MapperParams::default(),
            freq_percentile: 0.0002,
        }
    }
}

/// The overlaps of one query, in chain order after tandem dedup.
#[derive(Debug, Clone)]
pub struct QueryOverlaps {
    pub query_id: i32,
    pub query_header: String,
    pub overlaps: Vec<Overlap>,
}

/// Map every query against every target block, feeding per-query results to
/// `sink` in query order within each block pair. There is no total order
/// across queries.
pub fn run_overlaps<F>(
    target_seqdb: &mut SeqDbReader,
    target_seeddb: &mut SeedDbReader,
    query_seqdb: &mut SeqDbReader,
    query_seeddb: &mut SeedDbReader,
    params: &PipelineParams,
    cancel: &AtomicBool,
    mut sink: F,
) -> PipelineResult<()>
where
    F: FnMut(QueryOverlaps),
{
    validate_paired(target_seqdb.index(), target_seeddb.index())?;
    validate_paired(query_seqdb.index(), query_seeddb.index())?;
    validate_matching_params(query_seeddb.index(), target_seeddb.index())?;

    let k = target_seeddb.index().params.k;
    let target_lens = target_seeddb.index().sequence_lengths();
    let mapper = Mapper::new(params.mapper);

    let num_target_blocks = target_seeddb.index().num_blocks();
    let num_query_blocks = query_seeddb.index().num_blocks();

    for target_block_id in 0..num_target_blocks {
        if cancel.load(Ordering::Relaxed) {
            log::info!("overlap run cancelled before target block {target_block_id}");
            break;
        }

        let target_seqs = match target_seqdb.load_block(target_block_id) {
            Ok(block) => block,
            Err(e) => {
                log::error!("skipping target block {target_block_id}: {e}");
                continue;
            }
        };
        let target_seeds = match target_seeddb.load_block(target_block_id) {
            Ok(block) => block,
            Err(e) => {
                log::error!("skipping target block {target_block_id}: {e}");
                continue;
            }
        };

        let index = SeedIndex::new(target_seeds.into_seeds(), target_lens.clone(), k);
        let freq_cutoff = match index.frequency_stats(params.freq_percentile) {
            Ok(stats) => {
                log::debug!(
                    "target block {target_block_id}: seed frequency max = {}, avg = {:.2}, \
                     median = {:.2}, cutoff = {}",
                    stats.max,
                    stats.avg,
                    stats.median,
                    stats.cutoff
                );
                stats.cutoff
            }
            Err(SeedIndexError::Empty) => 0,
            Err(e) => return Err(e.into()),
        };

        for query_block_id in 0..num_query_blocks {
            if cancel.load(Ordering::Relaxed) {
                break;
            }

            let query_seqs = match query_seqdb.load_block(query_block_id) {
                Ok(block) => block,
                Err(e) => {
                    log::error!("skipping query block {query_block_id}: {e}");
                    continue;
                }
            };
            let query_seeds = match query_seeddb.load_block(query_block_id) {
                Ok(block) => block,
                Err(e) => {
                    log::error!("skipping query block {query_block_id}: {e}");
                    continue;
                }
            };

            let results: Vec<QueryOverlaps> = query_seqs
                .sequences()
                .par_iter()
                .map(|query| {
                    if cancel.load(Ordering::Relaxed) {
                        return QueryOverlaps {
                            query_id: query.id,
                            query_header: query.header.clone(),
                            overlaps: Vec::new(),
                        };
                    }
                    let seeds = query_seeds.seeds_for(query.id).unwrap_or(&[]);
                    let overlaps = match mapper.map(&target_seqs, &index, query, seeds, freq_cutoff)
                    {
                        Ok(overlaps) => overlaps,
                        Err(e) => {
                            log::warn!("query {} ('{}') failed: {e}", query.id, query.header);
                            Vec::new()
                        }
                    };
                    QueryOverlaps {
                        query_id: query.id,
                        query_header: query.header.clone(),
                        overlaps,
                    }
                })
                .collect();

            for result in results {
                sink(result);
            }
        }

        log::info!(
            "finished target block {}/{}",
            target_block_id + 1,
            num_target_blocks
        );
    }

    Ok(())
}
