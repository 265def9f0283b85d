//! The mapper: turns one query's seeds into chained, gap-verified,
//! identity-scored overlaps against the currently resident target block.
//!
//! Pipeline per query: collect hits from the seed index, sort them by the
//! composite diagonal key, chain, optionally deduplicate tandem chains,
//! refine every surviving anchor with a two-pass banded SES alignment, and
//! apply the final thresholds.

use serde::{Deserialize, Serialize};

use crate::chain::{form_diagonal_anchors, pack_hit_with_diagonal, ChainParams};
use crate::index::SeedIndex;
use crate::overlap::{Overlap, IDENTITY_UNDEFINED};
use crate::seed::utils::reverse_complement;
use crate::seed::SeedWord;
use crate::seqdb::{Sequence, SequenceBlock};
use crate::ses::banded_ses_distance;
use crate::types::SeedHit;

/// Result type for mapping operations
pub type MapperResult<T> = Result<T, MapperError>;

#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Target sequence {0} is not resident in the current block")]
    TargetNotLoaded(i32),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MapperParams {
    pub min_query_len: i32,
    pub min_target_len: i32,
    pub chain_bandwidth: i32,
    pub min_num_seeds: i32,
    pub min_chain_span: i32,
    pub skip_self_hits: bool,
    pub skip_symmetric_overlaps: bool,
    /// Keep only the longest chain per target (tandem-repeat dedup).
    pub one_hit_per_target: bool,
    /// Alignment band as a fraction of the shorter sequence length.
    pub align_bandwidth: f64,
    /// Diff budget as a fraction of the query length.
    pub align_max_diff: f64,
    pub min_identity: f64,
    pub min_mapped_span: i32,
}

impl Default for MapperParams {
    fn default() -> Self {
        Self {
            min_query_len: 50,
            min_target_len: 50,
            chain_bandwidth: 100,
            min_num_seeds: 3,
            min_chain_span: 1000,
            skip_self_hits: true,
            skip_symmetric_overlaps: false,
            one_hit_per_target: false,
            align_bandwidth: 0.01,
            align_max_diff: 0.03,
            min_identity: 98.0,
            min_mapped_span: 1000,
        }
    }
}

pub struct Mapper {
    params: MapperParams,
}

impl Mapper {
    pub fn new(params: MapperParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MapperParams {
        &self.params
    }

    /// Map one query against the resident target block.
    pub fn map(
        &self,
        target_seqs: &SequenceBlock,
        index: &SeedIndex,
        query: &Sequence,
        query_seeds: &[SeedWord],
        freq_cutoff: i64,
    ) -> MapperResult<Vec<Overlap>> {
        if query.len() < self.params.min_query_len {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SeedHit> = Vec::new();
        index.collect_hits(query_seeds, freq_cutoff, &mut hits);
        hits.sort_unstable_by_key(pack_hit_with_diagonal);

        let chain_params = ChainParams {
            chain_bandwidth: self.params.chain_bandwidth,
            min_num_seeds: self.params.min_num_seeds,
            min_chain_span: self.params.min_chain_span,
            skip_self_hits: self.params.skip_self_hits,
            skip_symmetric_overlaps: self.params.skip_symmetric_overlaps,
        };
        let mut overlaps = form_diagonal_anchors(
            &hits,
            query.id,
            query.len(),
            index.sequence_lengths(),
            &chain_params,
        );

        if self.params.one_hit_per_target {
            overlaps = filter_tandem_overlaps(overlaps);
        }

        let reverse_query = reverse_complement(&query.bases);
        let mut aligned = Vec::with_capacity(overlaps.len());
        for ovl in &overlaps {
            let target = target_seqs
                .get(ovl.b_id)
                .ok_or(MapperError::TargetNotLoaded(ovl.b_id))?;
            aligned.push(self.align_overlap(target, query, &reverse_query, ovl)?);
        }

        Ok(filter_overlaps(aligned, &self.params))
    }

    /// Refine one anchor with the two-pass banded SES alignment and compute
    /// its identity.
    fn align_overlap(
        &self,
        target: &Sequence,
        query: &Sequence,
        reverse_query: &[u8],
        ovl: &Overlap,
    ) -> MapperResult<Overlap> {
        let mut ret = ovl.clone();
        let d_max_total = (ovl.a_len as f64 * self.params.align_max_diff) as i32;
        let bandwidth = (ovl.a_len.min(ovl.b_len) as f64 * self.params.align_bandwidth) as i32;
        let diffs_right;

        // Forward pass: extend from the anchor start toward the 3' ends.
        {
            let q_start = ovl.a_start as usize;
            let t_start_fwd = if ovl.b_rev {
                ovl.b_len - ovl.b_end
            } else {
                ovl.b_start
            };
            let t_end_fwd = if ovl.b_rev {
                ovl.b_len - ovl.b_start
            } else {
                ovl.b_end
            };
            let tseq = if ovl.b_rev {
                fetch_target_subsequence(&target.bases, 0, t_end_fwd, true)?
            } else {
                fetch_target_subsequence(&target.bases, t_start_fwd, ovl.b_len, false)?
            };

            let ses = banded_ses_distance(&query.bases[q_start..], &tseq, d_max_total, bandwidth);
            ret.a_end = ovl.a_start + ses.last_query_pos;
            ret.b_end = ovl.b_start + ses.last_target_pos;
            ret.edit_distance = ses.diffs;
            ret.score = -ret.a_span().max(ret.b_span());
            diffs_right = ses.diffs;
        }

        // Reverse pass: extend the reverse-complemented query prefix with
        // whatever diff budget the forward pass left, clamped at zero.
        {
            let q_start = (ret.a_len - ret.a_start) as usize;
            let t_start_fwd = if ret.b_rev {
                ret.b_len - ret.b_end
            } else {
                ret.b_start
            };
            let t_end_fwd = if ret.b_rev {
                ret.b_len - ret.b_start
            } else {
                ret.b_end
            };
            let tseq = if ovl.b_rev {
                fetch_target_subsequence(&target.bases, t_end_fwd, ret.b_len, !ret.b_rev)?
            } else {
                fetch_target_subsequence(&target.bases, 0, t_start_fwd, !ret.b_rev)?
            };

            let d_max = (d_max_total - diffs_right).max(0);
            let ses = banded_ses_distance(&reverse_query[q_start..], &tseq, d_max, bandwidth);
            ret.a_start = ovl.a_start - ses.last_query_pos;
            ret.b_start = ovl.b_start - ses.last_target_pos;
            ret.edit_distance = diffs_right + ses.diffs;
            ret.score = -ret.a_span().max(ret.b_span());

            let span = ret.a_span().max(ret.b_span()) as f32;
            ret.identity = if span > 0.0 {
                100.0 * (span - ret.edit_distance as f32) / span
            } else {
                IDENTITY_UNDEFINED
            };
        }

        Ok(ret)
    }
}

/// Keep only the longest chain per target, dropping the shorter chains of
/// tandem-repeat diagonal families.
fn filter_tandem_overlaps(overlaps: Vec<Overlap>) -> Vec<Overlap> {
    if overlaps.is_empty() {
        return overlaps;
    }

    let max_span = |ovl: &Overlap| ovl.a_span().max(ovl.b_span());
    let mut sorted = overlaps;
    sorted.sort_by(|a, b| a.b_id.cmp(&b.b_id).then(max_span(b).cmp(&max_span(a))));

    let mut ret: Vec<Overlap> = Vec::new();
    for ovl in sorted {
        if ret.last().map(|prev| prev.b_id) != Some(ovl.b_id) {
            ret.push(ovl);
        }
    }
    ret
}

fn filter_overlaps(overlaps: Vec<Overlap>, params: &MapperParams) -> Vec<Overlap> {
    overlaps
        .into_iter()
        .filter(|ovl| {
            !((ovl.identity as f64) < params.min_identity
                || ovl.a_span() < params.min_mapped_span
                || ovl.b_span() < params.min_mapped_span
                || ovl.num_seeds < params.min_num_seeds
                || ovl.a_len < params.min_query_len
                || ovl.b_len < params.min_target_len)
        })
        .collect()
}

/// Slice `[seq_start, seq_end)` out of a target, reverse-complemented on
/// demand. A `seq_end` of zero selects the full sequence length; the guards
/// in front make that branch unreachable in practice, but it stays to keep
/// the fetch semantics stable.
fn fetch_target_subsequence(
    bases: &[u8],
    seq_start: i32,
    seq_end: i32,
    rev_cmp: bool,
) -> MapperResult<Vec<u8>> {
    let seq_len = bases.len() as i32;
    if seq_end == seq_start {
        return Ok(Vec::new());
    }
    if seq_start < 0 || seq_end < 0 || seq_start > seq_len || seq_end > seq_len || seq_end < seq_start
    {
        return Err(MapperError::InvalidCoordinates(format!(
            "seq_start = {seq_start}, seq_end = {seq_end}, seq_len = {seq_len}, rev_cmp = {rev_cmp}"
        )));
    }
    let seq_end = if seq_end == 0 { seq_len } else { seq_end };

    let slice = &bases[seq_start as usize..seq_end as usize];
    Ok(if rev_cmp {
        reverse_complement(slice)
    } else {
        slice.to_vec()
    })
}
