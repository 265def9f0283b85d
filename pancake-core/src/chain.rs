//! Diagonal chaining of seed hits into overlap anchors.
//!
//! Hits are sorted by a 128-bit composite key packing
//! `(target_id, target_rev, diagonal, target_pos, query_pos)` so that one
//! linear scan sees each target/strand/diagonal family contiguously. A chain
//! breaks when the target or strand changes, or the diagonal drifts more
//! than `chain_bandwidth` from the chain's first hit. Chain endpoints come
//! from the hits with the minimum and maximum packed
//! `(target_pos << 32 | query_pos)` combo.

use crate::overlap::Overlap;
use crate::types::SeedHit;

const MASK_32BIT: u128 = 0xFFFF_FFFF;

/// Composite sort key. The layout mirrors the lexicographic chain order;
/// a plain wide-integer sort replaces a custom comparator.
#[inline]
pub fn pack_hit_with_diagonal(hit: &SeedHit) -> u128 {
    let diag = hit.target_pos.wrapping_sub(hit.query_pos);
    (((hit.target_id as u32 as u128) & MASK_32BIT) << 97)
        | ((hit.target_rev as u128) << 96)
        | (((diag as u32 as u128) & MASK_32BIT) << 64)
        | (((hit.target_pos as u32 as u128) & MASK_32BIT) << 32)
        | ((hit.query_pos as u32 as u128) & MASK_32BIT)
}

/// Chaining thresholds; a subset of the mapper settings.
#[derive(Debug, Clone, Copy)]
pub struct ChainParams {
    pub chain_bandwidth: i32,
    pub min_num_seeds: i32,
    pub min_chain_span: i32,
    pub skip_self_hits: bool,
    pub skip_symmetric_overlaps: bool,
}

fn make_overlap(
    sorted_hits: &[SeedHit],
    query_id: i32,
    query_len: i32,
    target_lens: &[i32],
    begin_id: usize,
    end_id: usize,
    min_pos_id: usize,
    max_pos_id: usize,
) -> Overlap {
    let begin_hit = &sorted_hits[min_pos_id];
    let end_hit = &sorted_hits[max_pos_id];
    debug_assert_eq!(
        begin_hit.target_id, end_hit.target_id,
        "chain endpoints must share a target"
    );

    let target_id = begin_hit.target_id;
    let num_seeds = (end_id - begin_id) as i32;
    let target_len = target_lens[target_id as usize];

    Overlap::new(
        query_id,
        target_id,
        num_seeds,
        0.0,
        false,
        begin_hit.query_pos,
        end_hit.query_pos,
        query_len,
        begin_hit.target_rev,
        begin_hit.target_pos,
        end_hit.target_pos,
        target_len,
        -1,
        num_seeds,
    )
}

fn keep_overlap(ovl: &Overlap, params: &ChainParams) -> bool {
    ovl.num_seeds >= params.min_num_seeds
        && ovl.a_span() > params.min_chain_span
        && ovl.b_span() > params.min_chain_span
        && (!params.skip_self_hits || ovl.b_id != ovl.a_id)
        && (!params.skip_symmetric_overlaps || ovl.b_id < ovl.a_id)
}

/// Group hits (already sorted by [`pack_hit_with_diagonal`]) into overlap
/// anchors.
pub fn form_diagonal_anchors(
    sorted_hits: &[SeedHit],
    query_id: i32,
    query_len: i32,
    target_lens: &[i32],
    params: &ChainParams,
) -> Vec<Overlap> {
    if sorted_hits.is_empty() {
        return Vec::new();
    }

    let mut overlaps = Vec::new();
    let num_hits = sorted_hits.len();

    let mut begin_id = 0usize;
    let mut begin_diag = sorted_hits[0].diagonal();

    let combo = |hit: &SeedHit| -> u64 {
        ((hit.target_pos as u32 as u64) << 32) | (hit.query_pos as u32 as u64)
    };
    let mut min_combo = combo(&sorted_hits[0]);
    let mut max_combo = min_combo;
    let mut min_pos_id = 0usize;
    let mut max_pos_id = 0usize;

    for i in 0..num_hits {
        let prev_hit = &sorted_hits[begin_id];
        let curr_hit = &sorted_hits[i];
        let curr_diag = curr_hit.diagonal();
        let diag_diff = (curr_diag - begin_diag).abs();
        let curr_combo = combo(curr_hit);

        if curr_hit.target_id != prev_hit.target_id
            || curr_hit.target_rev != prev_hit.target_rev
            || diag_diff > params.chain_bandwidth
        {
            let ovl = make_overlap(
                sorted_hits,
                query_id,
                query_len,
                target_lens,
                begin_id,
                i,
                min_pos_id,
                max_pos_id,
            );
            begin_id = i;
            begin_diag = curr_diag;
            if keep_overlap(&ovl, params) {
                overlaps.push(ovl);
            }
            min_pos_id = i;
            max_pos_id = i;
            min_combo = curr_combo;
            max_combo = curr_combo;
        }

        if curr_combo < min_combo {
            min_pos_id = i;
            min_combo = curr_combo;
        }
        if curr_combo > max_combo {
            max_pos_id = i;
            max_combo = curr_combo;
        }
    }

    if num_hits > begin_id {
        let ovl = make_overlap(
            sorted_hits,
            query_id,
            query_len,
            target_lens,
            begin_id,
            num_hits,
            min_pos_id,
            max_pos_id,
        );
        if keep_overlap(&ovl, params) {
            overlaps.push(ovl);
        }
    }

    overlaps
}
