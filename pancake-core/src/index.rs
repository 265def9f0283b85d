//! The in-memory seed index.
//!
//! Built once per target block: the block's seed words are sorted by the
//! full 128-bit word (the key lives in the high bits, so equal keys land
//! contiguously) and a single scan records each equal-key run as a
//! `key -> [start, end)` range. The index is immutable afterwards and safe
//! to share across mapping workers.

use rustc_hash::FxHashMap;

use crate::seed::{decode_key, Seed, SeedWord};
use crate::types::SeedHit;

/// Result type for seed index queries
pub type SeedIndexResult<T> = Result<T, SeedIndexError>;

#[derive(Debug, thiserror::Error)]
pub enum SeedIndexError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Empty input: the index holds no seeds")]
    Empty,
}

/// Statistics of the equal-key run-length distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyStats {
    pub max: i64,
    pub avg: f64,
    pub median: f64,
    pub cutoff: i64,
}

pub struct SeedIndex {
    seeds: Vec<SeedWord>,
    hash: FxHashMap<u64, (usize, usize)>,
    sequence_lengths: Vec<i32>,
    k: i32,
}

impl SeedIndex {
    /// Build the index over a block's seeds. `sequence_lengths` must cover
    /// every `seq_id` occurring in `seeds`; it feeds the reverse-strand
    /// position adjustment during hit collection.
    pub fn new(mut seeds: Vec<SeedWord>, sequence_lengths: Vec<i32>, k: i32) -> Self {
        let mut hash = FxHashMap::default();
        if !seeds.is_empty() {
            seeds.sort_unstable();
            hash.reserve(seeds.len());

            let mut start = 0usize;
            let mut end = 0usize;
            let mut prev_key = decode_key(seeds[0]);
            for (i, &word) in seeds.iter().enumerate() {
                let key = decode_key(word);
                if key == prev_key {
                    end += 1;
                } else {
                    hash.insert(prev_key, (start, end));
                    start = i;
                    end = i + 1;
                }
                prev_key = key;
            }
            if end > start {
                hash.insert(prev_key, (start, end));
            }
        }

        Self {
            seeds,
            hash,
            sequence_lengths,
            k,
        }
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    pub fn k(&self) -> i32 {
        self.k
    }

    pub fn sequence_length(&self, seq_id: i32) -> i32 {
        self.sequence_lengths[seq_id as usize]
    }

    pub fn sequence_lengths(&self) -> &[i32] {
        &self.sequence_lengths
    }

    /// The sorted run of seeds sharing `key`; empty when the key is absent.
    pub fn seeds_for_key(&self, key: u64) -> &[SeedWord] {
        match self.hash.get(&key) {
            Some(&(start, end)) => &self.seeds[start..end],
            None => &[],
        }
    }

    /// Collect one hit per indexed seed matching each query seed's key,
    /// skipping keys whose run length exceeds `freq_cutoff` (when positive).
    /// Returns whether any hit was produced.
    pub fn collect_hits(
        &self,
        query_seeds: &[SeedWord],
        freq_cutoff: i64,
        hits: &mut Vec<SeedHit>,
    ) -> bool {
        hits.clear();

        for &query_word in query_seeds {
            let query = Seed::from(query_word);
            let Some(&(start, end)) = self.hash.get(&query.key) else {
                continue;
            };
            if freq_cutoff > 0 && (end - start) as i64 > freq_cutoff {
                continue;
            }
            for &target_word in &self.seeds[start..end] {
                let target = Seed::from(target_word);
                let mut is_rev = false;
                let mut target_pos = target.pos;
                if query.strand != target.strand {
                    is_rev = true;
                    // Approximate under homopolymer compression, where the
                    // seed span on the sequence is not k. Kept as-is; the
                    // output contract depends on this exact formula.
                    let target_len = self.sequence_lengths[target.seq_id as usize];
                    target_pos = target_len - (target.pos + self.k);
                }
                hits.push(SeedHit::new(target.seq_id, is_rev, target_pos, query.pos));
            }
        }

        !hits.is_empty()
    }

    /// Run-length distribution statistics with a percentile-based cutoff.
    /// `percentile` must be in `[0, 1]`; an index without keys is an error.
    pub fn frequency_stats(&self, percentile: f64) -> SeedIndexResult<FrequencyStats> {
        if !(0.0..=1.0).contains(&percentile) {
            return Err(SeedIndexError::InvalidArgument(format!(
                "percentile must be in [0.0, 1.0], got {percentile}"
            )));
        }
        if self.hash.is_empty() {
            return Err(SeedIndexError::Empty);
        }

        let mut freqs: Vec<i64> = Vec::with_capacity(self.hash.len());
        let mut sum = 0f64;
        for &(start, end) in self.hash.values() {
            let span = (end - start) as i64;
            if span == 0 {
                continue;
            }
            freqs.push(span);
            sum += span as f64;
        }
        if freqs.is_empty() {
            return Err(SeedIndexError::Empty);
        }
        freqs.sort_unstable();

        let n = freqs.len();
        let cutoff_id = ((n as f64) * (1.0 - percentile)).floor() as usize;
        Ok(FrequencyStats {
            max: freqs[n - 1],
            avg: sum / n as f64,
            median: (freqs[n / 2] + freqs[(n - 1) / 2]) as f64 / 2.0,
            cutoff: freqs[cutoff_id.min(n - 1)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::encode;

    #[test]
    fn test_empty_index() {
        let index = SeedIndex::new(Vec::new(), Vec::new(), 19);
        assert!(index.is_empty());
        assert!(index.seeds_for_key(42).is_empty());

        let mut hits = Vec::new();
        let query = vec![encode(42, 0, 100, false)];
        assert!(!index.collect_hits(&query, 0, &mut hits));
        assert!(hits.is_empty());

        assert!(matches!(
            index.frequency_stats(0.5),
            Err(SeedIndexError::Empty)
        ));
    }

    #[test]
    fn test_runs_partition_sorted_vector() {
        let seeds = vec![
            encode(5, 0, 10, false),
            encode(1, 1, 30, true),
            encode(5, 1, 20, false),
            encode(1, 0, 5, false),
            encode(3, 2, 0, true),
        ];
        let index = SeedIndex::new(seeds, vec![100, 100, 100], 19);

        let mut covered = 0;
        for key in [1u64, 3, 5] {
            let run = index.seeds_for_key(key);
            assert!(!run.is_empty());
            assert!(run.iter().all(|&w| decode_key(w) == key));
            covered += run.len();
        }
        assert_eq!(covered, index.len());
        assert!(index.seeds_for_key(99).is_empty());
    }

    #[test]
    fn test_collect_hits_forward() {
        let seeds = vec![encode(7, 2, 500, false), encode(7, 3, 900, false)];
        let index = SeedIndex::new(seeds, vec![0, 0, 2000, 2000], 19);

        let mut hits = Vec::new();
        assert!(index.collect_hits(&[encode(7, 0, 100, false)], 0, &mut hits));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0], SeedHit::new(2, false, 500, 100));
        assert_eq!(hits[1], SeedHit::new(3, false, 900, 100));
    }

    #[test]
    fn test_collect_hits_reverse_position_formula() {
        let k = 19;
        let seeds = vec![encode(7, 0, 10, true)];
        let index = SeedIndex::new(seeds, vec![100], k);

        let mut hits = Vec::new();
        assert!(index.collect_hits(&[encode(7, 9, 40, false)], 0, &mut hits));
        assert_eq!(hits.len(), 1);
        assert!(hits[0].target_rev);
        // target_len - (pos + k) = 100 - (10 + 19)
        assert_eq!(hits[0].target_pos, 71);
        assert_eq!(hits[0].query_pos, 40);
    }

    #[test]
    fn test_collect_hits_same_strand_reverse_seeds() {
        // Both query and target seed on the reverse strand: forward hit.
        let seeds = vec![encode(7, 0, 10, true)];
        let index = SeedIndex::new(seeds, vec![100], 19);
        let mut hits = Vec::new();
        assert!(index.collect_hits(&[encode(7, 9, 40, true)], 0, &mut hits));
        assert!(!hits[0].target_rev);
        assert_eq!(hits[0].target_pos, 10);
    }

    #[test]
    fn test_frequency_cutoff_skips_frequent_keys() {
        let mut seeds = Vec::new();
        for i in 0..100 {
            seeds.push(encode(1, 0, i, false)); // very frequent key
        }
        seeds.push(encode(2, 0, 500, false));
        let index = SeedIndex::new(seeds, vec![10_000], 19);

        let query = vec![encode(1, 1, 0, false), encode(2, 1, 10, false)];
        let mut hits = Vec::new();
        index.collect_hits(&query, 50, &mut hits);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target_pos, 500);

        // Without a cutoff all 101 hits come back.
        index.collect_hits(&query, 0, &mut hits);
        assert_eq!(hits.len(), 101);
    }

    #[test]
    fn test_frequency_stats() {
        // Keys with run lengths 1, 1, 2, 3, 5.
        let mut seeds = Vec::new();
        let lens = [(10u64, 1), (20, 1), (30, 2), (40, 3), (50, 5)];
        for &(key, count) in &lens {
            for i in 0..count {
                seeds.push(encode(key, 0, i, false));
            }
        }
        let index = SeedIndex::new(seeds, vec![10_000], 19);

        let stats = index.frequency_stats(0.0).unwrap();
        assert_eq!(stats.max, 5);
        assert!((stats.avg - 2.4).abs() < 1e-9);
        assert!((stats.median - 2.0).abs() < 1e-9);
        assert_eq!(stats.cutoff, 5);

        let stats = index.frequency_stats(0.5).unwrap();
        assert_eq!(stats.cutoff, 2);
    }

    #[test]
    fn test_frequency_stats_invalid_percentile() {
        let index = SeedIndex::new(vec![encode(1, 0, 0, false)], vec![100], 19);
        assert!(matches!(
            index.frequency_stats(-0.1),
            Err(SeedIndexError::InvalidArgument(_))
        ));
        assert!(matches!(
            index.frequency_stats(1.5),
            Err(SeedIndexError::InvalidArgument(_))
        ));
    }
}
