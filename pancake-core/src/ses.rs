//! Banded shortest-edit-script distance.
//!
//! An O(ND) furthest-reaching alignment over insert/delete edits: matches
//! are consumed greedily along each diagonal, every diff level explores one
//! insertion and one deletion, and the explored diagonal band is re-centered
//! each level around the best-reaching diagonals. Extension stops at the
//! first sequence end. When the diff budget or the band runs out the best
//! known reach is reported with `valid == false`; the caller decides what
//! that is worth.

const MINUS_INF: i32 = i32::MIN / 2;

/// The furthest reach of one banded SES run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SesResult {
    /// One past the last consumed query base.
    pub last_query_pos: i32,
    /// One past the last consumed target base.
    pub last_target_pos: i32,
    /// Diffs spent to get there.
    pub diffs: i32,
    /// Whether an end was reached within the caps.
    pub valid: bool,
}

/// Banded SES distance between `query` and `target` under `max_diffs` and
/// a diagonal band of width `bandwidth`. A non-positive `max_diffs` performs
/// no work and reports zero reach.
pub fn banded_ses_distance(query: &[u8], target: &[u8], max_diffs: i32, bandwidth: i32) -> SesResult {
    let n = query.len() as i32;
    let m = target.len() as i32;

    let mut ret = SesResult::default();
    if n == 0 || m == 0 {
        ret.valid = true;
        return ret;
    }
    if max_diffs <= 0 {
        return ret;
    }

    let band_tolerance = bandwidth / 2 + 1;
    let zero = (max_diffs + 1) as usize;
    // Furthest-reaching query position per diagonal.
    let mut reach = vec![MINUS_INF; 2 * max_diffs as usize + 3];
    reach[zero + 1] = 0;

    let mut min_k: i32 = 0;
    let mut max_k: i32 = 0;
    let mut best_u = MINUS_INF;
    let mut best = (0i32, 0i32, 0i32);

    for d in 0..max_diffs {
        if max_k - min_k > bandwidth {
            break;
        }

        let mut k = min_k;
        while k <= max_k {
            let idx = (zero as i32 + k) as usize;
            let take_down =
                k == -d || (k != d && reach[idx - 1] < reach[idx + 1]);
            let mut x = if take_down {
                reach[idx + 1]
            } else {
                reach[idx - 1] + 1
            };
            let mut y = x - k;
            if x < 0 || y < 0 {
                // Dead diagonal inside the band; nothing reached it yet.
                reach[idx] = x;
                k += 2;
                continue;
            }
            while x < n && y < m && query[x as usize] == target[y as usize] {
                x += 1;
                y += 1;
            }
            reach[idx] = x;

            let u = x + y;
            if u > best_u {
                best_u = u;
                best = (x, y, d);
            }
            if x >= n || y >= m {
                ret.last_query_pos = x;
                ret.last_target_pos = y;
                ret.diffs = d;
                ret.valid = true;
                return ret;
            }
            k += 2;
        }

        // Re-center the band on diagonals still within tolerance of the
        // best reach, then widen by one on both sides for the next level.
        let mut new_min = max_k;
        let mut new_max = min_k;
        let mut k = min_k;
        while k <= max_k {
            let x = reach[(zero as i32 + k) as usize];
            if x > MINUS_INF {
                let u = 2 * x - k;
                if u >= best_u - band_tolerance {
                    new_min = new_min.min(k);
                    new_max = new_max.max(k);
                }
            }
            k += 2;
        }
        min_k = new_min - 1;
        max_k = new_max + 1;
    }

    // Budget or band exhausted: report the best reach seen.
    ret.last_query_pos = best.0;
    ret.last_target_pos = best.1;
    ret.diffs = best.2;
    ret.valid = false;
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs() {
        let r = banded_ses_distance(b"", b"ACGT", 10, 10);
        assert_eq!(r, SesResult { last_query_pos: 0, last_target_pos: 0, diffs: 0, valid: true });
        let r = banded_ses_distance(b"ACGT", b"", 10, 10);
        assert!(r.valid);
    }

    #[test]
    fn test_zero_budget_reports_zero_reach() {
        let r = banded_ses_distance(b"ACGT", b"ACGT", 0, 10);
        assert_eq!(r.last_query_pos, 0);
        assert_eq!(r.last_target_pos, 0);
        assert!(!r.valid);
        let r = banded_ses_distance(b"ACGT", b"ACGT", -5, 10);
        assert_eq!(r.last_query_pos, 0);
    }

    #[test]
    fn test_identical_strings() {
        let seq = b"ACGTTGCATTACGGAT";
        let r = banded_ses_distance(seq, seq, 10, 10);
        assert!(r.valid);
        assert_eq!(r.diffs, 0);
        assert_eq!(r.last_query_pos, seq.len() as i32);
        assert_eq!(r.last_target_pos, seq.len() as i32);
    }

    #[test]
    fn test_single_substitution_costs_two() {
        // Insert/delete edits only: a substitution is one deletion plus one
        // insertion.
        let q = b"AAAATTTTGGGG";
        let t = b"AAAATTCTGGGG";
        let r = banded_ses_distance(q, t, 10, 20);
        assert!(r.valid);
        assert_eq!(r.diffs, 2);
        assert_eq!(r.last_query_pos, q.len() as i32);
    }

    #[test]
    fn test_single_insertion_costs_one() {
        let q = b"AAAATTTTGGGG";
        let t = b"AAAATTTTTGGGG"; // one extra T
        let r = banded_ses_distance(q, t, 10, 20);
        assert!(r.valid);
        assert_eq!(r.diffs, 1);
    }

    #[test]
    fn test_stops_at_first_end() {
        let q = b"ACGTACGT";
        let t = b"ACGTACGTACGTACGT";
        let r = banded_ses_distance(q, t, 10, 20);
        assert!(r.valid);
        assert_eq!(r.diffs, 0);
        assert_eq!(r.last_query_pos, 8);
        assert_eq!(r.last_target_pos, 8);
    }

    #[test]
    fn test_budget_exhaustion_reports_best_reach() {
        let q = b"AAAAAAAAAAAAAAAA";
        let t = b"CCCCCCCCCCCCCCCC";
        let r = banded_ses_distance(q, t, 4, 20);
        assert!(!r.valid);
        assert!(r.diffs < 4);
        // Nothing matches, so the reach is bounded by the diffs spent.
        assert!(r.last_query_pos + r.last_target_pos <= 2 * 4);
        assert!(r.last_query_pos >= 0 && r.last_target_pos >= 0);
    }

    #[test]
    fn test_diffs_bounded_by_span() {
        let q = b"ACGTGGTTAACC";
        let t = b"TGCAACCGGTTA";
        let r = banded_ses_distance(q, t, 30, 30);
        let span = (r.last_query_pos).max(r.last_target_pos);
        assert!(r.diffs <= span.max(1) * 2);
    }
}
