//! Canonical (w,k)-minimizer extraction.
//!
//! For every window of `w` consecutive k-mers the lexicographically smallest
//! `(hash, pos)` pair is emitted, hashing both strands and keeping the
//! canonical (smaller) one. Non-ACGT bases break the k-mer run. With
//! homopolymer compression enabled, runs of identical bases are collapsed
//! before hashing while reported positions stay in original sequence
//! coordinates; a run longer than `max_hpc_len` breaks the k-mer run the
//! same way an invalid base does.

use super::encoding::{encode, SeedWord};
use super::utils::{encode_base, hash64};
use super::{SeedParams, SeedResult};

/// One base of the (possibly homopolymer-compressed) stream fed to the
/// k-mer hasher. `fresh` marks a run restart: no k-mer may span backwards
/// across it.
struct StreamBase {
    code: u64,
    pos: i32,
    fresh: bool,
}

struct WindowKmer {
    hash: u64,
    pos: i32,
    strand: bool,
}

/// Extract the minimizer seeds of one sequence, packed as seed words.
///
/// Sequences shorter than `k` produce no seeds. Positions are 0-based
/// starts on the forward strand, in original (uncompressed) coordinates.
pub fn extract_seeds(seq: &[u8], seq_id: i32, params: &SeedParams) -> SeedResult<Vec<SeedWord>> {
    params.validate()?;

    let stream = build_stream(seq, params);
    let k = params.k as usize;
    if stream.len() < k {
        return Ok(Vec::new());
    }

    let kmers = hash_kmers(&stream, params);

    // Slide a window of w k-mers and keep the smallest hash per window,
    // tie-breaking by leftmost position. Consecutive windows picking the
    // same k-mer emit it once.
    let num_kmers = kmers.len();
    let effective_w = (params.w as usize).min(num_kmers);
    let mut seeds = Vec::new();
    let mut last_emitted: Option<(u64, i32)> = None;

    for win_start in 0..=(num_kmers - effective_w) {
        let mut best: Option<&WindowKmer> = None;
        for kmer in kmers[win_start..win_start + effective_w].iter().flatten() {
            match best {
                Some(b) if kmer.hash >= b.hash => {}
                _ => best = Some(kmer),
            }
        }
        if let Some(b) = best {
            if last_emitted != Some((b.hash, b.pos)) {
                seeds.push(encode(b.hash, seq_id, b.pos, b.strand));
                last_emitted = Some((b.hash, b.pos));
            }
        }
    }

    Ok(seeds)
}

fn build_stream(seq: &[u8], params: &SeedParams) -> Vec<StreamBase> {
    let mut stream: Vec<StreamBase> = Vec::with_capacity(seq.len());
    let mut fresh = true;

    if !params.use_hpc {
        for (i, &base) in seq.iter().enumerate() {
            match encode_base(base) {
                Some(code) => {
                    stream.push(StreamBase {
                        code,
                        pos: i as i32,
                        fresh,
                    });
                    fresh = false;
                }
                None => fresh = true,
            }
        }
        return stream;
    }

    let mut run_code: Option<u64> = None;
    let mut run_len: i32 = 0;
    for (i, &base) in seq.iter().enumerate() {
        match encode_base(base) {
            Some(code) => {
                if run_code == Some(code) {
                    run_len += 1;
                    if run_len == params.max_hpc_len + 1 {
                        // Run too long to compress: drop it and restart.
                        stream.pop();
                        fresh = true;
                    }
                } else {
                    run_code = Some(code);
                    run_len = 1;
                    stream.push(StreamBase {
                        code,
                        pos: i as i32,
                        fresh,
                    });
                    fresh = false;
                }
            }
            None => {
                run_code = None;
                run_len = 0;
                fresh = true;
            }
        }
    }
    stream
}

/// Rolling forward/reverse-complement hashes over the base stream. Entry
/// `i` describes the k-mer starting at stream position `i`, or `None` when
/// the k-mer spans a run restart.
fn hash_kmers(stream: &[StreamBase], params: &SeedParams) -> Vec<Option<WindowKmer>> {
    let k = params.k as usize;
    let mask: u64 = if k == 32 {
        u64::MAX
    } else {
        (1u64 << (2 * k)) - 1
    };
    let rc_shift = (2 * (k - 1)) as u32;

    let mut kmers: Vec<Option<WindowKmer>> = Vec::with_capacity(stream.len() - k + 1);
    let mut fwd: u64 = 0;
    let mut rev: u64 = 0;
    let mut valid: usize = 0;

    for (i, sb) in stream.iter().enumerate() {
        if sb.fresh {
            valid = 0;
            fwd = 0;
            rev = 0;
        }
        fwd = ((fwd << 2) | sb.code) & mask;
        rev = (rev >> 2) | ((3 - sb.code) << rc_shift);
        valid += 1;

        if i + 1 >= k {
            let entry = if valid >= k {
                let hf = hash64(fwd);
                let (hash, strand) = if params.use_rc {
                    let hr = hash64(rev);
                    if hr < hf {
                        (hr, true)
                    } else {
                        (hf, false)
                    }
                } else {
                    (hf, false)
                };
                Some(WindowKmer {
                    hash,
                    pos: stream[i + 1 - k].pos,
                    strand,
                })
            } else {
                None
            };
            kmers.push(entry);
        }
    }
    kmers
}
