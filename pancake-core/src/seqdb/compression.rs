//! 2-bit sequence packing.
//!
//! Bases map as A=0, C=1, G=2, T=3, four per byte, first base in the least
//! significant bits. Non-ACGT bases are not encoded: they close the current
//! kept-base range and a new range opens at the next ACGT base. On decode
//! the gaps between ranges are filled with `N`.

use super::{SeqDbError, SeqDbResult};
use crate::seed::utils::encode_base;
use crate::types::Range;

const DECODE_TABLE: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// A 2-bit-packed sequence with its kept-base ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedSequence {
    twobit: Vec<u8>,
    ranges: Vec<Range>,
    num_uncompressed_bases: i32,
    num_compressed_bases: i32,
}

impl CompressedSequence {
    /// Pack a sequence. Never fails: arbitrary bytes are representable, the
    /// unrepresentable ones just land outside the kept ranges.
    pub fn new(seq: &[u8]) -> Self {
        let mut twobit = Vec::with_capacity(seq.len() / 4 + 1);
        let mut ranges: Vec<Range> = Vec::new();
        let mut range_start: Option<i32> = None;
        let mut num_compressed = 0i32;
        let mut pending: u8 = 0;

        for (i, &base) in seq.iter().enumerate() {
            match encode_base(base) {
                Some(code) => {
                    if range_start.is_none() {
                        range_start = Some(i as i32);
                    }
                    pending |= (code as u8) << (2 * (num_compressed % 4));
                    num_compressed += 1;
                    if num_compressed % 4 == 0 {
                        twobit.push(pending);
                        pending = 0;
                    }
                }
                None => {
                    if let Some(start) = range_start.take() {
                        ranges.push(Range::new(start, i as i32));
                    }
                }
            }
        }
        if let Some(start) = range_start {
            ranges.push(Range::new(start, seq.len() as i32));
        }
        if num_compressed % 4 != 0 {
            twobit.push(pending);
        }

        Self {
            twobit,
            ranges,
            num_uncompressed_bases: seq.len() as i32,
            num_compressed_bases: num_compressed,
        }
    }

    pub fn twobit(&self) -> &[u8] {
        &self.twobit
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn num_uncompressed_bases(&self) -> i32 {
        self.num_uncompressed_bases
    }

    pub fn num_compressed_bases(&self) -> i32 {
        self.num_compressed_bases
    }
}

/// Unpack a 2-bit payload back into ASCII bases of length `num_bases`,
/// writing `N` outside the kept ranges.
pub fn decompress(data: &[u8], num_bases: i32, ranges: &[Range]) -> SeqDbResult<Vec<u8>> {
    let mut out = vec![b'N'; num_bases.max(0) as usize];
    let mut stream_pos: usize = 0;

    for range in ranges {
        if range.start < 0 || range.end > num_bases || range.end < range.start {
            return Err(SeqDbError::Malformed(format!(
                "range [{}, {}) outside of sequence length {num_bases}",
                range.start, range.end
            )));
        }
        for out_pos in range.start..range.end {
            let byte = data.get(stream_pos / 4).copied().ok_or_else(|| {
                SeqDbError::Malformed(format!(
                    "2-bit payload of {} bytes too short for its ranges",
                    data.len()
                ))
            })?;
            let code = (byte >> (2 * (stream_pos % 4))) & 0b11;
            out[out_pos as usize] = DECODE_TABLE[code as usize];
            stream_pos += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_clean_sequence() {
        let seq = b"ACGTACGTTGCAAC";
        let comp = CompressedSequence::new(seq);
        assert_eq!(comp.num_compressed_bases(), seq.len() as i32);
        assert_eq!(comp.ranges(), &[Range::new(0, seq.len() as i32)]);
        let back = decompress(comp.twobit(), seq.len() as i32, comp.ranges()).unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn test_roundtrip_with_n_bases() {
        let seq = b"ACGTNNACGTACGN";
        let comp = CompressedSequence::new(seq);
        assert_eq!(comp.ranges(), &[Range::new(0, 4), Range::new(6, 13)]);
        assert_eq!(comp.num_compressed_bases(), 11);
        let back = decompress(comp.twobit(), seq.len() as i32, comp.ranges()).unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn test_lowercase_is_packed_uppercase() {
        let comp = CompressedSequence::new(b"acgt");
        let back = decompress(comp.twobit(), 4, comp.ranges()).unwrap();
        assert_eq!(back, b"ACGT");
    }

    #[test]
    fn test_first_base_in_low_bits() {
        // "CA" packs C=1 into bits 0..2 and A=0 into bits 2..4.
        let comp = CompressedSequence::new(b"CA");
        assert_eq!(comp.twobit(), &[0b0000_0001]);
    }

    #[test]
    fn test_empty_sequence() {
        let comp = CompressedSequence::new(b"");
        assert!(comp.twobit().is_empty());
        assert!(comp.ranges().is_empty());
        assert_eq!(decompress(comp.twobit(), 0, comp.ranges()).unwrap(), b"");
    }

    #[test]
    fn test_truncated_payload_is_malformed() {
        let err = decompress(&[], 4, &[Range::new(0, 4)]);
        assert!(matches!(err, Err(SeqDbError::Malformed(_))));
    }

    #[test]
    fn test_bad_range_is_malformed() {
        let comp = CompressedSequence::new(b"ACGT");
        let err = decompress(comp.twobit(), 4, &[Range::new(0, 5)]);
        assert!(matches!(err, Err(SeqDbError::Malformed(_))));
    }
}
