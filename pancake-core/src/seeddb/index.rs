//! The SeedDB text index.
//!
//! ```text
//! V <version>
//! P k=<k>,w=<w>,hpc=<0|1>,hpc_len=<n>,rc=<0|1>
//! F <file_id> <filename> <num_seqs> <num_bytes>
//! S <seq_id> <header> <file_id> <file_offset> <num_bytes> <num_bases> <num_seeds>
//! B <block_id> <start_seq_id> <end_seq_id> <num_bytes>
//! ```
//!
//! Same parse discipline as the SeqDB index: `S` records are ordinal-checked,
//! unknown tokens are fatal, empty lines are skipped. Every `S` record must
//! satisfy `num_seeds * 16 == num_bytes`.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use rustc_hash::FxHashMap;

use super::{SeedDbError, SeedDbResult};
use crate::seed::SeedParams;
use crate::seqdb::SeqDbIndex;

pub const SEEDDB_VERSION: &str = "0.1.0";

/// Bytes per packed seed word.
pub const SEED_WORD_BYTES: i64 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedDbFileLine {
    pub file_id: i32,
    pub filename: String,
    pub num_sequences: i32,
    pub num_bytes: i64,
}

/// Index record for one sequence's seeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedDbSeedsLine {
    pub seq_id: i32,
    pub header: String,
    pub file_id: i32,
    pub file_offset: i64,
    pub num_bytes: i64,
    pub num_bases: i32,
    pub num_seeds: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedDbBlockLine {
    pub block_id: i32,
    pub start_seq_id: i32,
    pub end_seq_id: i32,
    pub num_bytes: i64,
}

impl SeedDbBlockLine {
    pub fn span(&self) -> i32 {
        self.end_seq_id - self.start_seq_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedDbIndex {
    pub version: String,
    pub params: SeedParams,
    pub file_lines: Vec<SeedDbFileLine>,
    pub seeds_lines: Vec<SeedDbSeedsLine>,
    pub block_lines: Vec<SeedDbBlockLine>,
}

fn parse_field<T: FromStr>(token: &str, line: &str) -> SeedDbResult<T> {
    token
        .parse()
        .map_err(|_| SeedDbError::Malformed(format!("bad field '{token}' in line: '{line}'")))
}

impl SeedDbIndex {
    pub fn load<P: AsRef<Path>>(path: P) -> SeedDbResult<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            SeedDbError::Io(std::io::Error::new(
                e.kind(),
                format!("could not open '{}': {e}", path.as_ref().display()),
            ))
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> SeedDbResult<Self> {
        let mut index = SeedDbIndex {
            version: String::new(),
            params: SeedParams::default(),
            file_lines: Vec::new(),
            seeds_lines: Vec::new(),
            block_lines: Vec::new(),
        };

        for line in reader.lines() {
            let line = line?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            match tokens[0] {
                "V" => {
                    if tokens.len() != 2 {
                        return Err(SeedDbError::Malformed(format!(
                            "wrong field count in line: '{line}'"
                        )));
                    }
                    index.version = tokens[1].to_string();
                }
                "P" => {
                    if tokens.len() != 2 {
                        return Err(SeedDbError::Malformed(format!(
                            "wrong field count in line: '{line}'"
                        )));
                    }
                    index.params = SeedParams::parse_index_line(tokens[1])
                        .map_err(|e| SeedDbError::Malformed(e.to_string()))?;
                }
                "F" => {
                    if tokens.len() != 5 {
                        return Err(SeedDbError::Malformed(format!(
                            "wrong field count in line: '{line}'"
                        )));
                    }
                    index.file_lines.push(SeedDbFileLine {
                        file_id: parse_field(tokens[1], &line)?,
                        filename: tokens[2].to_string(),
                        num_sequences: parse_field(tokens[3], &line)?,
                        num_bytes: parse_field(tokens[4], &line)?,
                    });
                }
                "S" => {
                    if tokens.len() != 8 {
                        return Err(SeedDbError::Malformed(format!(
                            "wrong field count in line: '{line}'"
                        )));
                    }
                    let seq_id: i32 = parse_field(tokens[1], &line)?;
                    if seq_id != index.seeds_lines.len() as i32 {
                        return Err(SeedDbError::Malformed(format!(
                            "out-of-order seq_id {seq_id}, expected {} in line: '{line}'",
                            index.seeds_lines.len()
                        )));
                    }
                    let sl = SeedDbSeedsLine {
                        seq_id,
                        header: tokens[2].to_string(),
                        file_id: parse_field(tokens[3], &line)?,
                        file_offset: parse_field(tokens[4], &line)?,
                        num_bytes: parse_field(tokens[5], &line)?,
                        num_bases: parse_field(tokens[6], &line)?,
                        num_seeds: parse_field(tokens[7], &line)?,
                    };
                    if sl.num_seeds as i64 * SEED_WORD_BYTES != sl.num_bytes {
                        return Err(SeedDbError::Malformed(format!(
                            "num_seeds {} does not match byte size {} in line: '{line}'",
                            sl.num_seeds, sl.num_bytes
                        )));
                    }
                    index.seeds_lines.push(sl);
                }
                "B" => {
                    if tokens.len() != 5 {
                        return Err(SeedDbError::Malformed(format!(
                            "wrong field count in line: '{line}'"
                        )));
                    }
                    index.block_lines.push(SeedDbBlockLine {
                        block_id: parse_field(tokens[1], &line)?,
                        start_seq_id: parse_field(tokens[2], &line)?,
                        end_seq_id: parse_field(tokens[3], &line)?,
                        num_bytes: parse_field(tokens[4], &line)?,
                    });
                }
                other => {
                    return Err(SeedDbError::Malformed(format!(
                        "unknown token '{other}' in line: '{line}'"
                    )));
                }
            }
        }

        Ok(index)
    }

    pub fn num_sequences(&self) -> i32 {
        self.seeds_lines.len() as i32
    }

    pub fn num_blocks(&self) -> i32 {
        self.block_lines.len() as i32
    }

    pub fn seeds_line(&self, seq_id: i32) -> SeedDbResult<&SeedDbSeedsLine> {
        if seq_id < 0 || seq_id as usize >= self.seeds_lines.len() {
            return Err(SeedDbError::Malformed(format!(
                "invalid seq_id {seq_id}, index holds {} sequences",
                self.seeds_lines.len()
            )));
        }
        Ok(&self.seeds_lines[seq_id as usize])
    }

    pub fn block_line(&self, block_id: i32) -> SeedDbResult<&SeedDbBlockLine> {
        if block_id < 0 || block_id as usize >= self.block_lines.len() {
            return Err(SeedDbError::Malformed(format!(
                "invalid block_id {block_id}, index holds {} blocks",
                self.block_lines.len()
            )));
        }
        Ok(&self.block_lines[block_id as usize])
    }

    pub fn file_line(&self, file_id: i32) -> SeedDbResult<&SeedDbFileLine> {
        if file_id < 0 || file_id as usize >= self.file_lines.len() {
            return Err(SeedDbError::Malformed(format!(
                "invalid file_id {file_id}, index holds {} files",
                self.file_lines.len()
            )));
        }
        Ok(&self.file_lines[file_id as usize])
    }

    pub fn block_range(&self, block_id: i32) -> SeedDbResult<(i32, i32)> {
        let bl = self.block_line(block_id)?;
        Ok((bl.start_seq_id, bl.end_seq_id))
    }

    pub fn header_lookup(&self) -> FxHashMap<String, i32> {
        self.seeds_lines
            .iter()
            .map(|sl| (sl.header.clone(), sl.seq_id))
            .collect()
    }

    /// Sequence lengths indexed by `seq_id`, as the seed index needs them
    /// for the reverse-strand position adjustment.
    pub fn sequence_lengths(&self) -> Vec<i32> {
        self.seeds_lines.iter().map(|sl| sl.num_bases).collect()
    }
}

impl fmt::Display for SeedDbIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "V\t{}", self.version)?;
        writeln!(f, "P\t{}", self.params.to_index_line())?;
        for fl in &self.file_lines {
            writeln!(
                f,
                "F\t{}\t{}\t{}\t{}",
                fl.file_id, fl.filename, fl.num_sequences, fl.num_bytes
            )?;
        }
        for sl in &self.seeds_lines {
            writeln!(
                f,
                "S\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                sl.seq_id,
                sl.header,
                sl.file_id,
                sl.file_offset,
                sl.num_bytes,
                sl.num_bases,
                sl.num_seeds
            )?;
        }
        for bl in &self.block_lines {
            writeln!(
                f,
                "B\t{}\t{}\t{}\t{}",
                bl.block_id, bl.start_seq_id, bl.end_seq_id, bl.num_bytes
            )?;
        }
        Ok(())
    }
}

/// Check that a SeqDB and a SeedDB describe the same set of sequences.
pub fn validate_paired(seqdb: &SeqDbIndex, seeddb: &SeedDbIndex) -> SeedDbResult<()> {
    if seqdb.version != seeddb.version {
        return Err(SeedDbError::Mismatch(format!(
            "SeqDB version '{}' differs from SeedDB version '{}'",
            seqdb.version, seeddb.version
        )));
    }
    if seqdb.num_sequences() != seeddb.num_sequences() {
        return Err(SeedDbError::Mismatch(format!(
            "SeqDB holds {} sequences but SeedDB holds {}",
            seqdb.num_sequences(),
            seeddb.num_sequences()
        )));
    }
    for (seq, seeds) in seqdb.seq_lines.iter().zip(&seeddb.seeds_lines) {
        if seq.header != seeds.header {
            return Err(SeedDbError::Mismatch(format!(
                "seq_id {}: SeqDB header '{}' differs from SeedDB header '{}'",
                seq.seq_id, seq.header, seeds.header
            )));
        }
        if seq.num_bases != seeds.num_bases {
            return Err(SeedDbError::Mismatch(format!(
                "seq_id {}: SeqDB has {} bases but SeedDB has {}",
                seq.seq_id, seq.num_bases, seeds.num_bases
            )));
        }
    }
    Ok(())
}

/// Check that two SeedDBs were built with the same seeding parameters.
pub fn validate_matching_params(a: &SeedDbIndex, b: &SeedDbIndex) -> SeedDbResult<()> {
    if a.params != b.params {
        return Err(SeedDbError::Mismatch(format!(
            "seed parameters disagree: '{}' vs '{}'",
            a.params.to_index_line(),
            b.params.to_index_line()
        )));
    }
    Ok(())
}
