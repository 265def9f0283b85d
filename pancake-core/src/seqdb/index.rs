//! The SeqDB text index.
//!
//! Line-oriented, tab-separated, dispatched on the leading token:
//!
//! ```text
//! V <version>
//! C <0|1>
//! F <file_id> <filename> <num_seqs> <num_bytes> <num_compressed_bases>
//! S <seq_id> <header> <file_id> <file_offset> <num_bytes> <num_bases> <num_ranges> (<r_start> <r_end>)*
//! B <block_id> <start_seq_id> <end_seq_id> <num_bytes>
//! ```
//!
//! `S` records must appear in `seq_id` order and the i-th record must carry
//! `seq_id == i`. Unknown leading tokens are fatal, empty lines are skipped.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use rustc_hash::FxHashMap;

use super::{SeqDbError, SeqDbResult};
use crate::types::Range;

pub const SEQDB_VERSION: &str = "0.1.0";

/// One payload file referenced by the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqDbFileLine {
    pub file_id: i32,
    pub filename: String,
    pub num_sequences: i32,
    pub num_bytes: i64,
    pub num_compressed_bases: i64,
}

/// Index record for one stored sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqDbSequenceLine {
    pub seq_id: i32,
    pub header: String,
    pub file_id: i32,
    pub file_offset: i64,
    pub num_bytes: i32,
    pub num_bases: i32,
    pub ranges: Vec<Range>,
}

/// A contiguous slice of the sequence ID space, the unit of batched reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqDbBlockLine {
    pub block_id: i32,
    pub start_seq_id: i32,
    pub end_seq_id: i32,
    pub num_bytes: i64,
}

impl SeqDbBlockLine {
    pub fn span(&self) -> i32 {
        self.end_seq_id - self.start_seq_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeqDbIndex {
    pub version: String,
    pub compressed: bool,
    pub file_lines: Vec<SeqDbFileLine>,
    pub seq_lines: Vec<SeqDbSequenceLine>,
    pub block_lines: Vec<SeqDbBlockLine>,
}

fn parse_field<T: FromStr>(token: &str, line: &str) -> SeqDbResult<T> {
    token
        .parse()
        .map_err(|_| SeqDbError::Malformed(format!("bad field '{token}' in line: '{line}'")))
}

impl SeqDbIndex {
    pub fn load<P: AsRef<Path>>(path: P) -> SeqDbResult<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            SeqDbError::Io(std::io::Error::new(
                e.kind(),
                format!("could not open '{}': {e}", path.as_ref().display()),
            ))
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> SeqDbResult<Self> {
        let mut index = SeqDbIndex {
            version: String::new(),
            compressed: false,
            file_lines: Vec::new(),
            seq_lines: Vec::new(),
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
                        return Err(SeqDbError::Malformed(format!(
                            "wrong field count in line: '{line}'"
                        )));
                    }
                    index.version = tokens[1].to_string();
                }
                "C" => {
                    if tokens.len() != 2 {
                        return Err(SeqDbError::Malformed(format!(
                            "wrong field count in line: '{line}'"
                        )));
                    }
                    index.compressed = parse_field::<i32>(tokens[1], &line)? != 0;
                }
                "F" => {
                    if tokens.len() != 6 {
                        return Err(SeqDbError::Malformed(format!(
                            "wrong field count in line: '{line}'"
                        )));
                    }
                    index.file_lines.push(SeqDbFileLine {
                        file_id: parse_field(tokens[1], &line)?,
                        filename: tokens[2].to_string(),
                        num_sequences: parse_field(tokens[3], &line)?,
                        num_bytes: parse_field(tokens[4], &line)?,
                        num_compressed_bases: parse_field(tokens[5], &line)?,
                    });
                }
                "S" => {
                    if tokens.len() < 8 {
                        return Err(SeqDbError::Malformed(format!(
                            "wrong field count in line: '{line}'"
                        )));
                    }
                    let seq_id: i32 = parse_field(tokens[1], &line)?;
                    if seq_id != index.seq_lines.len() as i32 {
                        return Err(SeqDbError::Malformed(format!(
                            "out-of-order seq_id {seq_id}, expected {} in line: '{line}'",
                            index.seq_lines.len()
                        )));
                    }
                    let num_ranges: usize = parse_field(tokens[7], &line)?;
                    if tokens.len() != 8 + 2 * num_ranges {
                        return Err(SeqDbError::Malformed(format!(
                            "wrong range count in line: '{line}'"
                        )));
                    }
                    let mut ranges = Vec::with_capacity(num_ranges);
                    for pair in tokens[8..].chunks(2) {
                        ranges.push(Range::new(
                            parse_field(pair[0], &line)?,
                            parse_field(pair[1], &line)?,
                        ));
                    }
                    index.seq_lines.push(SeqDbSequenceLine {
                        seq_id,
                        header: tokens[2].to_string(),
                        file_id: parse_field(tokens[3], &line)?,
                        file_offset: parse_field(tokens[4], &line)?,
                        num_bytes: parse_field(tokens[5], &line)?,
                        num_bases: parse_field(tokens[6], &line)?,
                        ranges,
                    });
                }
                "B" => {
                    if tokens.len() != 5 {
                        return Err(SeqDbError::Malformed(format!(
                            "wrong field count in line: '{line}'"
                        )));
                    }
                    index.block_lines.push(SeqDbBlockLine {
                        block_id: parse_field(tokens[1], &line)?,
                        start_seq_id: parse_field(tokens[2], &line)?,
                        end_seq_id: parse_field(tokens[3], &line)?,
                        num_bytes: parse_field(tokens[4], &line)?,
                    });
                }
                other => {
                    return Err(SeqDbError::Malformed(format!(
                        "unknown token '{other}' in line: '{line}'"
                    )));
                }
            }
        }

        Ok(index)
    }

    pub fn num_sequences(&self) -> i32 {
        self.seq_lines.len() as i32
    }

    pub fn num_blocks(&self) -> i32 {
        self.block_lines.len() as i32
    }

    pub fn sequence_line(&self, seq_id: i32) -> SeqDbResult<&SeqDbSequenceLine> {
        if seq_id < 0 || seq_id as usize >= self.seq_lines.len() {
            return Err(SeqDbError::Malformed(format!(
                "invalid seq_id {seq_id}, index holds {} sequences",
                self.seq_lines.len()
            )));
        }
        Ok(&self.seq_lines[seq_id as usize])
    }

    pub fn block_line(&self, block_id: i32) -> SeqDbResult<&SeqDbBlockLine> {
        if block_id < 0 || block_id as usize >= self.block_lines.len() {
            return Err(SeqDbError::Malformed(format!(
                "invalid block_id {block_id}, index holds {} blocks",
                self.block_lines.len()
            )));
        }
        Ok(&self.block_lines[block_id as usize])
    }

    pub fn file_line(&self, file_id: i32) -> SeqDbResult<&SeqDbFileLine> {
        if file_id < 0 || file_id as usize >= self.file_lines.len() {
            return Err(SeqDbError::Malformed(format!(
                "invalid file_id {file_id}, index holds {} files",
                self.file_lines.len()
            )));
        }
        Ok(&self.file_lines[file_id as usize])
    }

    /// The `[start_seq_id, end_seq_id)` range of a block.
    pub fn block_range(&self, block_id: i32) -> SeqDbResult<(i32, i32)> {
        let bl = self.block_line(block_id)?;
        Ok((bl.start_seq_id, bl.end_seq_id))
    }

    /// Header to ordinal sequence ID lookup.
    pub fn header_lookup(&self) -> FxHashMap<String, i32> {
        self.seq_lines
            .iter()
            .map(|sl| (sl.header.clone(), sl.seq_id))
            .collect()
    }
}

impl fmt::Display for SeqDbIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "V\t{}", self.version)?;
        writeln!(f, "C\t{}", self.compressed as i32)?;
        for fl in &self.file_lines {
            writeln!(
                f,
                "F\t{}\t{}\t{}\t{}\t{}",
                fl.file_id, fl.filename, fl.num_sequences, fl.num_bytes, fl.num_compressed_bases
            )?;
        }
        for sl in &self.seq_lines {
            write!(
                f,
                "S\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                sl.seq_id,
                sl.header,
                sl.file_id,
                sl.file_offset,
                sl.num_bytes,
                sl.num_bases,
                sl.ranges.len()
            )?;
            for r in &sl.ranges {
                write!(f, "\t{}\t{}", r.start, r.end)?;
            }
            writeln!(f)?;
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
