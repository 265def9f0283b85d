//! The SeqDB writer.
//!
//! Sequences are buffered up to `flush_size` bytes before hitting the
//! payload file, and the payload rotates to a new file whenever the current
//! one has reached `file_block_size` bytes. Rotation happens before the
//! record that would exceed the threshold, and closes the current block so
//! that a block never straddles a file boundary.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::compression::CompressedSequence;
use super::index::{SeqDbBlockLine, SeqDbFileLine, SeqDbIndex, SeqDbSequenceLine, SEQDB_VERSION};
use super::{SeqDbError, SeqDbResult};
use crate::types::Range;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeqDbWriterParams {
    /// 2-bit-pack the payload.
    pub use_compression: bool,
    /// Bytes buffered in memory before a payload write.
    pub flush_size: i64,
    /// Payload file rotation threshold in bytes.
    pub file_block_size: i64,
    /// Auto-close a block once it holds this many payload bytes.
    /// Zero disables automatic blocking; `mark_block_end` is always available.
    pub block_size: i64,
}

impl Default for SeqDbWriterParams {
    fn default() -> Self {
        Self {
            use_compression: true,
            flush_size: 8 * 1024 * 1024,
            file_block_size: 1024 * 1024 * 1024,
            block_size: 100 * 1024 * 1024,
        }
    }
}

pub struct SeqDbWriter {
    parent: PathBuf,
    basename: String,
    index_path: PathBuf,
    params: SeqDbWriterParams,
    file_lines: Vec<SeqDbFileLine>,
    seq_lines: Vec<SeqDbSequenceLine>,
    block_lines: Vec<SeqDbBlockLine>,
    seq_buffer: Vec<u8>,
    out_seqs: Option<File>,
    block_start_seq_id: i32,
    block_num_bytes: i64,
    finished: bool,
}

impl SeqDbWriter {
    pub fn new<P: AsRef<Path>>(prefix: P, params: SeqDbWriterParams) -> SeqDbResult<Self> {
        if params.flush_size < 0 {
            return Err(SeqDbError::InvalidArgument(
                "buffer size cannot be a negative value".to_string(),
            ));
        }
        if params.file_block_size < 0 || params.block_size < 0 {
            return Err(SeqDbError::InvalidArgument(
                "block sizes cannot be negative values".to_string(),
            ));
        }

        let prefix = prefix.as_ref();
        let parent = prefix.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        let basename = prefix
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                SeqDbError::InvalidArgument(format!("invalid output prefix '{}'", prefix.display()))
            })?;
        let index_path = parent.join(format!("{basename}.seqdb"));

        let mut writer = Self {
            parent,
            basename,
            index_path,
            params,
            file_lines: Vec::new(),
            seq_lines: Vec::new(),
            block_lines: Vec::new(),
            seq_buffer: Vec::with_capacity(params.flush_size.max(0) as usize),
            out_seqs: None,
            block_start_seq_id: 0,
            block_num_bytes: 0,
            finished: false,
        };
        writer.open_new_sequence_file()?;
        Ok(writer)
    }

    /// Append one sequence. Headers are stored as given; only the part up to
    /// the first whitespace survives an index round trip.
    pub fn add_sequence(&mut self, header: &str, seq: &[u8]) -> SeqDbResult<()> {
        // Rotate before the record that would exceed the file threshold.
        let cur_bytes = self.current_file().num_bytes;
        if cur_bytes >= self.params.file_block_size && cur_bytes > 0 {
            self.flush_sequence_buffer()?;
            self.mark_block_end();
            self.open_new_sequence_file()?;
        }

        let (payload, ranges, num_compressed) = if self.params.use_compression {
            let compressed = CompressedSequence::new(seq);
            (
                compressed.twobit().to_vec(),
                compressed.ranges().to_vec(),
                compressed.num_compressed_bases() as i64,
            )
        } else {
            (
                seq.to_vec(),
                vec![Range::new(0, seq.len() as i32)],
                seq.len() as i64,
            )
        };

        let file = self.current_file();
        let seq_line = SeqDbSequenceLine {
            seq_id: self.seq_lines.len() as i32,
            header: header.to_string(),
            file_id: file.file_id,
            file_offset: file.num_bytes,
            num_bytes: payload.len() as i32,
            num_bases: seq.len() as i32,
            ranges,
        };
        self.seq_lines.push(seq_line);

        let file = self.current_file_mut();
        file.num_bytes += payload.len() as i64;
        file.num_sequences += 1;
        file.num_compressed_bases += num_compressed;
        self.block_num_bytes += payload.len() as i64;

        self.seq_buffer.extend_from_slice(&payload);
        if self.seq_buffer.len() as i64 > self.params.flush_size {
            self.flush_sequence_buffer()?;
        }

        if self.params.block_size > 0 && self.block_num_bytes >= self.params.block_size {
            self.mark_block_end();
        }
        Ok(())
    }

    /// Close the current block, if it holds any sequences.
    pub fn mark_block_end(&mut self) {
        let end_seq_id = self.seq_lines.len() as i32;
        if end_seq_id > self.block_start_seq_id {
            self.block_lines.push(SeqDbBlockLine {
                block_id: self.block_lines.len() as i32,
                start_seq_id: self.block_start_seq_id,
                end_seq_id,
                num_bytes: self.block_num_bytes,
            });
            self.block_start_seq_id = end_seq_id;
            self.block_num_bytes = 0;
        }
    }

    /// Flush pending payload, close the open block and write the text index.
    pub fn finish(mut self) -> SeqDbResult<()> {
        self.finish_internal()
    }

    pub fn num_sequences(&self) -> i32 {
        self.seq_lines.len() as i32
    }

    fn finish_internal(&mut self) -> SeqDbResult<()> {
        if self.finished {
            return Ok(());
        }
        self.flush_sequence_buffer()?;
        self.mark_block_end();

        let index = SeqDbIndex {
            version: SEQDB_VERSION.to_string(),
            compressed: self.params.use_compression,
            file_lines: std::mem::take(&mut self.file_lines),
            seq_lines: std::mem::take(&mut self.seq_lines),
            block_lines: std::mem::take(&mut self.block_lines),
        };
        let mut out = File::create(&self.index_path)?;
        out.write_all(index.to_string().as_bytes())?;
        out.flush()?;
        self.out_seqs = None;
        self.finished = true;
        Ok(())
    }

    fn current_file(&self) -> &SeqDbFileLine {
        // Invariant: the constructor opens the first payload file.
        self.file_lines.last().expect("payload file must be open")
    }

    fn current_file_mut(&mut self) -> &mut SeqDbFileLine {
        self.file_lines.last_mut().expect("payload file must be open")
    }

    fn open_new_sequence_file(&mut self) -> SeqDbResult<()> {
        let file_id = self.file_lines.len() as i32;
        let filename = format!("{}.seqdb.{}.seq", self.basename, file_id);
        let path = self.parent.join(&filename);
        self.out_seqs = Some(File::create(path)?);
        self.file_lines.push(SeqDbFileLine {
            file_id,
            filename,
            num_sequences: 0,
            num_bytes: 0,
            num_compressed_bases: 0,
        });
        Ok(())
    }

    fn flush_sequence_buffer(&mut self) -> SeqDbResult<()> {
        if self.seq_buffer.is_empty() {
            return Ok(());
        }
        let out = self
            .out_seqs
            .as_mut()
            .ok_or_else(|| SeqDbError::InvalidArgument("no open payload file".to_string()))?;
        out.write_all(&self.seq_buffer)?;
        self.seq_buffer.clear();
        Ok(())
    }
}

impl Drop for SeqDbWriter {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.finish_internal() {
                log::warn!("failed to finalize SeqDB on drop: {e}");
            }
        }
    }
}
