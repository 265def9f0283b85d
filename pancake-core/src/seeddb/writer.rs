//! The SeedDB writer.
//!
//! Seed payload files are pure binary: little-endian 128-bit seed words
//! concatenated in ascending `seq_id` order. With `split_blocks` every block
//! goes to its own payload file; the rotation is deferred until the next
//! write so that the last block does not leave an empty trailing file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use super::index::{
    SeedDbBlockLine, SeedDbFileLine, SeedDbIndex, SeedDbSeedsLine, SEEDDB_VERSION, SEED_WORD_BYTES,
};
use super::{SeedDbError, SeedDbResult};
use crate::seed::{SeedParams, SeedWord};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SeedDbWriterParams {
    /// Write the seeds of each block into a separate payload file.
    pub split_blocks: bool,
}

pub struct SeedDbWriter {
    parent: PathBuf,
    basename: String,
    index_path: PathBuf,
    seed_params: SeedParams,
    params: SeedDbWriterParams,
    file_lines: Vec<SeedDbFileLine>,
    seeds_lines: Vec<SeedDbSeedsLine>,
    block_lines: Vec<SeedDbBlockLine>,
    out_seeds: Option<BufWriter<File>>,
    open_new_file_on_next_write: bool,
    block_start_seq_id: i32,
    block_num_bytes: i64,
    finished: bool,
}

impl SeedDbWriter {
    pub fn new<P: AsRef<Path>>(
        prefix: P,
        seed_params: SeedParams,
        params: SeedDbWriterParams,
    ) -> SeedDbResult<Self> {
        seed_params
            .validate()
            .map_err(|e| SeedDbError::InvalidArgument(e.to_string()))?;

        let prefix = prefix.as_ref();
        let parent = prefix.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        let basename = prefix
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                SeedDbError::InvalidArgument(format!(
                    "invalid output prefix '{}'",
                    prefix.display()
                ))
            })?;
        let index_path = parent.join(format!("{basename}.seeddb"));

        let mut writer = Self {
            parent,
            basename,
            index_path,
            seed_params,
            params,
            file_lines: Vec::new(),
            seeds_lines: Vec::new(),
            block_lines: Vec::new(),
            out_seeds: None,
            open_new_file_on_next_write: false,
            block_start_seq_id: 0,
            block_num_bytes: 0,
            finished: false,
        };
        writer.open_new_seeds_file()?;
        Ok(writer)
    }

    /// Append the seeds of the next sequence.
    pub fn add_seeds(&mut self, header: &str, num_bases: i32, seeds: &[SeedWord]) -> SeedDbResult<()> {
        if self.open_new_file_on_next_write {
            self.open_new_seeds_file()?;
            self.open_new_file_on_next_write = false;
        }

        let out = self
            .out_seeds
            .as_mut()
            .ok_or_else(|| SeedDbError::InvalidArgument("no open payload file".to_string()))?;
        for &word in seeds {
            out.write_u128::<LittleEndian>(word)?;
        }

        let num_bytes = seeds.len() as i64 * SEED_WORD_BYTES;
        let file = self.file_lines.last_mut().expect("payload file must be open");
        self.seeds_lines.push(SeedDbSeedsLine {
            seq_id: self.seeds_lines.len() as i32,
            header: header.to_string(),
            file_id: file.file_id,
            file_offset: file.num_bytes,
            num_bytes,
            num_bases,
            num_seeds: seeds.len() as i32,
        });
        file.num_bytes += num_bytes;
        file.num_sequences += 1;
        self.block_num_bytes += num_bytes;
        Ok(())
    }

    /// Close the current block, if it holds any sequences.
    pub fn mark_block_end(&mut self) {
        let end_seq_id = self.seeds_lines.len() as i32;
        if end_seq_id > self.block_start_seq_id {
            self.block_lines.push(SeedDbBlockLine {
                block_id: self.block_lines.len() as i32,
                start_seq_id: self.block_start_seq_id,
                end_seq_id,
                num_bytes: self.block_num_bytes,
            });
            self.block_start_seq_id = end_seq_id;
            self.block_num_bytes = 0;
            if self.params.split_blocks {
                self.open_new_file_on_next_write = true;
            }
        }
    }

    /// Flush payload, close the open block and write the text index.
    pub fn finish(mut self) -> SeedDbResult<()> {
        self.finish_internal()
    }

    pub fn num_sequences(&self) -> i32 {
        self.seeds_lines.len() as i32
    }

    fn finish_internal(&mut self) -> SeedDbResult<()> {
        if self.finished {
            return Ok(());
        }
        if let Some(out) = self.out_seeds.as_mut() {
            out.flush()?;
        }
        self.mark_block_end();

        let index = SeedDbIndex {
            version: SEEDDB_VERSION.to_string(),
            params: self.seed_params,
            file_lines: std::mem::take(&mut self.file_lines),
            seeds_lines: std::mem::take(&mut self.seeds_lines),
            block_lines: std::mem::take(&mut self.block_lines),
        };
        let mut out = File::create(&self.index_path)?;
        out.write_all(index.to_string().as_bytes())?;
        out.flush()?;
        self.out_seeds = None;
        self.finished = true;
        Ok(())
    }

    fn open_new_seeds_file(&mut self) -> SeedDbResult<()> {
        if let Some(out) = self.out_seeds.as_mut() {
            out.flush()?;
        }
        let file_id = self.file_lines.len() as i32;
        let filename = format!("{}.seeddb.{}.seeds", self.basename, file_id);
        let path = self.parent.join(&filename);
        self.out_seeds = Some(BufWriter::new(File::create(path)?));
        self.file_lines.push(SeedDbFileLine {
            file_id,
            filename,
            num_sequences: 0,
            num_bytes: 0,
        });
        Ok(())
    }
}

impl Drop for SeedDbWriter {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.finish_internal() {
                log::warn!("failed to finalize SeedDB on drop: {e}");
            }
        }
    }
}
