//! The SeedDB reader: per-sequence seed fetches and contiguous block loads.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use rustc_hash::FxHashMap;

use super::index::SeedDbIndex;
use super::{SeedDbError, SeedDbResult};
use crate::seed::SeedWord;

/// All seeds of one block in a single contiguous buffer, with per-sequence
/// sub-ranges addressable by global sequence ID.
#[derive(Debug)]
pub struct SeedBlock {
    pub block_id: i32,
    start_seq_id: i32,
    seeds: Vec<SeedWord>,
    spans: Vec<(usize, usize)>,
}

impl SeedBlock {
    /// The whole block's seeds, grouped by `seq_id` in ascending order.
    pub fn seeds(&self) -> &[SeedWord] {
        &self.seeds
    }

    pub fn into_seeds(self) -> Vec<SeedWord> {
        self.seeds
    }

    /// The seeds of one member sequence.
    pub fn seeds_for(&self, seq_id: i32) -> Option<&[SeedWord]> {
        let offset = seq_id - self.start_seq_id;
        if offset < 0 {
            return None;
        }
        self.spans
            .get(offset as usize)
            .map(|&(start, end)| &self.seeds[start..end])
    }
}

pub struct SeedDbReader {
    index: SeedDbIndex,
    root: PathBuf,
    files: FxHashMap<i32, File>,
}

impl SeedDbReader {
    pub fn open<P: AsRef<Path>>(index_path: P) -> SeedDbResult<Self> {
        let index = SeedDbIndex::load(index_path.as_ref())?;
        let root = index_path
            .as_ref()
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .to_path_buf();
        Ok(Self {
            index,
            root,
            files: FxHashMap::default(),
        })
    }

    pub fn index(&self) -> &SeedDbIndex {
        &self.index
    }

    /// Fetch the seeds of one sequence.
    pub fn get_seeds(&mut self, seq_id: i32) -> SeedDbResult<Vec<SeedWord>> {
        let sl = self.index.seeds_line(seq_id)?.clone();
        let payload = self.read_payload(sl.file_id, sl.file_offset, sl.num_bytes as usize)?;
        decode_words(&payload)
    }

    /// Load all seeds of a block as one contiguous buffer.
    pub fn load_block(&mut self, block_id: i32) -> SeedDbResult<SeedBlock> {
        let bl = *self.index.block_line(block_id)?;
        if bl.span() <= 0 {
            return Ok(SeedBlock {
                block_id,
                start_seq_id: bl.start_seq_id,
                seeds: Vec::new(),
                spans: Vec::new(),
            });
        }

        let first = self.index.seeds_line(bl.start_seq_id)?.clone();
        for seq_id in bl.start_seq_id..bl.end_seq_id {
            let sl = self.index.seeds_line(seq_id)?;
            if sl.file_id != first.file_id {
                return Err(SeedDbError::Malformed(format!(
                    "block {block_id} straddles payload files {} and {}",
                    first.file_id, sl.file_id
                )));
            }
        }

        let payload = self.read_payload(first.file_id, first.file_offset, bl.num_bytes as usize)?;
        let seeds = decode_words(&payload)?;

        let mut spans = Vec::with_capacity(bl.span() as usize);
        for seq_id in bl.start_seq_id..bl.end_seq_id {
            let sl = self.index.seeds_line(seq_id)?;
            let start = ((sl.file_offset - first.file_offset) / 16) as usize;
            let end = start + sl.num_seeds as usize;
            if end > seeds.len() {
                return Err(SeedDbError::Malformed(format!(
                    "block {block_id} payload of {} seeds too short for seq {seq_id}",
                    seeds.len()
                )));
            }
            spans.push((start, end));
        }

        Ok(SeedBlock {
            block_id,
            start_seq_id: bl.start_seq_id,
            seeds,
            spans,
        })
    }

    pub fn block_range(&self, block_id: i32) -> SeedDbResult<(i32, i32)> {
        self.index.block_range(block_id)
    }

    fn read_payload(&mut self, file_id: i32, offset: i64, num_bytes: usize) -> SeedDbResult<Vec<u8>> {
        if !self.files.contains_key(&file_id) {
            let fl = self.index.file_line(file_id)?;
            let file = File::open(self.root.join(&fl.filename))?;
            self.files.insert(file_id, file);
        }
        let file = self.files.get_mut(&file_id).expect("file cached above");
        file.seek(SeekFrom::Start(offset as u64))?;
        let mut buffer = vec![0u8; num_bytes];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}

fn decode_words(payload: &[u8]) -> SeedDbResult<Vec<SeedWord>> {
    if payload.len() % 16 != 0 {
        return Err(SeedDbError::Malformed(format!(
            "seed payload of {} bytes is not a multiple of the seed word size",
            payload.len()
        )));
    }
    let mut reader = payload;
    let mut words = Vec::with_capacity(payload.len() / 16);
    for _ in 0..payload.len() / 16 {
        words.push(reader.read_u128::<LittleEndian>()?);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{encode, SeedParams};
    use crate::seeddb::writer::{SeedDbWriter, SeedDbWriterParams};
    use tempfile::TempDir;

    fn build_db(dir: &TempDir, split_blocks: bool) -> PathBuf {
        let mut writer = SeedDbWriter::new(
            dir.path().join("db"),
            SeedParams::default(),
            SeedDbWriterParams { split_blocks },
        )
        .unwrap();
        writer
            .add_seeds(
                "read/1",
                5000,
                &[encode(10, 0, 1, false), encode(20, 0, 2, true)],
            )
            .unwrap();
        writer
            .add_seeds("read/2", 6000, &[encode(30, 1, 3, false)])
            .unwrap();
        writer.mark_block_end();
        writer
            .add_seeds("read/3", 7000, &[encode(40, 2, 4, false)])
            .unwrap();
        writer.finish().unwrap();
        dir.path().join("db.seeddb")
    }

    #[test]
    fn test_get_seeds_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut reader = SeedDbReader::open(build_db(&dir, false)).unwrap();
        assert_eq!(
            reader.get_seeds(0).unwrap(),
            vec![encode(10, 0, 1, false), encode(20, 0, 2, true)]
        );
        assert_eq!(reader.get_seeds(2).unwrap(), vec![encode(40, 2, 4, false)]);
        assert!(reader.get_seeds(3).is_err());
    }

    #[test]
    fn test_load_block_contiguous() {
        let dir = TempDir::new().unwrap();
        let mut reader = SeedDbReader::open(build_db(&dir, false)).unwrap();
        let block = reader.load_block(0).unwrap();
        assert_eq!(block.seeds().len(), 3);
        assert_eq!(
            block.seeds_for(0).unwrap(),
            &[encode(10, 0, 1, false), encode(20, 0, 2, true)]
        );
        assert_eq!(block.seeds_for(1).unwrap(), &[encode(30, 1, 3, false)]);
        assert!(block.seeds_for(2).is_none());
    }

    #[test]
    fn test_load_block_with_split_files() {
        let dir = TempDir::new().unwrap();
        let mut reader = SeedDbReader::open(build_db(&dir, true)).unwrap();
        let block = reader.load_block(1).unwrap();
        assert_eq!(block.seeds(), &[encode(40, 2, 4, false)]);
        assert_eq!(block.seeds_for(2).unwrap(), &[encode(40, 2, 4, false)]);
    }
}
