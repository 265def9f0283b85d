//! The SeqDB reader: random access to single sequences and batched block
//! loads. Payload files are opened lazily and kept open for the life of the
//! reader; block buffers are owned by the returned block, not the reader.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::compression::decompress;
use super::index::SeqDbIndex;
use super::{SeqDbError, SeqDbResult};

/// One materialized sequence, ASCII bases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub id: i32,
    pub header: String,
    pub bases: Vec<u8>,
}

impl Sequence {
    pub fn len(&self) -> i32 {
        self.bases.len() as i32
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

/// All sequences of one block, addressable by global sequence ID.
#[derive(Debug)]
pub struct SequenceBlock {
    pub block_id: i32,
    start_seq_id: i32,
    sequences: Vec<Sequence>,
}

impl SequenceBlock {
    /// Assemble a block from already-resident sequences. `start_seq_id`
    /// must equal the ID of the first sequence.
    pub fn new(block_id: i32, start_seq_id: i32, sequences: Vec<Sequence>) -> Self {
        Self {
            block_id,
            start_seq_id,
            sequences,
        }
    }

    pub fn get(&self, seq_id: i32) -> Option<&Sequence> {
        let offset = seq_id - self.start_seq_id;
        if offset < 0 {
            return None;
        }
        self.sequences.get(offset as usize)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.sequences.iter()
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

pub struct SeqDbReader {
    index: SeqDbIndex,
    root: PathBuf,
    files: FxHashMap<i32, File>,
}

impl SeqDbReader {
    pub fn open<P: AsRef<Path>>(index_path: P) -> SeqDbResult<Self> {
        let index = SeqDbIndex::load(index_path.as_ref())?;
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

    pub fn index(&self) -> &SeqDbIndex {
        &self.index
    }

    /// Random access to one sequence.
    pub fn get_sequence(&mut self, seq_id: i32) -> SeqDbResult<Sequence> {
        let sl = self.index.sequence_line(seq_id)?.clone();
        let payload = self.read_payload(sl.file_id, sl.file_offset, sl.num_bytes as usize)?;
        let bases = if self.index.compressed {
            decompress(&payload, sl.num_bases, &sl.ranges)?
        } else {
            payload
        };
        Ok(Sequence {
            id: sl.seq_id,
            header: sl.header,
            bases,
        })
    }

    /// Load a whole block with one sequential payload read.
    pub fn load_block(&mut self, block_id: i32) -> SeqDbResult<SequenceBlock> {
        let bl = *self.index.block_line(block_id)?;
        if bl.span() <= 0 {
            return Ok(SequenceBlock {
                block_id,
                start_seq_id: bl.start_seq_id,
                sequences: Vec::new(),
            });
        }

        let first = self.index.sequence_line(bl.start_seq_id)?.clone();
        // Blocks never straddle payload files, so one read covers everything.
        for seq_id in bl.start_seq_id..bl.end_seq_id {
            let sl = self.index.sequence_line(seq_id)?;
            if sl.file_id != first.file_id {
                return Err(SeqDbError::Malformed(format!(
                    "block {block_id} straddles payload files {} and {}",
                    first.file_id, sl.file_id
                )));
            }
        }
        let buffer = self.read_payload(first.file_id, first.file_offset, bl.num_bytes as usize)?;

        let mut sequences = Vec::with_capacity(bl.span() as usize);
        for seq_id in bl.start_seq_id..bl.end_seq_id {
            let sl = self.index.sequence_line(seq_id)?;
            let start = (sl.file_offset - first.file_offset) as usize;
            let end = start + sl.num_bytes as usize;
            let payload = buffer.get(start..end).ok_or_else(|| {
                SeqDbError::Malformed(format!(
                    "block {block_id} payload of {} bytes too short for seq {seq_id}",
                    buffer.len()
                ))
            })?;
            let bases = if self.index.compressed {
                decompress(payload, sl.num_bases, &sl.ranges)?
            } else {
                payload.to_vec()
            };
            sequences.push(Sequence {
                id: sl.seq_id,
                header: sl.header.clone(),
                bases,
            });
        }

        Ok(SequenceBlock {
            block_id,
            start_seq_id: bl.start_seq_id,
            sequences,
        })
    }

    pub fn block_range(&self, block_id: i32) -> SeqDbResult<(i32, i32)> {
        self.index.block_range(block_id)
    }

    fn read_payload(&mut self, file_id: i32, offset: i64, num_bytes: usize) -> SeqDbResult<Vec<u8>> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seqdb::writer::{SeqDbWriter, SeqDbWriterParams};
    use tempfile::TempDir;

    fn build_db(dir: &TempDir, compress: bool) -> PathBuf {
        let prefix = dir.path().join("db");
        let params = SeqDbWriterParams {
            use_compression: compress,
            block_size: 0,
            ..Default::default()
        };
        let mut writer = SeqDbWriter::new(&prefix, params).unwrap();
        writer.add_sequence("read/1", b"ACGTACGTACGTTTGA").unwrap();
        writer.add_sequence("read/2", b"GGGGCCCCAAAATTTT").unwrap();
        writer.mark_block_end();
        writer.add_sequence("read/3", b"ACGTNNACGTACGTAC").unwrap();
        writer.finish().unwrap();
        dir.path().join("db.seqdb")
    }

    #[test]
    fn test_get_sequence_roundtrip_compressed() {
        let dir = TempDir::new().unwrap();
        let mut reader = SeqDbReader::open(build_db(&dir, true)).unwrap();
        let seq = reader.get_sequence(0).unwrap();
        assert_eq!(seq.header, "read/1");
        assert_eq!(seq.bases, b"ACGTACGTACGTTTGA");
        let seq = reader.get_sequence(2).unwrap();
        assert_eq!(seq.bases, b"ACGTNNACGTACGTAC");
    }

    #[test]
    fn test_get_sequence_roundtrip_uncompressed() {
        let dir = TempDir::new().unwrap();
        let mut reader = SeqDbReader::open(build_db(&dir, false)).unwrap();
        let seq = reader.get_sequence(1).unwrap();
        assert_eq!(seq.bases, b"GGGGCCCCAAAATTTT");
    }

    #[test]
    fn test_load_block() {
        let dir = TempDir::new().unwrap();
        let mut reader = SeqDbReader::open(build_db(&dir, true)).unwrap();
        let block = reader.load_block(0).unwrap();
        assert_eq!(block.len(), 2);
        assert_eq!(block.get(0).unwrap().header, "read/1");
        assert_eq!(block.get(1).unwrap().bases, b"GGGGCCCCAAAATTTT");
        assert!(block.get(2).is_none());

        let block = reader.load_block(1).unwrap();
        assert_eq!(block.len(), 1);
        assert_eq!(block.get(2).unwrap().bases, b"ACGTNNACGTACGTAC");
    }

    #[test]
    fn test_invalid_ids_error() {
        let dir = TempDir::new().unwrap();
        let mut reader = SeqDbReader::open(build_db(&dir, true)).unwrap();
        assert!(reader.get_sequence(99).is_err());
        assert!(reader.load_block(99).is_err());
    }
}
