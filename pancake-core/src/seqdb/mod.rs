//! The sequence database: a block-partitioned on-disk store of reads with a
//! line-oriented text index and optionally 2-bit-compressed payload files.

pub mod compression;
pub mod index;
pub mod reader;
pub mod writer;

pub use compression::CompressedSequence;
pub use index::{SeqDbBlockLine, SeqDbFileLine, SeqDbIndex, SeqDbSequenceLine};
pub use reader::{SeqDbReader, Sequence, SequenceBlock};
pub use writer::{SeqDbWriter, SeqDbWriterParams};

/// Result type for sequence database operations
pub type SeqDbResult<T> = Result<T, SeqDbError>;

/// Errors raised by the sequence database layers
#[derive(Debug, thiserror::Error)]
pub enum SeqDbError {
    #[error("Malformed index: {0}")]
    Malformed(String),

    #[error("Index mismatch: {0}")]
    Mismatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
