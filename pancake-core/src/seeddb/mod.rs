//! The seed database: block-partitioned binary files of packed seed words,
//! paralleling the SeqDB, with a line-oriented text index that also persists
//! the seeding parameters.

pub mod index;
pub mod reader;
pub mod writer;

pub use index::{
    validate_matching_params, validate_paired, SeedDbBlockLine, SeedDbFileLine, SeedDbIndex,
    SeedDbSeedsLine,
};
pub use reader::{SeedBlock, SeedDbReader};
pub use writer::{SeedDbWriter, SeedDbWriterParams};

/// Result type for seed database operations
pub type SeedDbResult<T> = Result<T, SeedDbError>;

/// Errors raised by the seed database layers
#[derive(Debug, thiserror::Error)]
pub enum SeedDbError {
    #[error("Malformed index: {0}")]
    Malformed(String),

    #[error("Index mismatch: {0}")]
    Mismatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
