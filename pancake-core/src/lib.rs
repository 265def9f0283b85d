//! Pancake core library
//!
//! Seed-based all-vs-all overlap detection for long, low-error reads: the
//! block-partitioned sequence and seed databases, the in-memory seed index,
//! and the mapper that turns query seeds into chained, gap-verified,
//! identity-scored overlaps.

pub mod chain;
pub mod fasta;
pub mod index;
pub mod mapper;
pub mod overlap;
pub mod pipeline;
pub mod seed;
pub mod seeddb;
pub mod seqdb;
pub mod ses;
pub mod types;

// Re-export the types most callers touch.
pub use index::{FrequencyStats, SeedIndex, SeedIndexError};
pub use mapper::{Mapper, MapperError, MapperParams};
pub use overlap::Overlap;
pub use pipeline::{run_overlaps, PipelineError, PipelineParams, QueryOverlaps};
pub use seed::{extract_seeds, SeedParams, SeedWord};
pub use seeddb::{SeedDbIndex, SeedDbReader, SeedDbWriter, SeedDbWriterParams};
pub use seqdb::{SeqDbIndex, SeqDbReader, SeqDbWriter, SeqDbWriterParams, Sequence};
pub use types::{Range, SeedHit};

/// Version information for the pancake core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
