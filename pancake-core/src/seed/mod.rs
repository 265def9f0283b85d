//! Seed generation: the packed seed codec and the canonical minimizer
//! extractor that feeds the seed databases.

pub mod encoding;
pub mod minimizer;
pub mod utils;

pub use encoding::{decode_key, encode, Seed, SeedWord};
pub use minimizer::extract_seeds;

use serde::{Deserialize, Serialize};

/// Result type for seeding operations
pub type SeedResult<T> = Result<T, SeedError>;

/// Errors that can occur during seeding
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),
}

/// Parameters controlling minimizer generation. Persisted with every SeedDB
/// and compared on load; a query/target pair indexed with different
/// parameters cannot be overlapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedParams {
    /// K-mer size, in `1..=32`.
    pub k: i32,
    /// Minimizer window width.
    pub w: i32,
    /// Collapse homopolymer runs before hashing.
    pub use_hpc: bool,
    /// Longest homopolymer run that can be collapsed.
    pub max_hpc_len: i32,
    /// Hash both strands and keep the canonical (smaller) key.
    pub use_rc: bool,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            k: 30,
            w: 80,
            use_hpc: false,
            max_hpc_len: 10,
            use_rc: true,
        }
    }
}

impl SeedParams {
    pub fn validate(&self) -> SeedResult<()> {
        if self.k < 1 || self.k > 32 {
            return Err(SeedError::InvalidParams(format!(
                "k must be in 1..=32, got {}",
                self.k
            )));
        }
        if self.w < 1 {
            return Err(SeedError::InvalidParams(format!(
                "w must be >= 1, got {}",
                self.w
            )));
        }
        if self.max_hpc_len < 1 {
            return Err(SeedError::InvalidParams(format!(
                "max_hpc_len must be >= 1, got {}",
                self.max_hpc_len
            )));
        }
        Ok(())
    }

    /// Render the index `P`-line payload, e.g. `k=30,w=80,hpc=0,hpc_len=10,rc=1`.
    pub fn to_index_line(&self) -> String {
        format!(
            "k={},w={},hpc={},hpc_len={},rc={}",
            self.k,
            self.w,
            self.use_hpc as i32,
            self.max_hpc_len,
            self.use_rc as i32
        )
    }

    /// Parse a `P`-line payload. Unknown keys are ignored; a token without
    /// a `name=value` shape is an error.
    pub fn parse_index_line(line: &str) -> SeedResult<Self> {
        let mut params = Self::default();
        for part in line.split(',') {
            if part.is_empty() {
                continue;
            }
            let (name, value) = part.split_once('=').ok_or_else(|| {
                SeedError::InvalidParams(format!(
                    "parameter is not of the form 'name=value': '{part}'"
                ))
            })?;
            let parsed: i32 = value.parse().map_err(|_| {
                SeedError::InvalidParams(format!("non-numeric parameter value: '{part}'"))
            })?;
            match name {
                "k" => params.k = parsed,
                "w" => params.w = parsed,
                "hpc" => params.use_hpc = parsed != 0,
                "hpc_len" => params.max_hpc_len = parsed,
                "rc" => params.use_rc = parsed != 0,
                _ => {}
            }
        }
        Ok(params)
    }
}
