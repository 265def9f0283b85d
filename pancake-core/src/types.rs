//! Shared types for the pancake core: kept-base ranges and seed hits.
//!
//! Strand orientation travels as a `bool` (`true` = reverse) throughout the
//! crate, matching the packed seed word's single strand bit.

use serde::{Deserialize, Serialize};

/// A half-open interval of kept bases, in original sequence coordinates.
///
/// Uncompressed sequences carry a single range covering the whole sequence;
/// 2-bit compression produces one range per stretch of ACGT bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: i32,
    pub end: i32,
}

impl Range {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> i32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A single query seed matched against an indexed target seed.
///
/// Derived during mapping, never persisted. `target_pos` is already adjusted
/// to the query's strand when `target_rev` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHit {
    pub target_id: i32,
    pub target_rev: bool,
    pub target_pos: i32,
    pub query_pos: i32,
    pub flags: u32,
}

impl SeedHit {
    pub fn new(target_id: i32, target_rev: bool, target_pos: i32, query_pos: i32) -> Self {
        Self {
            target_id,
            target_rev,
            target_pos,
            query_pos,
            flags: 0,
        }
    }

    /// Diagonal of the hit. Colinear hits share a diagonal up to indels.
    pub fn diagonal(&self) -> i32 {
        self.target_pos - self.query_pos
    }
}
