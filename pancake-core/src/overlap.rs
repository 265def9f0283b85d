//! The pairwise overlap record and its M4 rendering.
//!
//! Coordinates follow the original tool's convention: `a_*` is the query,
//! `b_*` the target. `b_start`/`b_end` are in the strand of the mapping,
//! i.e. for a reverse-strand overlap they address the reverse-complemented
//! target.

use std::io::{self, Write};

/// Sentinel identity for overlaps whose aligned span is zero.
pub const IDENTITY_UNDEFINED: f32 = -2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    pub a_id: i32,
    pub b_id: i32,
    pub score: i32,
    pub identity: f32,
    pub a_rev: bool,
    pub a_start: i32,
    pub a_end: i32,
    pub a_len: i32,
    pub b_rev: bool,
    pub b_start: i32,
    pub b_end: i32,
    pub b_len: i32,
    pub edit_distance: i32,
    pub num_seeds: i32,
}

impl Overlap {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        a_id: i32,
        b_id: i32,
        score: i32,
        identity: f32,
        a_rev: bool,
        a_start: i32,
        a_end: i32,
        a_len: i32,
        b_rev: bool,
        b_start: i32,
        b_end: i32,
        b_len: i32,
        edit_distance: i32,
        num_seeds: i32,
    ) -> Self {
        Self {
            a_id,
            b_id,
            score,
            identity,
            a_rev,
            a_start,
            a_end,
            a_len,
            b_rev,
            b_start,
            b_end,
            b_len,
            edit_distance,
            num_seeds,
        }
    }

    pub fn a_span(&self) -> i32 {
        self.a_end - self.a_start
    }

    pub fn b_span(&self) -> i32 {
        self.b_end - self.b_start
    }

    /// Render one M4 row:
    /// `a b score identity a_rev a_start a_end a_len b_rev b_start b_end b_len`.
    /// Names replace numeric IDs when given.
    pub fn to_m4_row(&self, a_name: Option<&str>, b_name: Option<&str>) -> String {
        let a = a_name.map_or_else(|| self.a_id.to_string(), str::to_string);
        let b = b_name.map_or_else(|| self.b_id.to_string(), str::to_string);
        format!(
            "{} {} {} {:.2} {} {} {} {} {} {} {} {}",
            a,
            b,
            self.score,
            self.identity,
            self.a_rev as i32,
            self.a_start,
            self.a_end,
            self.a_len,
            self.b_rev as i32,
            self.b_start,
            self.b_end,
            self.b_len
        )
    }
}

/// Write a batch of overlaps as M4 rows.
pub fn write_m4<W: Write>(
    writer: &mut W,
    overlaps: &[Overlap],
    a_name: Option<&str>,
    b_names: Option<&dyn Fn(i32) -> String>,
) -> io::Result<()> {
    for ovl in overlaps {
        let b = b_names.map(|f| f(ovl.b_id));
        writeln!(writer, "{}", ovl.to_m4_row(a_name, b.as_deref()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Overlap {
        Overlap::new(
            0, 3, -9000, 99.83, false, 0, 9000, 10000, true, 500, 9500, 12000, 15, 42,
        )
    }

    #[test]
    fn test_spans() {
        let ovl = sample();
        assert_eq!(ovl.a_span(), 9000);
        assert_eq!(ovl.b_span(), 9000);
    }

    #[test]
    fn test_m4_row_with_ids() {
        let ovl = sample();
        assert_eq!(
            ovl.to_m4_row(None, None),
            "0 3 -9000 99.83 0 0 9000 10000 1 500 9500 12000"
        );
    }

    #[test]
    fn test_m4_row_with_names() {
        let ovl = sample();
        assert_eq!(
            ovl.to_m4_row(Some("read/1"), Some("read/7")),
            "read/1 read/7 -9000 99.83 0 0 9000 10000 1 500 9500 12000"
        );
    }

    #[test]
    fn test_write_m4_batch() {
        let overlaps = vec![sample(), sample()];
        let mut buf = Vec::new();
        write_m4(&mut buf, &overlaps, None, None).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
