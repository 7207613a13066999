//! Snippet responses, cache keys and line-range trimming.

use std::fmt;

use serde::{Deserialize, Serialize};
use sitembed_common::LineRangeError;

/// What the snippet host passes to the page callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetResponse {
    /// Stylesheet URL for the embed markup.
    pub stylesheet: String,
    /// Embed markup: a `.gist-data` table with one `tbody > tr` per line.
    pub div: String,
}

/// Identifies one file inside one snippet. Displays as `{snippet}_{file}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnippetKey {
    pub snippet_id: String,
    pub file: String,
}

impl SnippetKey {
    pub fn new(snippet_id: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            snippet_id: snippet_id.into(),
            file: file.into(),
        }
    }
}

impl fmt::Display for SnippetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.snippet_id, self.file)
    }
}

/// Rows `start..end`, or `start..` when `end` is `None`.
///
/// On the JS side a range is `[start, end]` or `[start]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct LineRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn from_start(start: usize) -> Self {
        Self { start, end: None }
    }
}

impl TryFrom<Vec<usize>> for LineRange {
    type Error = LineRangeError;

    fn try_from(v: Vec<usize>) -> Result<Self, Self::Error> {
        match v.as_slice() {
            [start] => Ok(Self::from_start(*start)),
            [start, end] => Ok(Self::new(*start, *end)),
            other => Err(LineRangeError::Arity(other.len())),
        }
    }
}

impl From<LineRange> for Vec<usize> {
    fn from(r: LineRange) -> Self {
        match r.end {
            Some(end) => vec![r.start, end],
            None => vec![r.start],
        }
    }
}

/// A validated, ordered set of ranges to keep.
///
/// Construction rejects empty or reversed ranges, ranges that start before
/// the previous one ends, and open-ended ranges anywhere but last. Bounds
/// against the actual row count are checked in [`LineRanges::retained`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineRanges(Vec<LineRange>);

impl LineRanges {
    pub fn new(ranges: Vec<LineRange>) -> Result<Self, LineRangeError> {
        let mut previous: Option<LineRange> = None;
        for range in &ranges {
            if let Some(end) = range.end {
                if range.start >= end {
                    return Err(LineRangeError::Empty {
                        start: range.start,
                        end,
                    });
                }
            }
            if let Some(prev) = previous {
                let Some(previous_end) = prev.end else {
                    return Err(LineRangeError::OpenNotLast { start: prev.start });
                };
                if range.start < previous_end {
                    return Err(LineRangeError::Unordered {
                        start: range.start,
                        previous_end,
                    });
                }
            }
            previous = Some(*range);
        }
        Ok(Self(ranges))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ranges(&self) -> &[LineRange] {
        &self.0
    }

    /// Which of `rows` rows survive, by index.
    ///
    /// With no ranges every row is kept.
    pub fn retained(&self, rows: usize) -> Result<Vec<bool>, LineRangeError> {
        if self.is_empty() {
            return Ok(vec![true; rows]);
        }

        let mut keep = vec![false; rows];
        for range in &self.0 {
            let end = match range.end {
                Some(end) if end > rows => {
                    return Err(LineRangeError::OutOfBounds { end, rows });
                }
                Some(end) => end,
                None if range.start > rows => {
                    return Err(LineRangeError::OutOfBounds {
                        end: range.start,
                        rows,
                    });
                }
                None => rows,
            };
            keep[range.start..end].fill(true);
        }
        Ok(keep)
    }
}

impl TryFrom<Vec<LineRange>> for LineRanges {
    type Error = LineRangeError;

    fn try_from(ranges: Vec<LineRange>) -> Result<Self, Self::Error> {
        Self::new(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept(ranges: &LineRanges, rows: usize) -> Vec<usize> {
        ranges
            .retained(rows)
            .unwrap()
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect()
    }

    #[test]
    fn key_display() {
        assert_eq!(SnippetKey::new("abc123", "main.rs").to_string(), "abc123_main.rs");
    }

    #[test]
    fn single_range_keeps_half_open_rows() {
        let ranges = LineRanges::new(vec![LineRange::new(2, 5)]).unwrap();
        assert_eq!(kept(&ranges, 10), vec![2, 3, 4]);
    }

    #[test]
    fn empty_ranges_keep_everything() {
        let ranges = LineRanges::default();
        assert_eq!(ranges.retained(4).unwrap(), vec![true; 4]);
    }

    #[test]
    fn several_ranges_in_order() {
        let ranges =
            LineRanges::new(vec![LineRange::new(0, 2), LineRange::new(5, 7)]).unwrap();
        assert_eq!(kept(&ranges, 10), vec![0, 1, 5, 6]);
    }

    #[test]
    fn adjacent_ranges_are_fine() {
        let ranges =
            LineRanges::new(vec![LineRange::new(1, 3), LineRange::new(3, 4)]).unwrap();
        assert_eq!(kept(&ranges, 5), vec![1, 2, 3]);
    }

    #[test]
    fn open_ended_range_runs_to_the_last_row() {
        let ranges =
            LineRanges::new(vec![LineRange::new(0, 1), LineRange::from_start(7)]).unwrap();
        assert_eq!(kept(&ranges, 10), vec![0, 7, 8, 9]);
    }

    #[test]
    fn range_ending_at_row_count_is_in_bounds() {
        let ranges = LineRanges::new(vec![LineRange::new(8, 10)]).unwrap();
        assert_eq!(kept(&ranges, 10), vec![8, 9]);
    }

    #[test]
    fn rejects_reversed_and_empty() {
        assert_eq!(
            LineRanges::new(vec![LineRange::new(5, 2)]),
            Err(LineRangeError::Empty { start: 5, end: 2 })
        );
        assert_eq!(
            LineRanges::new(vec![LineRange::new(3, 3)]),
            Err(LineRangeError::Empty { start: 3, end: 3 })
        );
    }

    #[test]
    fn rejects_overlap_and_unsorted() {
        assert_eq!(
            LineRanges::new(vec![LineRange::new(0, 5), LineRange::new(4, 6)]),
            Err(LineRangeError::Unordered {
                start: 4,
                previous_end: 5
            })
        );
        assert_eq!(
            LineRanges::new(vec![LineRange::new(6, 8), LineRange::new(1, 2)]),
            Err(LineRangeError::Unordered {
                start: 1,
                previous_end: 8
            })
        );
    }

    #[test]
    fn rejects_open_range_before_another() {
        assert_eq!(
            LineRanges::new(vec![LineRange::from_start(2), LineRange::new(5, 6)]),
            Err(LineRangeError::OpenNotLast { start: 2 })
        );
    }

    #[test]
    fn rejects_out_of_bounds_at_apply_time() {
        let ranges = LineRanges::new(vec![LineRange::new(2, 12)]).unwrap();
        assert_eq!(
            ranges.retained(10),
            Err(LineRangeError::OutOfBounds { end: 12, rows: 10 })
        );

        let open = LineRanges::new(vec![LineRange::from_start(11)]).unwrap();
        assert_eq!(
            open.retained(10),
            Err(LineRangeError::OutOfBounds { end: 11, rows: 10 })
        );
    }

    #[test]
    fn ranges_decode_from_nested_arrays() {
        let ranges: Vec<LineRange> = serde_json::from_str("[[2, 5], [7]]").unwrap();
        assert_eq!(ranges, vec![LineRange::new(2, 5), LineRange::from_start(7)]);

        let bad = serde_json::from_str::<Vec<LineRange>>("[[1, 2, 3]]");
        assert!(bad.is_err());
    }

    #[test]
    fn response_ignores_extra_fields() {
        let response: SnippetResponse = serde_json::from_str(
            r#"{ "description": "x", "stylesheet": "https://gist.github.com/a.css", "div": "<div></div>" }"#,
        )
        .unwrap();
        assert_eq!(response.stylesheet, "https://gist.github.com/a.css");
    }
}
