//! Page range selection.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// A page range as it arrives in a request; either end may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRequest {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

impl RangeRequest {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

/// Inclusive, 1-indexed page interval, always within the document.
///
/// An empty document selects `{1, 0}`, which iterates no pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Normalize a requested range against the document's page count.
    ///
    /// Out-of-bounds ends are clamped and a reversed range is swapped;
    /// nothing is ever rejected.
    pub fn select(requested: Option<RangeRequest>, page_count: u32) -> Self {
        if page_count == 0 {
            return Self { start: 1, end: 0 };
        }

        let requested = requested.unwrap_or_default();
        let clamp = |v: i64| v.clamp(1, i64::from(page_count)) as u32;
        let start = clamp(requested.start.unwrap_or(1));
        let end = clamp(requested.end.unwrap_or(i64::from(page_count)));

        if start > end {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// The whole document.
    pub fn full(page_count: u32) -> Self {
        Self::select(None, page_count)
    }

    pub fn pages(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Renders as `3-5`.
impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
