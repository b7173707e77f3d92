//! Primitive operations on time ranges.
//!
//! Everything downstream — availability, conflicts, recurrence durations —
//! is built from these three operations.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A span of time, start inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Intersection of two ranges.
///
/// Returns `None` when the ranges do not touch, and also when the
/// intersection would be a single instant: zero-width overlaps are never
/// reported.
pub fn overlap(a: TimeRange, b: TimeRange) -> Option<TimeRange> {
    if a.start > b.end || a.end < b.start {
        return None;
    }
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    (start < end).then(|| TimeRange::new(start, end))
}

/// Removes `busy` from every range in `free`.
///
/// A free range that truly overlaps the busy one is split into its left
/// and right remainders, dropping whichever is empty; ranges with no
/// overlap pass through unchanged. Applying this once per busy range
/// against the evolving free set yields free-minus-all-busy.
pub fn subtract_all(free: &[TimeRange], busy: TimeRange) -> Vec<TimeRange> {
    let mut remaining = Vec::with_capacity(free.len() + 1);
    for range in free {
        if !(range.start < busy.end && range.end > busy.start) {
            remaining.push(*range);
            continue;
        }
        if range.start < busy.start {
            remaining.push(TimeRange::new(range.start, busy.start));
        }
        if busy.end < range.end {
            remaining.push(TimeRange::new(busy.end, range.end));
        }
    }
    remaining
}

/// Collapses overlapping or exactly contiguous ranges.
///
/// Output is sorted by start, non-overlapping, and minimal: applying it a
/// second time changes nothing.
pub fn merge_touching(mut ranges: Vec<TimeRange>) -> Vec<TimeRange> {
    if ranges.is_empty() {
        return ranges;
    }
    ranges.sort_by_key(|range| range.start);

    let mut merged = Vec::with_capacity(ranges.len());
    let mut current = ranges[0];
    for next in ranges.into_iter().skip(1) {
        let overlaps = current.start < next.end && current.end > next.start;
        if overlaps || current.end == next.start {
            current = TimeRange::new(current.start.min(next.start), current.end.max(next.end));
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);
    merged
}
