//! Partial-update structures.
//!
//! The store persists whole records. A patch captures only the fields a
//! caller wants to change and produces a fresh record from an existing
//! snapshot; writing the result back is a separate, explicit store call.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

use crate::entities::{Tenant, TimeBlock, TimeBlockKind, WorkingHours};

/// Partial update for a [`TimeBlock`].
///
/// The time fields are times of day: applying them grafts the new time onto
/// the block's own date, so one patch can be applied across every
/// occurrence of a recurring series.
#[derive(Debug, Clone, Default)]
pub struct TimeBlockPatch {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub kind: Option<TimeBlockKind>,
    pub reason: Option<String>,
}

impl TimeBlockPatch {
    /// Returns a copy of `block` with the patched fields replaced and
    /// `updated_at` set to `now`.
    pub fn apply(&self, block: &TimeBlock, now: DateTime<Utc>) -> TimeBlock {
        let mut next = block.clone();
        if let Some(time) = self.start_time {
            next.start = rebase_time(block.start, time);
        }
        if let Some(time) = self.end_time {
            next.end = rebase_time(block.end, time);
        }
        if let Some(kind) = self.kind {
            next.kind = kind;
        }
        if let Some(reason) = &self.reason {
            next.reason = Some(reason.clone());
        }
        next.updated_at = now;
        next
    }
}

/// Partial update for a [`WorkingHours`] row.
#[derive(Debug, Clone, Default)]
pub struct WorkingHoursPatch {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub max_concurrent_bookings: Option<u32>,
}

impl WorkingHoursPatch {
    pub fn apply(&self, row: &WorkingHours, now: DateTime<Utc>) -> WorkingHours {
        let mut next = row.clone();
        if let Some(time) = self.start_time {
            next.start_time = time;
        }
        if let Some(time) = self.end_time {
            next.end_time = time;
        }
        if let Some(max) = self.max_concurrent_bookings {
            next.max_concurrent_bookings = max;
        }
        next.updated_at = now;
        next
    }
}

/// Partial update for a tenant's booking buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferPatch {
    pub before_minutes: Option<u32>,
    pub after_minutes: Option<u32>,
}

impl BufferPatch {
    pub fn is_empty(&self) -> bool {
        self.before_minutes.is_none() && self.after_minutes.is_none()
    }

    pub fn apply(&self, tenant: &Tenant, now: DateTime<Utc>) -> Tenant {
        let mut next = tenant.clone();
        if let Some(minutes) = self.before_minutes {
            next.buffer_before_minutes = minutes;
        }
        if let Some(minutes) = self.after_minutes {
            next.buffer_after_minutes = minutes;
        }
        next.updated_at = now;
        next
    }
}

/// New instant on the same calendar date as `instant`, at `time`.
fn rebase_time(instant: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&instant.date_naive().and_time(time))
}
