//! Conflict detection — every busy source overlapping one candidate slot.
//!
//! Where the availability calculator folds busy periods into a merged free
//! view, this path reports each overlapping source separately so a caller
//! can explain exactly why a slot was refused. It is the read path used
//! right before a reservation is committed.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use openslot_store::{BookingStatus, ScheduleStore};

use crate::availability::{at, clip_seconds};
use crate::error::{EngineError, Result};
use crate::interval::{overlap, TimeRange};

/// The busy source behind a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    TimeBlock,
    WorkingHours,
    Booking,
    BufferTime,
}

/// One overlapping busy source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub overlap: TimeRange,
}

impl Conflict {
    pub fn overlap_minutes(&self) -> i64 {
        self.overlap.duration().num_minutes()
    }
}

/// Outcome of a slot admission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotCheck {
    pub is_available: bool,
    pub conflicts: Vec<Conflict>,
}

/// Every busy source overlapping the candidate slot.
///
/// The candidate is padded by the buffer minutes before comparison against
/// time blocks and bookings; the working-hours comparison uses the raw
/// slot. With no working-hours row for the slot's weekday the provider is
/// reachable around the clock and no working-hours conflict is possible; a
/// degenerate row (start equals end) means the same.
pub fn detect_conflicts(
    store: &dyn ScheduleStore,
    tenant_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    buffer_before_minutes: u32,
    buffer_after_minutes: u32,
) -> Result<Vec<Conflict>> {
    let pad_before = Duration::minutes(i64::from(buffer_before_minutes));
    let pad_after = Duration::minutes(i64::from(buffer_after_minutes));
    let padded = TimeRange::new(start - pad_before, end + pad_after);

    let mut conflicts = Vec::new();

    if let Some(row) = store.working_hours_for_day(tenant_id, start.weekday())? {
        if row.start_time != row.end_time {
            let date = start.date_naive();
            let opens = at(date, clip_seconds(row.start_time));
            let closes = at(date, clip_seconds(row.end_time));
            if start < opens {
                conflicts.push(Conflict {
                    kind: ConflictKind::WorkingHours,
                    overlap: TimeRange::new(start, opens),
                });
            }
            if end > closes {
                conflicts.push(Conflict {
                    kind: ConflictKind::WorkingHours,
                    overlap: TimeRange::new(closes, end),
                });
            }
        }
    }

    for block in store.time_blocks_in_range(tenant_id, padded.start, padded.end)? {
        if let Some(span) = overlap(padded, TimeRange::new(block.start, block.end)) {
            conflicts.push(Conflict {
                kind: ConflictKind::TimeBlock,
                overlap: span,
            });
        }
    }

    // The fetch window is widened by the opposite-side paddings: a booking
    // whose own buffered extent reaches the candidate must be fetched even
    // when its raw times do not intersect the padded candidate.
    for booking in
        store.bookings_in_range(tenant_id, padded.start - pad_after, padded.end + pad_before)?
    {
        if booking.status == BookingStatus::Cancelled {
            continue;
        }
        let reserved = TimeRange::new(booking.start - pad_before, booking.end + pad_after);
        if let Some(span) = overlap(padded, reserved) {
            conflicts.push(Conflict {
                kind: ConflictKind::BufferTime,
                overlap: span,
            });
        }
    }

    Ok(conflicts)
}

/// Admission check for one candidate slot, using the tenant's configured
/// buffers. The slot is available iff nothing overlaps it.
pub fn is_slot_available(
    store: &dyn ScheduleStore,
    tenant_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<SlotCheck> {
    let tenant = store
        .tenant(tenant_id)?
        .ok_or_else(|| EngineError::not_found("tenant", tenant_id))?;

    let conflicts = detect_conflicts(
        store,
        tenant_id,
        start,
        end,
        tenant.buffer_before_minutes,
        tenant.buffer_after_minutes,
    )?;

    Ok(SlotCheck {
        is_available: conflicts.is_empty(),
        conflicts,
    })
}
