//! Availability calculation — the open ranges a tenant can still accept
//! bookings in.
//!
//! Each calendar day of the requested window is resolved independently:
//! the day's working-hours window, minus that day's time blocks, minus
//! that day's bookings padded by the tenant's buffers.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use uuid::Uuid;

use openslot_store::ScheduleStore;

use crate::error::{EngineError, Result};
use crate::interval::{merge_touching, subtract_all, TimeRange};

/// Inclusive end of a full-day window.
const DAY_END: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(time) => time,
    None => unreachable!(),
};

/// Open ranges for `tenant_id` between `start` and `end`, ordered by
/// start.
///
/// A weekday without a working-hours row — or with a degenerate row whose
/// start equals its end — counts as open the full day, 00:00:00 through
/// 23:59:59. Only Pending and Confirmed bookings occupy time, and each is
/// widened by the tenant's buffer minutes before subtraction. Days left
/// with nothing contribute nothing to the result.
pub fn available_ranges(
    store: &dyn ScheduleStore,
    tenant_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<TimeRange>> {
    let tenant = store
        .tenant(tenant_id)?
        .ok_or_else(|| EngineError::not_found("tenant", tenant_id))?;

    let working_hours = store.working_hours(tenant_id)?;
    let blocks = store.time_blocks_in_range(tenant_id, start, end)?;
    let bookings = store.bookings_in_range(tenant_id, start, end)?;

    let pad_before = Duration::minutes(i64::from(tenant.buffer_before_minutes));
    let pad_after = Duration::minutes(i64::from(tenant.buffer_after_minutes));

    let mut open = Vec::new();
    let mut date = start.date_naive();
    let last = end.date_naive();
    while date <= last {
        let row = working_hours.iter().find(|wh| wh.day == date.weekday());
        let window = match row {
            Some(wh) if wh.start_time != wh.end_time => TimeRange::new(
                at(date, clip_seconds(wh.start_time)),
                at(date, clip_seconds(wh.end_time)),
            ),
            // No row, or a degenerate one: open around the clock.
            _ => TimeRange::new(at(date, NaiveTime::MIN), at(date, DAY_END)),
        };

        let mut free = vec![window];
        for block in blocks.iter().filter(|b| b.start.date_naive() == date) {
            free = subtract_all(&free, TimeRange::new(block.start, block.end));
        }
        for booking in bookings
            .iter()
            .filter(|b| b.status.occupies_calendar() && b.start.date_naive() == date)
        {
            free = subtract_all(
                &free,
                TimeRange::new(booking.start - pad_before, booking.end + pad_after),
            );
        }

        open.extend(merge_touching(free));

        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    open.sort_by_key(|range| range.start);
    Ok(open)
}

/// `time` on `date`, as a UTC instant.
pub(crate) fn at(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(time))
}

/// Working-hours rows carry minute precision; anything finer is dropped
/// when the row is materialized onto a date.
pub(crate) fn clip_seconds(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}
