//! Recurrence expansion — turns a pattern plus a base occurrence into the
//! concrete occurrences that follow it.
//!
//! Weeks run Sunday through Saturday. In the base occurrence's own week
//! only selected days strictly after the base weekday are generated; days
//! at or before it belong to the base occurrence. Monthly day selectors
//! may be negative, counted back from the month's end (-1 is the last
//! day). Expansion is bounded by the pattern's end date or, for
//! count-terminated patterns, a two-year horizon.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use openslot_store::{ScheduleStore, TimeBlock, TimeBlockKind};

use crate::error::{EngineError, FieldError, Result};
use crate::interval::TimeRange;

/// Generation horizon for patterns that terminate by occurrence count.
const DEFAULT_HORIZON_DAYS: i64 = 365 * 2;

/// Cadence names accepted in an unvalidated pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// A recurrence definition as supplied by a caller, not yet checked
/// against its base occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    /// Every N days, weeks, or months.
    pub interval: u32,
    /// Weekly only. 0 = Sunday through 6 = Saturday.
    pub days_of_week: Option<Vec<u8>>,
    /// Monthly only. 1..=31, or -1/-2/-3 counted back from the month's
    /// last day.
    pub days_of_month: Option<Vec<i32>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_occurrences: Option<u32>,
}

impl RecurrencePattern {
    pub fn daily(interval: u32) -> Self {
        Self {
            frequency: Frequency::Daily,
            interval,
            days_of_week: None,
            days_of_month: None,
            end_date: None,
            max_occurrences: None,
        }
    }

    pub fn weekly(interval: u32, days_of_week: Vec<u8>) -> Self {
        Self {
            frequency: Frequency::Weekly,
            days_of_week: Some(days_of_week),
            ..Self::daily(interval)
        }
    }

    pub fn monthly(interval: u32, days_of_month: Vec<i32>) -> Self {
        Self {
            frequency: Frequency::Monthly,
            days_of_month: Some(days_of_month),
            ..Self::daily(interval)
        }
    }

    /// Terminate at a fixed end date.
    pub fn until(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Terminate after a total occurrence count, the base included.
    pub fn count(mut self, max_occurrences: u32) -> Self {
        self.max_occurrences = Some(max_occurrences);
        self
    }

    /// Checks the pattern against the base occurrence it will expand from.
    ///
    /// Collects every violation before failing so a caller sees the full
    /// field-level list at once. `now` anchors the past-date check; no
    /// system clock is read.
    pub fn validate(&self, base_start: DateTime<Utc>, now: DateTime<Utc>) -> Result<Recurrence> {
        let mut errors = Vec::new();

        if self.interval < 1 {
            errors.push(FieldError::new(
                "interval",
                "interval must be a positive number",
            ));
        }

        match (self.end_date, self.max_occurrences) {
            (Some(_), Some(_)) => errors.push(FieldError::new(
                "endDate",
                "cannot specify both endDate and maxOccurrences; provide exactly one",
            )),
            (None, None) => errors.push(FieldError::new(
                "endDate",
                "either endDate or maxOccurrences is required to terminate the recurrence",
            )),
            _ => {}
        }

        if let Some(end_date) = self.end_date {
            if end_date.date_naive() < now.date_naive() {
                errors.push(FieldError::new("endDate", "endDate cannot be in the past"));
            }
        }

        if self.max_occurrences == Some(0) {
            errors.push(FieldError::new(
                "maxOccurrences",
                "maxOccurrences must be greater than 0",
            ));
        }

        let cadence = match self.frequency {
            Frequency::Daily => self.validate_daily(&mut errors),
            Frequency::Weekly => self.validate_weekly(base_start, &mut errors),
            Frequency::Monthly => self.validate_monthly(base_start, &mut errors),
        };

        if !errors.is_empty() {
            return Err(EngineError::invalid_many("invalid recurrence pattern", errors));
        }

        let end = match (self.end_date, self.max_occurrences) {
            (Some(end_date), None) => RecurrenceEnd::Until(end_date),
            (None, Some(count)) => RecurrenceEnd::Count(count),
            _ => unreachable!("termination checked above"),
        };

        Ok(Recurrence {
            cadence,
            interval: self.interval,
            end,
        })
    }

    fn validate_daily(&self, errors: &mut Vec<FieldError>) -> Cadence {
        if self.has_days_of_week() {
            errors.push(FieldError::new(
                "daysOfWeek",
                "daily recurrence cannot include daysOfWeek; use a weekly cadence",
            ));
        }
        if self.has_days_of_month() {
            errors.push(FieldError::new(
                "daysOfMonth",
                "daily recurrence cannot include daysOfMonth; use a monthly cadence",
            ));
        }
        Cadence::Daily
    }

    fn validate_weekly(&self, base_start: DateTime<Utc>, errors: &mut Vec<FieldError>) -> Cadence {
        if self.has_days_of_month() {
            errors.push(FieldError::new(
                "daysOfMonth",
                "weekly recurrence cannot include daysOfMonth",
            ));
        }

        let base_day = base_start.weekday();
        let days = match &self.days_of_week {
            Some(days) => {
                if days.iter().any(|&day| day > 6) {
                    errors.push(FieldError::new(
                        "daysOfWeek",
                        "daysOfWeek values must be between 0 (Sunday) and 6 (Saturday)",
                    ));
                }
                if has_duplicate_days(days) {
                    errors.push(FieldError::new(
                        "daysOfWeek",
                        "daysOfWeek cannot contain duplicate values",
                    ));
                }
                if !days.contains(&(base_day.num_days_from_sunday() as u8)) {
                    errors.push(FieldError::new(
                        "daysOfWeek",
                        format!(
                            "the base occurrence falls on {base_day}, which daysOfWeek does not include"
                        ),
                    ));
                }
                days.iter()
                    .filter_map(|&day| weekday_from_sunday(day))
                    .collect()
            }
            None => vec![base_day],
        };

        Cadence::Weekly { days }
    }

    fn validate_monthly(&self, base_start: DateTime<Utc>, errors: &mut Vec<FieldError>) -> Cadence {
        if self.has_days_of_week() {
            errors.push(FieldError::new(
                "daysOfWeek",
                "monthly recurrence cannot include daysOfWeek",
            ));
        }

        let days = match self.days_of_month.as_deref() {
            Some(days) if !days.is_empty() => {
                for &day in days {
                    if day == 0 || day < -31 || day > 31 {
                        errors.push(FieldError::new(
                            "daysOfMonth",
                            "daysOfMonth values must be between -31 and -1, or 1 and 31",
                        ));
                    } else if (-31..=-4).contains(&day) {
                        errors.push(FieldError::new(
                            "daysOfMonth",
                            format!(
                                "daysOfMonth value {day} is invalid; use -1 for the last day, \
                                 -2 for the second to last, or -3 for the third to last"
                            ),
                        ));
                    }
                }

                let base_dom = base_start.day() as i32;
                let last = last_day_of_month(base_start.year(), base_start.month());
                let covered = days.contains(&base_dom)
                    || (days.contains(&-1) && base_dom == last)
                    || (days.contains(&-2) && base_dom == last - 1)
                    || (days.contains(&-3) && base_dom == last - 2);
                if !covered {
                    errors.push(FieldError::new(
                        "daysOfMonth",
                        format!(
                            "the base occurrence falls on day {base_dom}, which daysOfMonth does not cover"
                        ),
                    ));
                }

                days.to_vec()
            }
            _ => vec![base_start.day() as i32],
        };

        Cadence::Monthly { days }
    }

    fn has_days_of_week(&self) -> bool {
        self.days_of_week.as_deref().is_some_and(|days| !days.is_empty())
    }

    fn has_days_of_month(&self) -> bool {
        self.days_of_month.as_deref().is_some_and(|days| !days.is_empty())
    }
}

/// How a validated recurrence terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceEnd {
    Until(DateTime<Utc>),
    /// Total occurrence count, the base included.
    Count(u32),
}

/// Day selection per cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cadence {
    Daily,
    Weekly { days: Vec<Weekday> },
    Monthly { days: Vec<i32> },
}

/// A recurrence definition that passed validation against its base
/// occurrence. `interval` is at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    pub cadence: Cadence,
    pub interval: u32,
    pub end: RecurrenceEnd,
}

/// Expands a validated recurrence into the occurrences that follow the
/// base one, in ascending order.
///
/// The base occurrence itself is never produced — the caller already owns
/// it — and every produced range has the base occurrence's duration.
pub fn expand(
    recurrence: &Recurrence,
    base_start: DateTime<Utc>,
    base_end: DateTime<Utc>,
) -> Vec<TimeRange> {
    let bound = match recurrence.end {
        RecurrenceEnd::Until(end_date) => end_date,
        RecurrenceEnd::Count(_) => base_start + Duration::days(DEFAULT_HORIZON_DAYS),
    };
    // The base counts as occurrence 1 against the total.
    let budget = match recurrence.end {
        RecurrenceEnd::Count(count) => Some(count.saturating_sub(1)),
        RecurrenceEnd::Until(_) => None,
    };

    let starts = match &recurrence.cadence {
        Cadence::Daily => daily_starts(recurrence.interval, base_start, bound, budget),
        Cadence::Weekly { days } => {
            weekly_starts(days, recurrence.interval, base_start, bound, budget)
        }
        Cadence::Monthly { days } => {
            monthly_starts(days, recurrence.interval, base_start, bound, budget)
        }
    };

    let duration = base_end - base_start;
    starts
        .into_iter()
        .map(|start| TimeRange::new(start, start + duration))
        .collect()
}

fn exhausted(budget: Option<u32>, emitted: usize) -> bool {
    budget.is_some_and(|limit| emitted as u32 >= limit)
}

fn daily_starts(
    interval: u32,
    base_start: DateTime<Utc>,
    bound: DateTime<Utc>,
    budget: Option<u32>,
) -> Vec<DateTime<Utc>> {
    let step = Duration::days(i64::from(interval));
    let mut starts = Vec::new();
    let mut cursor = base_start + step;
    while cursor <= bound && !exhausted(budget, starts.len()) {
        starts.push(cursor);
        cursor += step;
    }
    starts
}

fn weekly_starts(
    days: &[Weekday],
    interval: u32,
    base_start: DateTime<Utc>,
    bound: DateTime<Utc>,
    budget: Option<u32>,
) -> Vec<DateTime<Utc>> {
    let mut starts = Vec::new();
    let base_day = base_start.weekday().num_days_from_sunday();

    // Base week: only selected days strictly after the base weekday. The
    // base occurrence covers its own day, and earlier days of that week
    // are behind the base occurrence.
    for day in days {
        if exhausted(budget, starts.len()) {
            break;
        }
        let offset = day.num_days_from_sunday();
        if offset > base_day {
            let candidate = base_start + Duration::days(i64::from(offset - base_day));
            if candidate <= bound {
                starts.push(candidate);
            }
        }
    }

    // Subsequent weeks, anchored on the Sunday that begins each one.
    let mut week_anchor = base_start + Duration::days(i64::from(7 - base_day));
    while week_anchor <= bound && !exhausted(budget, starts.len()) {
        for day in days {
            let candidate = week_anchor + Duration::days(i64::from(day.num_days_from_sunday()));
            if candidate <= bound {
                starts.push(candidate);
                if exhausted(budget, starts.len()) {
                    break;
                }
            }
        }
        week_anchor += Duration::days(7 * i64::from(interval));
    }

    starts.sort_unstable();
    starts
}

fn monthly_starts(
    days: &[i32],
    interval: u32,
    base_start: DateTime<Utc>,
    bound: DateTime<Utc>,
    budget: Option<u32>,
) -> Vec<DateTime<Utc>> {
    let mut starts = Vec::new();
    let mut cursor = Some(base_start);

    while let Some(anchor) = cursor {
        if anchor > bound || exhausted(budget, starts.len()) {
            break;
        }
        for &day in days {
            let Some(candidate) = day_in_month(anchor, day) else {
                continue;
            };
            // The base occurrence itself is skipped, not re-emitted.
            if candidate >= base_start && candidate <= bound && candidate != base_start {
                starts.push(candidate);
                if exhausted(budget, starts.len()) {
                    break;
                }
            }
        }
        cursor = anchor.checked_add_months(Months::new(interval));
    }

    starts.sort_unstable();
    starts
}

/// Concrete instant for one day-of-month selector within `anchor`'s month,
/// at `anchor`'s time of day. Positive selectors clamp to the month's
/// length; negative selectors count back from its last day.
fn day_in_month(anchor: DateTime<Utc>, day: i32) -> Option<DateTime<Utc>> {
    let last = last_day_of_month(anchor.year(), anchor.month());
    let day_of_month = if day > 0 { day.min(last) } else { last + day + 1 };
    if day_of_month < 1 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), day_of_month as u32)?;
    Some(Utc.from_utc_datetime(&date.and_time(anchor.time())))
}

fn last_day_of_month(year: i32, month: u32) -> i32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next_month| next_month.pred_opt())
        .map(|last| last.day() as i32)
        .unwrap_or(31)
}

fn weekday_from_sunday(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

fn has_duplicate_days(days: &[u8]) -> bool {
    let mut seen = [false; 7];
    for &day in days {
        if let Some(slot) = seen.get_mut(day as usize) {
            if *slot {
                return true;
            }
            *slot = true;
        }
    }
    false
}

/// Materializes an expansion as time-block records sharing `master_id` as
/// their recurrence group. The base block is not among them.
#[allow(clippy::too_many_arguments)]
pub fn expand_time_blocks(
    recurrence: &Recurrence,
    base_start: DateTime<Utc>,
    base_end: DateTime<Utc>,
    master_id: Uuid,
    tenant_id: Uuid,
    kind: TimeBlockKind,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<TimeBlock> {
    expand(recurrence, base_start, base_end)
        .into_iter()
        .map(|range| TimeBlock {
            id: Uuid::new_v4(),
            tenant_id,
            start: range.start,
            end: range.end,
            kind,
            reason: reason.map(str::to_owned),
            recurrence_id: Some(master_id),
            created_at: now,
            updated_at: now,
        })
        .collect()
}

/// Persists and maintains recurrence series through the store.
pub struct RecurrenceService<'a> {
    store: &'a dyn ScheduleStore,
}

impl<'a> RecurrenceService<'a> {
    pub fn new(store: &'a dyn ScheduleStore) -> Self {
        Self { store }
    }

    /// Expands a new series and persists it in one bulk write. Returns the
    /// generated occurrences.
    #[allow(clippy::too_many_arguments)]
    pub fn generate(
        &self,
        recurrence: &Recurrence,
        base_start: DateTime<Utc>,
        base_end: DateTime<Utc>,
        master_id: Uuid,
        tenant_id: Uuid,
        kind: TimeBlockKind,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TimeBlock>> {
        debug!(%tenant_id, %master_id, "expanding recurrence");
        let blocks = expand_time_blocks(
            recurrence, base_start, base_end, master_id, tenant_id, kind, reason, now,
        );
        if !blocks.is_empty() {
            self.store.create_time_blocks(blocks.clone())?;
            info!(count = blocks.len(), %master_id, "generated recurring time blocks");
        }
        Ok(blocks)
    }

    /// Re-expands an edited pattern, swapping the whole series in one
    /// atomic unit so a crash can never leave it half regenerated.
    #[allow(clippy::too_many_arguments)]
    pub fn regenerate(
        &self,
        recurrence: &Recurrence,
        base_start: DateTime<Utc>,
        base_end: DateTime<Utc>,
        master_id: Uuid,
        tenant_id: Uuid,
        kind: TimeBlockKind,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TimeBlock>> {
        let blocks = expand_time_blocks(
            recurrence, base_start, base_end, master_id, tenant_id, kind, reason, now,
        );
        self.store
            .replace_recurrence(master_id, tenant_id, blocks.clone())?;
        info!(count = blocks.len(), %master_id, "regenerated recurring time blocks");
        Ok(blocks)
    }

    /// Deletes every block in the series. Returns how many were removed.
    pub fn remove(&self, master_id: Uuid, tenant_id: Uuid) -> Result<usize> {
        let existing = self.store.time_blocks_by_recurrence(master_id, tenant_id)?;
        if existing.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = existing.iter().map(|block| block.id).collect();
        self.store.delete_time_blocks(&ids)?;
        info!(count = ids.len(), %master_id, "deleted recurring time blocks");
        Ok(ids.len())
    }
}
