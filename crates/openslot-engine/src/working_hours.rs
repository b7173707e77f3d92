//! Working-hours lifecycle: per-day rows and whole-week replacement.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use tracing::info;
use uuid::Uuid;

use openslot_store::{ScheduleStore, WorkingHours, WorkingHoursPatch};

use crate::error::{EngineError, FieldError, Result};

/// Input for one day's working hours.
#[derive(Debug, Clone)]
pub struct NewWorkingHours {
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_concurrent_bookings: Option<u32>,
}

/// One entry of a weekly schedule; applies to several days at once.
/// Work-free days carry no times and end up with no row at all.
#[derive(Debug, Clone)]
pub struct WeekEntry {
    pub days: Vec<Weekday>,
    pub work_free: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub max_concurrent_bookings: Option<u32>,
}

pub struct WorkingHoursService<'a> {
    store: &'a dyn ScheduleStore,
}

impl<'a> WorkingHoursService<'a> {
    pub fn new(store: &'a dyn ScheduleStore) -> Self {
        Self { store }
    }

    pub fn list(&self, tenant_id: Uuid) -> Result<Vec<WorkingHours>> {
        Ok(self.store.working_hours(tenant_id)?)
    }

    pub fn for_day(&self, tenant_id: Uuid, day: Weekday) -> Result<Option<WorkingHours>> {
        Ok(self.store.working_hours_for_day(tenant_id, day)?)
    }

    /// Creates the row for one day. The (tenant, day) pair must not have
    /// one yet.
    pub fn create(
        &self,
        tenant_id: Uuid,
        new: NewWorkingHours,
        now: DateTime<Utc>,
    ) -> Result<WorkingHours> {
        if new.start_time >= new.end_time {
            return Err(EngineError::invalid(
                "startTime",
                "start time must be before end time",
            ));
        }
        if self.store.working_hours_for_day(tenant_id, new.day)?.is_some() {
            return Err(EngineError::invalid(
                "day",
                format!("working hours already exist for {}", new.day),
            ));
        }

        let row = self.store.put_working_hours(WorkingHours {
            id: Uuid::new_v4(),
            tenant_id,
            day: new.day,
            start_time: new.start_time,
            end_time: new.end_time,
            max_concurrent_bookings: new.max_concurrent_bookings.unwrap_or(1),
            created_at: now,
            updated_at: now,
        })?;
        info!(%tenant_id, day = %row.day, "created working hours");
        Ok(row)
    }

    /// Replaces the whole row for a day.
    pub fn update(
        &self,
        tenant_id: Uuid,
        new: NewWorkingHours,
        now: DateTime<Utc>,
    ) -> Result<WorkingHours> {
        if new.start_time >= new.end_time {
            return Err(EngineError::invalid(
                "startTime",
                "start time must be before end time",
            ));
        }
        let existing = self.require(tenant_id, new.day)?;

        Ok(self.store.update_working_hours(WorkingHours {
            id: existing.id,
            tenant_id,
            day: new.day,
            start_time: new.start_time,
            end_time: new.end_time,
            max_concurrent_bookings: new
                .max_concurrent_bookings
                .unwrap_or(existing.max_concurrent_bookings),
            created_at: existing.created_at,
            updated_at: now,
        })?)
    }

    /// Merges a patch into an existing row. The merged result must still
    /// be correctly ordered.
    pub fn patch(
        &self,
        tenant_id: Uuid,
        day: Weekday,
        patch: &WorkingHoursPatch,
        now: DateTime<Utc>,
    ) -> Result<WorkingHours> {
        let existing = self.require(tenant_id, day)?;
        let updated = patch.apply(&existing, now);
        if updated.start_time >= updated.end_time {
            return Err(EngineError::invalid(
                "startTime",
                "start time must be before end time",
            ));
        }
        Ok(self.store.update_working_hours(updated)?)
    }

    /// Replaces the tenant's whole week in one atomic swap. Work-free days
    /// simply get no row. Validation errors are collected across every
    /// entry before anything is written.
    pub fn set_week(
        &self,
        tenant_id: Uuid,
        entries: &[WeekEntry],
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkingHours>> {
        let mut errors = Vec::new();
        for entry in entries {
            if !entry.work_free && (entry.start_time.is_none() || entry.end_time.is_none()) {
                errors.push(FieldError::new(
                    "schedule",
                    format!(
                        "start and end times are required for working days ({})",
                        describe_days(&entry.days)
                    ),
                ));
            }
            if let (Some(start), Some(end)) = (entry.start_time, entry.end_time) {
                if start >= end {
                    errors.push(FieldError::new(
                        "schedule",
                        format!(
                            "start time must be before end time ({})",
                            describe_days(&entry.days)
                        ),
                    ));
                }
            }
        }
        if !errors.is_empty() {
            return Err(EngineError::invalid_many("invalid weekly schedule", errors));
        }

        let mut rows = Vec::new();
        for entry in entries.iter().filter(|entry| !entry.work_free) {
            let (Some(start_time), Some(end_time)) = (entry.start_time, entry.end_time) else {
                continue;
            };
            for &day in &entry.days {
                rows.push(WorkingHours {
                    id: Uuid::new_v4(),
                    tenant_id,
                    day,
                    start_time,
                    end_time,
                    max_concurrent_bookings: entry.max_concurrent_bookings.unwrap_or(1),
                    created_at: now,
                    updated_at: now,
                });
            }
        }

        let created = self.store.replace_week(tenant_id, rows)?;
        info!(%tenant_id, created = created.len(), "replaced weekly schedule");
        Ok(created)
    }

    pub fn delete(&self, tenant_id: Uuid, day: Weekday) -> Result<()> {
        self.require(tenant_id, day)?;
        Ok(self.store.delete_working_hours(tenant_id, day)?)
    }

    fn require(&self, tenant_id: Uuid, day: Weekday) -> Result<WorkingHours> {
        self.store
            .working_hours_for_day(tenant_id, day)?
            .ok_or_else(|| EngineError::not_found("working hours", format!("{tenant_id}/{day}")))
    }
}

fn describe_days(days: &[Weekday]) -> String {
    days.iter()
        .map(|day| day.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
