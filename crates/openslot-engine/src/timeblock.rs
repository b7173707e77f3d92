//! Time-block lifecycle: create (optionally recurring), patch, delete.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use openslot_store::{ScheduleStore, TimeBlock, TimeBlockKind, TimeBlockPatch};

use crate::error::{EngineError, Result};
use crate::recurrence::{RecurrencePattern, RecurrenceService};

/// Input for a new time block.
#[derive(Debug, Clone)]
pub struct NewTimeBlock {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: TimeBlockKind,
    pub reason: Option<String>,
    pub recurrence: Option<RecurrencePattern>,
}

/// A created block plus how many records the creation produced in total:
/// 1 for a one-off block, 1 + generated occurrences for a recurring one.
#[derive(Debug, Clone)]
pub struct CreatedTimeBlock {
    pub block: TimeBlock,
    pub total_created: usize,
}

pub struct TimeBlockService<'a> {
    store: &'a dyn ScheduleStore,
}

impl<'a> TimeBlockService<'a> {
    pub fn new(store: &'a dyn ScheduleStore) -> Self {
        Self { store }
    }

    /// Creates a block, expanding and persisting its recurrence when one
    /// is supplied. `now` anchors the past-date checks.
    pub fn create(
        &self,
        tenant_id: Uuid,
        new: NewTimeBlock,
        now: DateTime<Utc>,
    ) -> Result<CreatedTimeBlock> {
        if new.start >= new.end {
            return Err(EngineError::invalid(
                "startDateTime",
                "start time must be before end time",
            ));
        }
        let today = now.date_naive();
        if new.start.date_naive() < today {
            return Err(EngineError::invalid(
                "startDateTime",
                "start date cannot be in the past",
            ));
        }
        if new.end.date_naive() < today {
            return Err(EngineError::invalid(
                "endDateTime",
                "end date cannot be in the past",
            ));
        }

        let recurrence = new
            .recurrence
            .as_ref()
            .map(|pattern| pattern.validate(new.start, now))
            .transpose()?;
        let recurrence_id = recurrence.as_ref().map(|_| Uuid::new_v4());

        let block = TimeBlock {
            id: Uuid::new_v4(),
            tenant_id,
            start: new.start,
            end: new.end,
            kind: new.kind,
            reason: new.reason.clone(),
            recurrence_id,
            created_at: now,
            updated_at: now,
        };
        self.store.create_time_block(block.clone())?;

        let mut total_created = 1;
        if let (Some(recurrence), Some(master_id)) = (recurrence, recurrence_id) {
            let occurrences = RecurrenceService::new(self.store).generate(
                &recurrence,
                new.start,
                new.end,
                master_id,
                tenant_id,
                new.kind,
                new.reason.as_deref(),
                now,
            )?;
            total_created += occurrences.len();
        }

        info!(%tenant_id, block = %block.id, total_created, "created time block");
        Ok(CreatedTimeBlock {
            block,
            total_created,
        })
    }

    /// Applies a patch to one block, or to every block of its recurrence
    /// series when `edit_pattern` is set. The patch's times of day are
    /// grafted onto each block's own date.
    ///
    /// Lookups are tenant-scoped: a block belonging to another tenant is
    /// reported as missing.
    pub fn patch(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        patch: &TimeBlockPatch,
        edit_pattern: bool,
        now: DateTime<Utc>,
    ) -> Result<TimeBlock> {
        let existing = self.fetch(id, tenant_id)?;

        match (patch.start_time, patch.end_time) {
            (Some(start), Some(end)) if start >= end => {
                return Err(EngineError::invalid(
                    "startTime",
                    "start time must be before end time",
                ));
            }
            (None, Some(end)) if end <= existing.start.time() => {
                return Err(EngineError::invalid(
                    "endTime",
                    "end time must be after the current start time",
                ));
            }
            (Some(start), None) if start >= existing.end.time() => {
                return Err(EngineError::invalid(
                    "startTime",
                    "start time must be before the current end time",
                ));
            }
            _ => {}
        }

        if edit_pattern {
            if let Some(recurrence_id) = existing.recurrence_id {
                for block in self.store.time_blocks_by_recurrence(recurrence_id, tenant_id)? {
                    self.store.update_time_block(patch.apply(&block, now))?;
                }
                info!(%tenant_id, %recurrence_id, "patched recurring time blocks");
                return self.fetch(id, tenant_id);
            }
        }

        let updated = patch.apply(&existing, now);
        self.store.update_time_block(updated.clone())?;
        Ok(updated)
    }

    /// Deletes one block, or the whole series when `delete_pattern` is set
    /// on a recurring block. Returns how many blocks were removed.
    pub fn delete(&self, id: Uuid, tenant_id: Uuid, delete_pattern: bool) -> Result<usize> {
        let existing = self.fetch(id, tenant_id)?;

        if delete_pattern {
            if let Some(recurrence_id) = existing.recurrence_id {
                return RecurrenceService::new(self.store).remove(recurrence_id, tenant_id);
            }
        }

        self.store.delete_time_block(id, tenant_id)?;
        info!(%tenant_id, block = %id, "deleted time block");
        Ok(1)
    }

    /// Bulk-deletes every block fully inside `[start, end]`. Returns the
    /// removal count.
    pub fn delete_range(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<usize> {
        if start >= end {
            return Err(EngineError::invalid(
                "startDate",
                "start date must be before end date",
            ));
        }
        let deleted = self.store.delete_time_blocks_in_range(tenant_id, start, end)?;
        info!(%tenant_id, deleted, "deleted time blocks in range");
        Ok(deleted)
    }

    fn fetch(&self, id: Uuid, tenant_id: Uuid) -> Result<TimeBlock> {
        self.store
            .time_block(id)?
            .filter(|block| block.tenant_id == tenant_id)
            .ok_or_else(|| EngineError::not_found("time block", id))
    }
}
