//! The storage collaborator consumed by the engine.
//!
//! Modeled as a synchronous, object-safe trait: every engine computation is
//! a pure pass over data fetched immediately before use, so the layer that
//! fronts the store owns async dispatch, retries, and timeouts.

use chrono::{DateTime, Utc, Weekday};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{Booking, Tenant, TimeBlock, WorkingHours};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD surface over the scheduling records.
///
/// Implementations must make the bulk operations atomic: a reader never
/// observes a partially created batch or a half-regenerated recurrence
/// series.
pub trait ScheduleStore: Send + Sync {
    // ── Working hours ──────────────────────────────────────────────────

    /// All rows for a tenant, ordered by weekday (Sunday first).
    fn working_hours(&self, tenant_id: Uuid) -> StoreResult<Vec<WorkingHours>>;

    fn working_hours_for_day(
        &self,
        tenant_id: Uuid,
        day: Weekday,
    ) -> StoreResult<Option<WorkingHours>>;

    /// Inserts a row. Fails with [`StoreError::Conflict`] when the
    /// (tenant, day) pair already has one.
    fn put_working_hours(&self, row: WorkingHours) -> StoreResult<WorkingHours>;

    /// Replaces an existing row in place, matching on (tenant, day).
    fn update_working_hours(&self, row: WorkingHours) -> StoreResult<WorkingHours>;

    fn delete_working_hours(&self, tenant_id: Uuid, day: Weekday) -> StoreResult<()>;

    /// Atomically replaces every row of the tenant's week with `rows`.
    fn replace_week(
        &self,
        tenant_id: Uuid,
        rows: Vec<WorkingHours>,
    ) -> StoreResult<Vec<WorkingHours>>;

    // ── Time blocks ────────────────────────────────────────────────────

    fn time_block(&self, id: Uuid) -> StoreResult<Option<TimeBlock>>;

    /// Blocks strictly intersecting `[start, end]`
    /// (`block.start < end && block.end > start`), ordered by start.
    fn time_blocks_in_range(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<TimeBlock>>;

    /// Every block in one recurrence series, the base occurrence included,
    /// ordered by start.
    fn time_blocks_by_recurrence(
        &self,
        recurrence_id: Uuid,
        tenant_id: Uuid,
    ) -> StoreResult<Vec<TimeBlock>>;

    fn create_time_block(&self, block: TimeBlock) -> StoreResult<TimeBlock>;

    /// Inserts the whole batch or nothing.
    fn create_time_blocks(&self, blocks: Vec<TimeBlock>) -> StoreResult<()>;

    fn update_time_block(&self, block: TimeBlock) -> StoreResult<TimeBlock>;

    fn delete_time_block(&self, id: Uuid, tenant_id: Uuid) -> StoreResult<()>;

    /// Deletes the given blocks; ids that are not present are ignored.
    fn delete_time_blocks(&self, ids: &[Uuid]) -> StoreResult<()>;

    /// Deletes blocks fully contained in `[start, end]` and returns how
    /// many were removed.
    fn delete_time_blocks_in_range(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<usize>;

    /// Atomically swaps one recurrence series: deletes every block sharing
    /// `recurrence_id`, then inserts `blocks`. A crash-free reader sees the
    /// old series or the new one, never a mixture.
    fn replace_recurrence(
        &self,
        recurrence_id: Uuid,
        tenant_id: Uuid,
        blocks: Vec<TimeBlock>,
    ) -> StoreResult<()>;

    // ── Mirrored records ───────────────────────────────────────────────

    /// Pending and Confirmed bookings intersecting `[start, end]`
    /// inclusively (`booking.start <= end && booking.end >= start`),
    /// ordered by start. Other statuses never leave the store.
    fn bookings_in_range(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Booking>>;

    /// Mirror-maintenance hook; not called by the engine.
    fn upsert_booking(&self, booking: Booking) -> StoreResult<()>;

    /// Mirror-maintenance hook; idempotent.
    fn delete_booking(&self, id: Uuid) -> StoreResult<()>;

    fn tenant(&self, tenant_id: Uuid) -> StoreResult<Option<Tenant>>;

    /// Mirror-maintenance hook; not called by the engine.
    fn upsert_tenant(&self, tenant: Tenant) -> StoreResult<()>;
}
