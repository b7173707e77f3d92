//! Lock-based in-memory [`ScheduleStore`] backend.
//!
//! Every multi-record mutation happens under one write-lock acquisition,
//! which gives the bulk operations their required atomicity for free.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::anyhow;
use chrono::{DateTime, Utc, Weekday};
use uuid::Uuid;

use crate::entities::{Booking, Tenant, TimeBlock, WorkingHours};
use crate::store::{ScheduleStore, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    working_hours: HashMap<(Uuid, Weekday), WorkingHours>,
    time_blocks: HashMap<Uuid, TimeBlock>,
    bookings: HashMap<Uuid, Booking>,
    tenants: HashMap<Uuid, Tenant>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unexpected(anyhow!("store lock poisoned")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unexpected(anyhow!("store lock poisoned")))
    }
}

impl ScheduleStore for MemoryStore {
    fn working_hours(&self, tenant_id: Uuid) -> StoreResult<Vec<WorkingHours>> {
        let tables = self.read()?;
        let mut rows: Vec<WorkingHours> = tables
            .working_hours
            .values()
            .filter(|row| row.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.day.num_days_from_sunday());
        Ok(rows)
    }

    fn working_hours_for_day(
        &self,
        tenant_id: Uuid,
        day: Weekday,
    ) -> StoreResult<Option<WorkingHours>> {
        let tables = self.read()?;
        Ok(tables.working_hours.get(&(tenant_id, day)).cloned())
    }

    fn put_working_hours(&self, row: WorkingHours) -> StoreResult<WorkingHours> {
        let mut tables = self.write()?;
        let key = (row.tenant_id, row.day);
        if tables.working_hours.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "working hours already exist for tenant {} on {:?}",
                row.tenant_id, row.day
            )));
        }
        tables.working_hours.insert(key, row.clone());
        Ok(row)
    }

    fn update_working_hours(&self, row: WorkingHours) -> StoreResult<WorkingHours> {
        let mut tables = self.write()?;
        let key = (row.tenant_id, row.day);
        if !tables.working_hours.contains_key(&key) {
            return Err(StoreError::NotFound(format!(
                "working hours for tenant {} on {:?}",
                row.tenant_id, row.day
            )));
        }
        tables.working_hours.insert(key, row.clone());
        Ok(row)
    }

    fn delete_working_hours(&self, tenant_id: Uuid, day: Weekday) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables
            .working_hours
            .remove(&(tenant_id, day))
            .map(|_| ())
            .ok_or_else(|| {
                StoreError::NotFound(format!("working hours for tenant {tenant_id} on {day:?}"))
            })
    }

    fn replace_week(
        &self,
        tenant_id: Uuid,
        rows: Vec<WorkingHours>,
    ) -> StoreResult<Vec<WorkingHours>> {
        let mut tables = self.write()?;
        tables.working_hours.retain(|(t, _), _| *t != tenant_id);
        for row in rows {
            tables.working_hours.insert((row.tenant_id, row.day), row);
        }
        let mut created: Vec<WorkingHours> = tables
            .working_hours
            .values()
            .filter(|row| row.tenant_id == tenant_id)
            .cloned()
            .collect();
        created.sort_by_key(|row| row.day.num_days_from_sunday());
        Ok(created)
    }

    fn time_block(&self, id: Uuid) -> StoreResult<Option<TimeBlock>> {
        let tables = self.read()?;
        Ok(tables.time_blocks.get(&id).cloned())
    }

    fn time_blocks_in_range(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<TimeBlock>> {
        let tables = self.read()?;
        let mut blocks: Vec<TimeBlock> = tables
            .time_blocks
            .values()
            .filter(|b| b.tenant_id == tenant_id && b.start < end && b.end > start)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.start);
        Ok(blocks)
    }

    fn time_blocks_by_recurrence(
        &self,
        recurrence_id: Uuid,
        tenant_id: Uuid,
    ) -> StoreResult<Vec<TimeBlock>> {
        let tables = self.read()?;
        let mut blocks: Vec<TimeBlock> = tables
            .time_blocks
            .values()
            .filter(|b| b.tenant_id == tenant_id && b.recurrence_id == Some(recurrence_id))
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.start);
        Ok(blocks)
    }

    fn create_time_block(&self, block: TimeBlock) -> StoreResult<TimeBlock> {
        let mut tables = self.write()?;
        if tables.time_blocks.contains_key(&block.id) {
            return Err(StoreError::Conflict(format!("time block {}", block.id)));
        }
        tables.time_blocks.insert(block.id, block.clone());
        Ok(block)
    }

    fn create_time_blocks(&self, blocks: Vec<TimeBlock>) -> StoreResult<()> {
        let mut tables = self.write()?;
        if let Some(dup) = blocks.iter().find(|b| tables.time_blocks.contains_key(&b.id)) {
            return Err(StoreError::Conflict(format!("time block {}", dup.id)));
        }
        for block in blocks {
            tables.time_blocks.insert(block.id, block);
        }
        Ok(())
    }

    fn update_time_block(&self, block: TimeBlock) -> StoreResult<TimeBlock> {
        let mut tables = self.write()?;
        if !tables.time_blocks.contains_key(&block.id) {
            return Err(StoreError::NotFound(format!("time block {}", block.id)));
        }
        tables.time_blocks.insert(block.id, block.clone());
        Ok(block)
    }

    fn delete_time_block(&self, id: Uuid, tenant_id: Uuid) -> StoreResult<()> {
        let mut tables = self.write()?;
        match tables.time_blocks.get(&id) {
            Some(block) if block.tenant_id == tenant_id => {
                tables.time_blocks.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!("time block {id}"))),
        }
    }

    fn delete_time_blocks(&self, ids: &[Uuid]) -> StoreResult<()> {
        let mut tables = self.write()?;
        for id in ids {
            tables.time_blocks.remove(id);
        }
        Ok(())
    }

    fn delete_time_blocks_in_range(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<usize> {
        let mut tables = self.write()?;
        let before = tables.time_blocks.len();
        tables
            .time_blocks
            .retain(|_, b| !(b.tenant_id == tenant_id && b.start >= start && b.end <= end));
        Ok(before - tables.time_blocks.len())
    }

    fn replace_recurrence(
        &self,
        recurrence_id: Uuid,
        tenant_id: Uuid,
        blocks: Vec<TimeBlock>,
    ) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables
            .time_blocks
            .retain(|_, b| !(b.tenant_id == tenant_id && b.recurrence_id == Some(recurrence_id)));
        for block in blocks {
            tables.time_blocks.insert(block.id, block);
        }
        Ok(())
    }

    fn bookings_in_range(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Booking>> {
        let tables = self.read()?;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| {
                b.tenant_id == tenant_id
                    && b.status.occupies_calendar()
                    && b.start <= end
                    && b.end >= start
            })
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start);
        Ok(bookings)
    }

    fn upsert_booking(&self, booking: Booking) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.bookings.insert(booking.id, booking);
        Ok(())
    }

    fn delete_booking(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.bookings.remove(&id);
        Ok(())
    }

    fn tenant(&self, tenant_id: Uuid) -> StoreResult<Option<Tenant>> {
        let tables = self.read()?;
        Ok(tables.tenants.get(&tenant_id).cloned())
    }

    fn upsert_tenant(&self, tenant: Tenant) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.tenants.insert(tenant.id, tenant);
        Ok(())
    }
}
