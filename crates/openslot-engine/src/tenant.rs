//! Booking-buffer settings — the slice of the mirrored tenant record that
//! providers may edit through the engine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use openslot_store::{BufferPatch, ScheduleStore, Tenant};

use crate::error::{EngineError, Result};

/// Longest accepted buffer, 8 hours.
const MAX_BUFFER_MINUTES: u32 = 480;

/// Padding applied around every booking, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferSettings {
    pub before_minutes: u32,
    pub after_minutes: u32,
}

pub struct TenantService<'a> {
    store: &'a dyn ScheduleStore,
}

impl<'a> TenantService<'a> {
    pub fn new(store: &'a dyn ScheduleStore) -> Self {
        Self { store }
    }

    pub fn buffer_settings(&self, tenant_id: Uuid) -> Result<BufferSettings> {
        let tenant = self.fetch(tenant_id)?;
        Ok(BufferSettings {
            before_minutes: tenant.buffer_before_minutes,
            after_minutes: tenant.buffer_after_minutes,
        })
    }

    /// Updates one or both buffers. At least one field must be present and
    /// neither may exceed eight hours.
    pub fn patch_buffers(
        &self,
        tenant_id: Uuid,
        patch: BufferPatch,
        now: DateTime<Utc>,
    ) -> Result<BufferSettings> {
        if patch.is_empty() {
            return Err(EngineError::invalid(
                "bufferBeforeMinutes",
                "at least one buffer setting must be provided",
            ));
        }
        if patch.before_minutes.is_some_and(|minutes| minutes > MAX_BUFFER_MINUTES) {
            return Err(EngineError::invalid(
                "bufferBeforeMinutes",
                "bufferBeforeMinutes cannot exceed 480 minutes (8 hours)",
            ));
        }
        if patch.after_minutes.is_some_and(|minutes| minutes > MAX_BUFFER_MINUTES) {
            return Err(EngineError::invalid(
                "bufferAfterMinutes",
                "bufferAfterMinutes cannot exceed 480 minutes (8 hours)",
            ));
        }

        let tenant = self.fetch(tenant_id)?;
        let updated = patch.apply(&tenant, now);
        self.store.upsert_tenant(updated.clone())?;
        info!(
            %tenant_id,
            before = updated.buffer_before_minutes,
            after = updated.buffer_after_minutes,
            "updated buffer settings"
        );
        Ok(BufferSettings {
            before_minutes: updated.buffer_before_minutes,
            after_minutes: updated.buffer_after_minutes,
        })
    }

    fn fetch(&self, tenant_id: Uuid) -> Result<Tenant> {
        self.store
            .tenant(tenant_id)?
            .ok_or_else(|| EngineError::not_found("tenant", tenant_id))
    }
}
