//! Tests for the buffer-settings service.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use openslot_engine::{EngineError, TenantService};
use openslot_store::{BufferPatch, MemoryStore, ScheduleStore, Tenant};

fn dt(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn seeded_tenant(store: &MemoryStore) -> Uuid {
    let tenant_id = Uuid::new_v4();
    store
        .upsert_tenant(Tenant {
            id: tenant_id,
            business_name: "Fade & Blade".into(),
            email: "book@fadeandblade.test".into(),
            phone: None,
            address: None,
            time_zone: "UTC".into(),
            buffer_before_minutes: 5,
            buffer_after_minutes: 10,
            created_at: dt("2025-01-01T00:00:00Z"),
            updated_at: dt("2025-01-01T00:00:00Z"),
        })
        .unwrap();
    tenant_id
}

#[test]
fn buffer_settings_read_back_from_the_mirror() {
    let store = MemoryStore::new();
    let tenant_id = seeded_tenant(&store);
    let service = TenantService::new(&store);

    let settings = service.buffer_settings(tenant_id).unwrap();
    assert_eq!(settings.before_minutes, 5);
    assert_eq!(settings.after_minutes, 10);
}

#[test]
fn patching_one_buffer_keeps_the_other() {
    let store = MemoryStore::new();
    let tenant_id = seeded_tenant(&store);
    let service = TenantService::new(&store);

    let settings = service
        .patch_buffers(
            tenant_id,
            BufferPatch {
                after_minutes: Some(30),
                ..BufferPatch::default()
            },
            dt("2025-02-01T00:00:00Z"),
        )
        .unwrap();

    assert_eq!(settings.before_minutes, 5);
    assert_eq!(settings.after_minutes, 30);

    let persisted = store.tenant(tenant_id).unwrap().unwrap();
    assert_eq!(persisted.buffer_after_minutes, 30);
    assert_eq!(persisted.updated_at, dt("2025-02-01T00:00:00Z"));
}

#[test]
fn an_empty_patch_is_rejected() {
    let store = MemoryStore::new();
    let tenant_id = seeded_tenant(&store);
    let service = TenantService::new(&store);

    let err = service
        .patch_buffers(tenant_id, BufferPatch::default(), dt("2025-02-01T00:00:00Z"))
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
}

#[test]
fn buffers_beyond_eight_hours_are_rejected() {
    let store = MemoryStore::new();
    let tenant_id = seeded_tenant(&store);
    let service = TenantService::new(&store);

    let err = service
        .patch_buffers(
            tenant_id,
            BufferPatch {
                before_minutes: Some(481),
                ..BufferPatch::default()
            },
            dt("2025-02-01T00:00:00Z"),
        )
        .unwrap_err();
    assert!(err.to_string().contains("480"));

    // 480 itself is the inclusive cap.
    service
        .patch_buffers(
            tenant_id,
            BufferPatch {
                before_minutes: Some(480),
                ..BufferPatch::default()
            },
            dt("2025-02-01T00:00:00Z"),
        )
        .unwrap();
}

#[test]
fn unknown_tenant_is_reported_as_not_found() {
    let store = MemoryStore::new();
    let service = TenantService::new(&store);

    let err = service.buffer_settings(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, EngineError::NotFound { entity: "tenant", .. }));
}
