//! # openslot-store
//!
//! Domain records and the storage collaborator for the openslot
//! availability engine.
//!
//! `WorkingHours` and `TimeBlock` are owned by the provider and edited
//! through the engine's lifecycle services. `Booking` and `Tenant` are
//! mirrored from external systems; the engine reads them but never writes
//! them (the `upsert_*` hooks exist for the mirroring pipeline).
//!
//! ## Modules
//!
//! - [`entities`] — the persisted record types
//! - [`patch`] — partial-update structures that produce fresh records
//! - [`store`] — the [`ScheduleStore`] trait and its error type
//! - [`memory`] — a lock-based in-memory backend

pub mod entities;
pub mod memory;
pub mod patch;
pub mod store;

pub use entities::{Booking, BookingStatus, Tenant, TimeBlock, TimeBlockKind, WorkingHours};
pub use memory::MemoryStore;
pub use patch::{BufferPatch, TimeBlockPatch, WorkingHoursPatch};
pub use store::{ScheduleStore, StoreError, StoreResult};
