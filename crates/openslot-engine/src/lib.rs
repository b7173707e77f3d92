//! # openslot-engine
//!
//! Computes which time ranges a service provider ("tenant") can still be
//! booked in, and expands recurring blackout periods into concrete
//! records.
//!
//! Four components build on each other: the interval primitives, the
//! recurrence expander, the availability calculator, and the conflict
//! detector. Lifecycle services wrap them over the storage collaborator
//! from `openslot-store`; every computation is a pure pass over data
//! fetched immediately before use, and no function reads the system
//! clock — callers pass the "now" anchor explicitly.
//!
//! ## Modules
//!
//! - [`interval`] — overlap, subtraction, and merge on time ranges
//! - [`recurrence`] — pattern validation and occurrence expansion
//! - [`availability`] — per-day open ranges for a tenant
//! - [`conflict`] — per-source conflicts for one candidate slot
//! - [`timeblock`] — blackout-period lifecycle
//! - [`working_hours`] — weekly opening-hours lifecycle
//! - [`tenant`] — booking-buffer settings
//! - [`error`] — error types

pub mod availability;
pub mod conflict;
pub mod error;
pub mod interval;
pub mod recurrence;
pub mod tenant;
pub mod timeblock;
pub mod working_hours;

pub use availability::available_ranges;
pub use conflict::{detect_conflicts, is_slot_available, Conflict, ConflictKind, SlotCheck};
pub use error::{EngineError, FieldError};
pub use interval::TimeRange;
pub use recurrence::{
    expand, Cadence, Frequency, Recurrence, RecurrenceEnd, RecurrencePattern, RecurrenceService,
};
pub use tenant::{BufferSettings, TenantService};
pub use timeblock::{CreatedTimeBlock, NewTimeBlock, TimeBlockService};
pub use working_hours::{NewWorkingHours, WeekEntry, WorkingHoursService};
