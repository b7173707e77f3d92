//! Persisted record types for tenant scheduling.
//!
//! All instants are `DateTime<Utc>` and are assumed to be normalized to a
//! single zone before they reach this crate.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opening window for one (tenant, weekday) pair.
///
/// At most one row exists per tenant and weekday. A missing row means the
/// provider is reachable the full 24 hours of that day, and a row whose
/// `start_time` equals `end_time` means the same thing. Consumers
/// special-case both; the store does not normalize them away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Stored on behalf of the booking system; the availability engine
    /// does not consume it.
    pub max_concurrent_bookings: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a provider blocked out a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeBlockKind {
    Vacation,
    Break,
    Custom,
}

/// A blackout period during which no booking can be placed.
///
/// Invariant: `start < end`, enforced at the service boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: TimeBlockKind,
    pub reason: Option<String>,
    /// Groups every occurrence generated from one recurrence definition,
    /// including the originally created block. `None` for one-off blocks.
    pub recurrence_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeBlock {
    pub fn is_recurring(&self) -> bool {
        self.recurrence_id.is_some()
    }
}

/// Lifecycle state of a mirrored booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Pending and Confirmed bookings occupy calendar time; Completed and
    /// Cancelled do not.
    pub fn occupies_calendar(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

/// A reservation mirrored from the booking system. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Provider settings mirrored from the tenant system.
///
/// The buffer minutes pad every booking on both sides when the engine
/// computes busy periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub business_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub time_zone: String,
    pub buffer_before_minutes: u32,
    pub buffer_after_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
