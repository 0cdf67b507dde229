use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Reserved,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot move booking from {from} to {to}")]
pub struct BookingTransitionError {
    pub from: BookingStatus,
    pub to: BookingStatus,
}

impl From<BookingTransitionError> for ServiceError {
    fn from(err: BookingTransitionError) -> Self {
        ServiceError::conflict(err.to_string())
    }
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Reserved,
        BookingStatus::Active,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Whether a booking in this state occupies one of the spot's slots.
    pub fn holds_slot(self) -> bool {
        !self.is_terminal()
    }

    pub fn transition_to(self, target: BookingStatus) -> Result<BookingStatus, BookingTransitionError> {
        use BookingStatus::*;
        match (self, target) {
            (Reserved, Active) | (Reserved, Cancelled) | (Active, Completed) => Ok(target),
            (from, to) => Err(BookingTransitionError { from, to }),
        }
    }

    pub fn cancel(self) -> Result<BookingStatus, BookingTransitionError> {
        self.transition_to(BookingStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Reserved => "reserved",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reserved" => Some(BookingStatus::Reserved),
            "active" => Some(BookingStatus::Active),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: usize,
    pub user_id: usize,
    pub spot_id: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub spot_id: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl BookingRequest {
    /// Drops sub-second precision, which is not persisted.
    pub fn normalized(&self) -> BookingRequest {
        BookingRequest {
            spot_id: self.spot_id,
            start_time: self.start_time.trunc_subsecs(0),
            end_time: self.end_time.trunc_subsecs(0),
        }
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.end_time <= self.start_time {
            return Err(ServiceError::validation(
                "End time must be after start time",
            ));
        }
        Ok(())
    }
}

/// Outcome of a time-driven lifecycle pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleSweep {
    pub activated: usize,
    pub completed: usize,
}
