use serde::{Deserialize, Serialize};

use super::{BookingStatus, SpotStatus};
use crate::user::AccountsByRole;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotsByStatus {
    pub pending: usize,
    pub active: usize,
    pub inactive: usize,
}

impl SpotsByStatus {
    pub fn add(&mut self, status: SpotStatus, count: usize) {
        match status {
            SpotStatus::Pending => self.pending += count,
            SpotStatus::Active => self.active += count,
            SpotStatus::Inactive => self.inactive += count,
        }
    }

    pub fn get(&self, status: SpotStatus) -> usize {
        match status {
            SpotStatus::Pending => self.pending,
            SpotStatus::Active => self.active,
            SpotStatus::Inactive => self.inactive,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.active + self.inactive
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingsByStatus {
    pub reserved: usize,
    pub active: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl BookingsByStatus {
    pub fn add(&mut self, status: BookingStatus, count: usize) {
        match status {
            BookingStatus::Reserved => self.reserved += count,
            BookingStatus::Active => self.active += count,
            BookingStatus::Completed => self.completed += count,
            BookingStatus::Cancelled => self.cancelled += count,
        }
    }

    pub fn total(&self) -> usize {
        self.reserved + self.active + self.completed + self.cancelled
    }
}

/// Platform-wide aggregates shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAnalytics {
    pub total_users: usize,
    pub users_by_role: AccountsByRole,
    pub total_spots: usize,
    pub spots_by_status: SpotsByStatus,
    pub total_bookings: usize,
    pub bookings_by_status: BookingsByStatus,
    /// Sum of the price of every booking that was not cancelled.
    pub total_revenue: f64,
}

impl AdminAnalytics {
    pub fn new(
        users_by_role: AccountsByRole,
        spots_by_status: SpotsByStatus,
        bookings_by_status: BookingsByStatus,
        total_revenue: f64,
    ) -> Self {
        AdminAnalytics {
            total_users: users_by_role.total(),
            users_by_role,
            total_spots: spots_by_status.total(),
            spots_by_status,
            total_bookings: bookings_by_status.total(),
            bookings_by_status,
            total_revenue,
        }
    }
}
