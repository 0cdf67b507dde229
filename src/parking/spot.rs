use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use super::pricing;
use crate::error::ServiceError;

/// Approval state of a listing. Only `Active` spots are searchable or bookable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Pending,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpotTransitionError {
    #[error("Spots cannot be moved back to pending")]
    BackToPending,

    #[error("Cannot move spot from {from} to {to}")]
    NotAllowed { from: SpotStatus, to: SpotStatus },
}

impl From<SpotTransitionError> for ServiceError {
    fn from(err: SpotTransitionError) -> Self {
        match err {
            SpotTransitionError::BackToPending => ServiceError::validation(err.to_string()),
            SpotTransitionError::NotAllowed { .. } => ServiceError::conflict(err.to_string()),
        }
    }
}

impl SpotStatus {
    pub const ALL: [SpotStatus; 3] = [SpotStatus::Pending, SpotStatus::Active, SpotStatus::Inactive];

    pub fn is_visible(self) -> bool {
        self == SpotStatus::Active
    }

    /// Validates a move to `target`. Requesting the current state is a no-op,
    /// pending is never a target and inactive spots stay inactive.
    pub fn transition_to(self, target: SpotStatus) -> Result<SpotStatus, SpotTransitionError> {
        use SpotStatus::*;
        match (self, target) {
            (_, Pending) => Err(SpotTransitionError::BackToPending),
            (from, to) if from == to => Ok(to),
            (Pending, Active) | (Pending, Inactive) | (Active, Inactive) => Ok(target),
            (from, to) => Err(SpotTransitionError::NotAllowed { from, to }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpotStatus::Pending => "pending",
            SpotStatus::Active => "active",
            SpotStatus::Inactive => "inactive",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(SpotStatus::Pending),
            "active" => Some(SpotStatus::Active),
            "inactive" => Some(SpotStatus::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSpot {
    pub id: usize,
    pub owner_id: usize,
    pub name: String,
    pub address: String,
    pub description: String,
    pub price_per_hour: f64,
    pub total_slots: u32,
    pub available_slots: u32,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub amenities: BTreeSet<String>,
    pub image_url: Option<String>,
    pub status: SpotStatus,
    pub created_at: DateTime<Utc>,
}

impl ParkingSpot {
    pub fn is_bookable(&self) -> bool {
        self.status.is_visible() && self.available_slots > 0
    }

    /// Slots currently held by reserved or active bookings.
    pub fn slots_in_use(&self) -> u32 {
        self.total_slots.saturating_sub(self.available_slots)
    }
}

/// Listing payload sent by an owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpot {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub description: String,
    pub price_per_hour: f64,
    pub total_slots: u32,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub amenities: BTreeSet<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn validate_coordinates(lat: Option<f64>, lng: Option<f64>) -> Result<(), ServiceError> {
    if let Some(lat) = lat {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ServiceError::validation("Latitude must be between -90 and 90"));
        }
    }
    if let Some(lng) = lng {
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ServiceError::validation(
                "Longitude must be between -180 and 180",
            ));
        }
    }
    Ok(())
}

fn validate_rate(price_per_hour: f64) -> Result<(), ServiceError> {
    pricing::validate_rate(price_per_hour).map_err(|e| ServiceError::validation(e.to_string()))
}

impl NewSpot {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::validation("Spot name cannot be empty"));
        }
        if self.address.trim().is_empty() {
            return Err(ServiceError::validation("Spot address cannot be empty"));
        }
        validate_rate(self.price_per_hour)?;
        if self.total_slots == 0 {
            return Err(ServiceError::validation(
                "A spot needs at least one slot",
            ));
        }
        validate_coordinates(self.lat, self.lng)
    }
}

/// Partial update of a listing. `status` is routed through the approval
/// state machine and is reserved to admins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_hour: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_slots: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amenities: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SpotStatus>,
}

impl SpotChanges {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(ServiceError::validation("Spot name cannot be empty"));
        }
        if matches!(&self.address, Some(address) if address.trim().is_empty()) {
            return Err(ServiceError::validation("Spot address cannot be empty"));
        }
        if let Some(price) = self.price_per_hour {
            validate_rate(price)?;
        }
        if self.total_slots == Some(0) {
            return Err(ServiceError::validation(
                "A spot needs at least one slot",
            ));
        }
        validate_coordinates(self.lat, self.lng)
    }

    /// True when the update carries fields other than `status`.
    pub fn has_field_changes(&self) -> bool {
        self.name.is_some()
            || self.address.is_some()
            || self.description.is_some()
            || self.price_per_hour.is_some()
            || self.total_slots.is_some()
            || self.lat.is_some()
            || self.lng.is_some()
            || self.amenities.is_some()
            || self.image_url.is_some()
    }
}

/// Filters for spot listings. The public search always pins `status` to active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotQuery {
    /// Case-insensitive substring matched against name and address.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub amenity: Option<String>,
}

impl SpotQuery {
    pub fn matches(&self, spot: &ParkingSpot) -> bool {
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = q.to_lowercase();
            if !spot.name.to_lowercase().contains(&needle)
                && !spot.address.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(max_price) = self.max_price {
            if spot.price_per_hour > max_price {
                return false;
            }
        }
        if let Some(amenity) = self.amenity.as_deref().filter(|a| !a.is_empty()) {
            if !spot
                .amenities
                .iter()
                .any(|a| a.eq_ignore_ascii_case(amenity))
            {
                return false;
            }
        }
        true
    }
}
