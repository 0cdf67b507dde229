//! Ceiling-hour pricing shared by the booking service and the client estimate.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PricingError {
    #[error("End time must be after start time")]
    EmptyWindow,

    #[error("Price per hour must be a finite, non-negative amount")]
    InvalidRate,
}

/// Number of started hours between `start` and `end`: any partial hour counts
/// as a whole one.
pub fn billable_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<u64, PricingError> {
    let window: TimeDelta = end - start;
    if window <= TimeDelta::zero() {
        return Err(PricingError::EmptyWindow);
    }
    let seconds = window.num_seconds();
    let has_fraction = window.subsec_nanos() > 0;
    let mut hours = seconds / SECONDS_PER_HOUR;
    if seconds % SECONDS_PER_HOUR != 0 || has_fraction {
        hours += 1;
    }
    Ok(hours as u64)
}

pub fn validate_rate(price_per_hour: f64) -> Result<(), PricingError> {
    if price_per_hour.is_finite() && price_per_hour >= 0.0 {
        Ok(())
    } else {
        Err(PricingError::InvalidRate)
    }
}

/// Total price of occupying a spot from `start` to `end`.
pub fn booking_price(
    price_per_hour: f64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<f64, PricingError> {
    validate_rate(price_per_hour)?;
    Ok(billable_hours(start, end)? as f64 * price_per_hour)
}
