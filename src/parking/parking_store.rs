use super::pricing::PricingError;
use super::{
    Booking, BookingRequest, BookingStatus, BookingsByStatus, LifecycleSweep, NewSpot,
    ParkingSpot, SpotChanges, SpotQuery, SpotStatus, SpotsByStatus,
};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Which spots a listing call should consider before the query filters run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotScope {
    All,
    WithStatus(SpotStatus),
    OwnedBy(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Created(Booking),
    SpotNotFound,
    SpotNotActive,
    NoAvailability,
    InvalidWindow(PricingError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingTransitionOutcome {
    Applied(Booking),
    NotFound,
    StatusMismatch(BookingStatus),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpotUpdateOutcome {
    Updated(ParkingSpot),
    NotFound,
    CapacityBelowUsage { in_use: u32 },
    /// The spot left the status the transition was validated from.
    StatusMismatch(SpotStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotDeleteOutcome {
    Deleted,
    NotFound,
    OpenBookings(usize),
}

/// An approval transition already validated against `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpotTransition {
    pub from: SpotStatus,
    pub to: SpotStatus,
}

/// Everything an account leaves behind, removed by [`BookingStore::purge_account`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgedAccountData {
    pub bookings: usize,
    pub spots: usize,
}

pub trait SpotStore: Send + Sync {
    /// Stores a new listing in the pending state and returns it.
    fn insert_spot(&self, owner_id: usize, new_spot: &NewSpot) -> Result<ParkingSpot>;

    fn get_spot(&self, spot_id: usize) -> Result<Option<ParkingSpot>>;

    /// Returns the spots in `scope` that match `query`, newest first.
    fn list_spots(&self, scope: SpotScope, query: &SpotQuery) -> Result<Vec<ParkingSpot>>;

    /// Applies the non-status fields of `changes` and, when given, the status
    /// transition, all or nothing. A new slot count keeps the slots already
    /// held by bookings.
    fn update_spot(
        &self,
        spot_id: usize,
        changes: &SpotChanges,
        transition: Option<SpotTransition>,
    ) -> Result<SpotUpdateOutcome>;

    /// Writes `transition.to` only while the spot is still in `transition.from`.
    fn set_spot_status(
        &self,
        spot_id: usize,
        transition: SpotTransition,
    ) -> Result<SpotUpdateOutcome>;

    /// Deletes the spot unless a reserved or active booking still holds one of
    /// its slots.
    fn delete_spot(&self, spot_id: usize) -> Result<SpotDeleteOutcome>;

    fn count_spots_by_status(&self) -> Result<SpotsByStatus>;
}

pub trait BookingStore: Send + Sync {
    /// Atomically takes a slot on an active spot and records the booking,
    /// priced at the rate of the row it decrements. Either both the booking
    /// row and the decrement happen, or neither does.
    fn create_booking(&self, user_id: usize, request: &BookingRequest)
        -> Result<BookingOutcome>;

    fn get_booking(&self, booking_id: usize) -> Result<Option<Booking>>;

    fn list_user_bookings(&self, user_id: usize) -> Result<Vec<Booking>>;

    /// Bookings made on any spot owned by `owner_id`.
    fn list_owner_bookings(&self, owner_id: usize) -> Result<Vec<Booking>>;

    /// Moves a booking from `from` to `to`, releasing its slot when `to` no
    /// longer holds one.
    fn transition_booking(
        &self,
        booking_id: usize,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<BookingTransitionOutcome>;

    /// Deletes the booking, giving its slot back if it still held one.
    fn delete_booking(&self, booking_id: usize) -> Result<Option<Booking>>;

    /// Activates reserved bookings whose start has passed and completes
    /// active bookings whose end has passed.
    fn advance_lifecycle(&self, now: DateTime<Utc>) -> Result<LifecycleSweep>;

    /// Removes the bookings made by `user_id` and the spots they own.
    fn purge_account(&self, user_id: usize) -> Result<PurgedAccountData>;

    /// Counts per status plus revenue of every non-cancelled booking.
    fn booking_stats(&self) -> Result<(BookingsByStatus, f64)>;
}

pub trait ParkingStore: SpotStore + BookingStore {}

impl<T: SpotStore + BookingStore> ParkingStore for T {}
