mod analytics;
mod booking;
mod parking_manager;
pub mod parking_store;
pub mod pricing;
mod spot;
mod sqlite_parking_store;

pub use analytics::{AdminAnalytics, BookingsByStatus, SpotsByStatus};
pub use booking::{
    Booking, BookingRequest, BookingStatus, BookingTransitionError, LifecycleSweep,
};
pub use parking_manager::{Actor, ParkingManager};
pub use parking_store::{BookingStore, ParkingStore, SpotStore};
pub use spot::{NewSpot, ParkingSpot, SpotChanges, SpotQuery, SpotStatus, SpotTransitionError};
pub use sqlite_parking_store::SqliteParkingStore;
