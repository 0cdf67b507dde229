//! Typed client for the ParkingHub REST API.
//!
//! ```no_run
//! # async fn demo() -> Result<(), parkinghub_server::client::ApiError> {
//! use parkinghub_server::client::ParkingClient;
//! use parkinghub_server::parking::SpotQuery;
//!
//! let client = ParkingClient::new("http://localhost:3001/api");
//! client.auth().login("driver@example.com", "secret1").await?;
//! let spots = client.parking().search(&SpotQuery::default()).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod gateway;
mod in_flight;
mod resources;
mod session;
pub mod views;

pub use error::ApiError;
pub use gateway::ApiGateway;
pub use in_flight::{InFlight, InFlightGuard};
pub use resources::{AdminApi, AuthApi, BookingApi, ParkingApi, ParkingClient, UploadApi};
pub use session::{ClientSession, SessionStore};
pub use views::{
    check_access, search_visible, Access, BookingDraft, DenialReason, OwnerAnalyticsSummary,
    RoleRequirement, View,
};
