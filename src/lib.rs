//! ParkingHub server library
//!
//! Exposes the marketplace service (stores, managers, HTTP routes) and the
//! typed client used by frontends and end-to-end tests.

pub mod client;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod parking;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

pub use error::{ServiceError, ServiceResult};
pub use parking::{ParkingManager, ParkingStore, SqliteParkingStore};
pub use server::{run_server, RequestsLoggingLevel};
pub use user::{Role, SqliteUserStore, UserManager, UserStore};
