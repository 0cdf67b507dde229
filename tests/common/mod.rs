//! Common test infrastructure for end-to-end tests
//!
//! Every test spawns its own server with fresh databases, seeded with a
//! driver, two owners, an admin and three spots (see [`fixtures`]).
//!
//! # Example
//!
//! ```no_run
//! use crate::common::{TestClient, TestServer};
//!
//! #[tokio::test]
//! async fn test_search() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.search_spots(&[]).await;
//!     assert_eq!(response.status(), 200);
//! }
//! ```

mod client;
mod constants;
pub mod fixtures;
mod server;

pub use client::TestClient;
#[allow(unused_imports)]
pub use constants::*;
pub use fixtures::SeededData;
pub use server::TestServer;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};

/// Start of a booking window `hours_from_now` hours ahead, whole seconds.
#[allow(dead_code)]
pub fn hours_from_now(hours: i64) -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0) + TimeDelta::hours(hours)
}
