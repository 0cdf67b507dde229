//! HTTP client for end-to-end tests
//!
//! Wraps a cookie-aware reqwest client with one method per API endpoint.
//! Every method returns the raw response so tests can assert on status codes.

use super::constants::*;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

/// Test client with one method per endpoint
///
/// Login stores the session cookie, so later requests are authenticated
/// without passing the token around.
pub struct TestClient {
    pub client: Client,
    pub base_url: String,
}

impl TestClient {
    /// Creates an unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, base_url }
    }

    /// Creates a client logged in with the given credentials
    ///
    /// # Panics
    ///
    /// Panics if the login does not answer 201
    pub async fn authenticated_as(base_url: String, email: &str, password: &str) -> Self {
        let client = Self::new(base_url);
        let response = client.login(email, password).await;
        assert_eq!(
            response.status(),
            StatusCode::CREATED,
            "Login failed for {}",
            email
        );
        client
    }

    /// Logged in as the driver (role `user`)
    pub async fn authenticated_driver(base_url: String) -> Self {
        Self::authenticated_as(base_url, DRIVER_EMAIL, DRIVER_PASS).await
    }

    /// Logged in as the owner of the seeded spots
    pub async fn authenticated_owner(base_url: String) -> Self {
        Self::authenticated_as(base_url, OWNER_EMAIL, OWNER_PASS).await
    }

    /// Logged in as the owner without spots
    pub async fn authenticated_other_owner(base_url: String) -> Self {
        Self::authenticated_as(base_url, OTHER_OWNER_EMAIL, OTHER_OWNER_PASS).await
    }

    /// Logged in as the admin
    pub async fn authenticated_admin(base_url: String) -> Self {
        Self::authenticated_as(base_url, ADMIN_EMAIL, ADMIN_PASS).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    // ========================================================================
    // Root
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET an arbitrary path below the base URL
    pub async fn get_raw(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Raw GET request failed")
    }

    /// POST a JSON body to an arbitrary /api path
    pub async fn post_json_raw(&self, path: &str, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Raw POST request failed")
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /api/auth/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /api/auth/register
    pub async fn register(&self, body: Value) -> Response {
        self.client
            .post(self.url("/auth/register"))
            .json(&body)
            .send()
            .await
            .expect("Register request failed")
    }

    /// GET /api/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(self.url("/auth/logout"))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /api/auth/session
    pub async fn get_session(&self) -> Response {
        self.client
            .get(self.url("/auth/session"))
            .send()
            .await
            .expect("Session request failed")
    }

    /// GET /api/auth/session with an explicit bearer token
    pub async fn get_session_with_bearer(&self, token: &str) -> Response {
        self.client
            .get(self.url("/auth/session"))
            .bearer_auth(token)
            .send()
            .await
            .expect("Session request failed")
    }

    // ========================================================================
    // Parking Endpoints
    // ========================================================================

    /// GET /api/parking/all with query parameters
    pub async fn search_spots(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/parking/all"))
            .query(query)
            .send()
            .await
            .expect("Search request failed")
    }

    /// GET /api/parking/admin/all-spots
    pub async fn get_all_spots_admin(&self) -> Response {
        self.client
            .get(self.url("/parking/admin/all-spots"))
            .send()
            .await
            .expect("All spots request failed")
    }

    /// GET /api/parking/mine
    pub async fn get_my_spots(&self) -> Response {
        self.client
            .get(self.url("/parking/mine"))
            .send()
            .await
            .expect("My spots request failed")
    }

    /// GET /api/parking/{id}
    pub async fn get_spot(&self, spot_id: usize) -> Response {
        self.client
            .get(self.url(&format!("/parking/{}", spot_id)))
            .send()
            .await
            .expect("Get spot request failed")
    }

    /// POST /api/parking/add
    pub async fn add_spot(&self, body: Value) -> Response {
        self.client
            .post(self.url("/parking/add"))
            .json(&body)
            .send()
            .await
            .expect("Add spot request failed")
    }

    /// PUT /api/parking/update/{id}
    pub async fn update_spot(&self, spot_id: usize, body: Value) -> Response {
        self.client
            .put(self.url(&format!("/parking/update/{}", spot_id)))
            .json(&body)
            .send()
            .await
            .expect("Update spot request failed")
    }

    /// DELETE /api/parking/delete/{id}
    pub async fn delete_spot(&self, spot_id: usize) -> Response {
        self.client
            .delete(self.url(&format!("/parking/delete/{}", spot_id)))
            .send()
            .await
            .expect("Delete spot request failed")
    }

    /// PUT /api/parking/change-status/{id}
    pub async fn change_spot_status(&self, spot_id: usize, status: &str) -> Response {
        self.client
            .put(self.url(&format!("/parking/change-status/{}", spot_id)))
            .json(&json!({ "status": status }))
            .send()
            .await
            .expect("Change status request failed")
    }

    // ========================================================================
    // Booking Endpoints
    // ========================================================================

    /// POST /api/booking/create
    pub async fn create_booking(
        &self,
        spot_id: usize,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Response {
        self.client
            .post(self.url("/booking/create"))
            .json(&json!({
                "spotId": spot_id,
                "startTime": start_time,
                "endTime": end_time,
            }))
            .send()
            .await
            .expect("Create booking request failed")
    }

    /// GET /api/booking/user/{user_id}
    pub async fn get_user_bookings(&self, user_id: usize) -> Response {
        self.client
            .get(self.url(&format!("/booking/user/{}", user_id)))
            .send()
            .await
            .expect("User bookings request failed")
    }

    /// GET /api/booking/owner/{owner_id}
    pub async fn get_owner_bookings(&self, owner_id: usize) -> Response {
        self.client
            .get(self.url(&format!("/booking/owner/{}", owner_id)))
            .send()
            .await
            .expect("Owner bookings request failed")
    }

    /// PUT /api/booking/cancel/{id}
    pub async fn cancel_booking(&self, booking_id: usize) -> Response {
        self.client
            .put(self.url(&format!("/booking/cancel/{}", booking_id)))
            .send()
            .await
            .expect("Cancel booking request failed")
    }

    /// DELETE /api/booking/delete/{id}
    pub async fn delete_booking(&self, booking_id: usize) -> Response {
        self.client
            .delete(self.url(&format!("/booking/delete/{}", booking_id)))
            .send()
            .await
            .expect("Delete booking request failed")
    }

    // ========================================================================
    // Admin Endpoints
    // ========================================================================

    /// GET /api/admin/users
    pub async fn admin_list_users(&self) -> Response {
        self.client
            .get(self.url("/admin/users"))
            .send()
            .await
            .expect("List users request failed")
    }

    /// PUT /api/admin/spot/approve/{id}
    pub async fn admin_approve_spot(&self, spot_id: usize) -> Response {
        self.client
            .put(self.url(&format!("/admin/spot/approve/{}", spot_id)))
            .send()
            .await
            .expect("Approve spot request failed")
    }

    /// GET /api/admin/analytics
    pub async fn admin_get_analytics(&self) -> Response {
        self.client
            .get(self.url("/admin/analytics"))
            .send()
            .await
            .expect("Analytics request failed")
    }

    /// DELETE /api/admin/user/{id}
    pub async fn admin_delete_user(&self, user_id: usize) -> Response {
        self.client
            .delete(self.url(&format!("/admin/user/{}", user_id)))
            .send()
            .await
            .expect("Delete user request failed")
    }

    // ========================================================================
    // Upload Endpoints
    // ========================================================================

    /// POST /api/upload/image with `bytes` in the `image` field
    pub async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Response {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("image", part);
        self.client
            .post(self.url("/upload/image"))
            .multipart(form)
            .send()
            .await
            .expect("Upload request failed")
    }
}
