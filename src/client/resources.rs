//! Named request/response contracts of the REST API, layered on [`ApiGateway`].

use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::views::{search_visible, OwnerAnalyticsSummary};
use super::{ApiError, ApiGateway, SessionStore};
use crate::parking::{
    AdminAnalytics, Booking, BookingRequest, NewSpot, ParkingSpot, SpotChanges, SpotQuery,
    SpotStatus,
};
use crate::user::{Account, NewAccount};

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: Account,
}

#[derive(Serialize)]
struct StatusChange {
    status: SpotStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageUploaded {
    image_url: String,
}

pub struct AuthApi<'a> {
    gateway: &'a ApiGateway,
}

impl AuthApi<'_> {
    /// Signs in and stores the returned identity in the session store.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, ApiError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        let response: LoginResponse = self
            .gateway
            .post("/auth/login", &Credentials { email, password })
            .await?;
        self.gateway
            .session()
            .establish(&response.user, response.token);
        Ok(response.user)
    }

    pub async fn register(&self, new_account: &NewAccount) -> Result<Account, ApiError> {
        if new_account.name.trim().is_empty()
            || new_account.email.trim().is_empty()
            || new_account.password.is_empty()
        {
            return Err(ApiError::Validation(
                "Name, email and password are required".to_string(),
            ));
        }
        self.gateway.post("/auth/register", new_account).await
    }

    /// Revokes the token server side and always clears the local session.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if !self.gateway.session().is_signed_in() {
            return Ok(());
        }
        let result = self
            .gateway
            .send_empty(self.gateway.request(Method::GET, "/auth/logout"))
            .await;
        self.gateway.session().clear();
        result
    }

    pub async fn current_account(&self) -> Result<Account, ApiError> {
        self.gateway.get("/auth/session").await
    }
}

pub struct ParkingApi<'a> {
    gateway: &'a ApiGateway,
}

impl ParkingApi<'_> {
    /// Active spots matching `query`. Non-active entries are dropped even if
    /// the server returned them.
    pub async fn search(&self, query: &SpotQuery) -> Result<Vec<ParkingSpot>, ApiError> {
        let spots = self.gateway.get_with_query("/parking/all", query).await?;
        Ok(search_visible(spots, query))
    }

    pub async fn get(&self, spot_id: usize) -> Result<ParkingSpot, ApiError> {
        self.gateway.get(&format!("/parking/{}", spot_id)).await
    }

    pub async fn mine(&self) -> Result<Vec<ParkingSpot>, ApiError> {
        self.gateway.get("/parking/mine").await
    }

    pub async fn all_for_admin(&self) -> Result<Vec<ParkingSpot>, ApiError> {
        self.gateway.get("/parking/admin/all-spots").await
    }

    pub async fn add(&self, spot: &NewSpot) -> Result<ParkingSpot, ApiError> {
        self.gateway.post("/parking/add", spot).await
    }

    pub async fn update(&self, spot_id: usize, changes: &SpotChanges) -> Result<ParkingSpot, ApiError> {
        self.gateway
            .put(&format!("/parking/update/{}", spot_id), changes)
            .await
    }

    pub async fn delete(&self, spot_id: usize) -> Result<(), ApiError> {
        self.gateway
            .delete(&format!("/parking/delete/{}", spot_id))
            .await
    }

    pub async fn change_status(
        &self,
        spot_id: usize,
        status: SpotStatus,
    ) -> Result<ParkingSpot, ApiError> {
        self.gateway
            .put(
                &format!("/parking/change-status/{}", spot_id),
                &StatusChange { status },
            )
            .await
    }
}

pub struct BookingApi<'a> {
    gateway: &'a ApiGateway,
}

impl BookingApi<'_> {
    pub async fn create(&self, request: &BookingRequest) -> Result<Booking, ApiError> {
        request
            .normalized()
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        self.gateway.post("/booking/create", request).await
    }

    pub async fn user_bookings(&self, user_id: usize) -> Result<Vec<Booking>, ApiError> {
        self.gateway
            .get(&format!("/booking/user/{}", user_id))
            .await
    }

    pub async fn owner_bookings(&self, owner_id: usize) -> Result<Vec<Booking>, ApiError> {
        self.gateway
            .get(&format!("/booking/owner/{}", owner_id))
            .await
    }

    pub async fn cancel(&self, booking_id: usize) -> Result<Booking, ApiError> {
        self.gateway
            .put_empty(&format!("/booking/cancel/{}", booking_id))
            .await
    }

    pub async fn delete(&self, booking_id: usize) -> Result<(), ApiError> {
        self.gateway
            .delete(&format!("/booking/delete/{}", booking_id))
            .await
    }
}

pub struct AdminApi<'a> {
    gateway: &'a ApiGateway,
}

impl AdminApi<'_> {
    pub async fn users(&self) -> Result<Vec<Account>, ApiError> {
        self.gateway.get("/admin/users").await
    }

    pub async fn approve_spot(&self, spot_id: usize) -> Result<ParkingSpot, ApiError> {
        self.gateway
            .put_empty(&format!("/admin/spot/approve/{}", spot_id))
            .await
    }

    pub async fn analytics(&self) -> Result<AdminAnalytics, ApiError> {
        self.gateway.get("/admin/analytics").await
    }

    pub async fn delete_user(&self, user_id: usize) -> Result<(), ApiError> {
        self.gateway
            .delete(&format!("/admin/user/{}", user_id))
            .await
    }
}

pub struct UploadApi<'a> {
    gateway: &'a ApiGateway,
}

impl UploadApi<'_> {
    /// Uploads an image and returns the URL it is served from.
    pub async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        if bytes.is_empty() {
            return Err(ApiError::Validation("Image is empty".to_string()));
        }
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part(crate::server::IMAGE_FIELD_NAME, part);
        let uploaded: ImageUploaded = self
            .gateway
            .send_json(
                self.gateway
                    .request(Method::POST, "/upload/image")
                    .multipart(form),
            )
            .await?;
        Ok(uploaded.image_url)
    }
}

/// Entry point of the client library: one gateway, one session, all resources.
#[derive(Debug, Clone)]
pub struct ParkingClient {
    gateway: ApiGateway,
}

impl ParkingClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_session(api_url, SessionStore::new())
    }

    pub fn with_session(api_url: impl Into<String>, session: SessionStore) -> Self {
        Self {
            gateway: ApiGateway::new(api_url, session),
        }
    }

    pub fn session(&self) -> &SessionStore {
        self.gateway.session()
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi {
            gateway: &self.gateway,
        }
    }

    pub fn parking(&self) -> ParkingApi<'_> {
        ParkingApi {
            gateway: &self.gateway,
        }
    }

    pub fn bookings(&self) -> BookingApi<'_> {
        BookingApi {
            gateway: &self.gateway,
        }
    }

    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi {
            gateway: &self.gateway,
        }
    }

    pub fn upload(&self) -> UploadApi<'_> {
        UploadApi {
            gateway: &self.gateway,
        }
    }

    /// Loads the signed-in owner's spots and bookings and summarizes them.
    pub async fn owner_analytics(&self, today: NaiveDate) -> Result<OwnerAnalyticsSummary, ApiError> {
        let owner_id = self.session().user_id().ok_or(ApiError::Unauthorized)?;
        let parking = self.parking();
        let bookings = self.bookings();
        let (spots, bookings) =
            tokio::try_join!(parking.mine(), bookings.owner_bookings(owner_id))?;
        Ok(OwnerAnalyticsSummary::from_parts(
            owner_id, &spots, &bookings, today,
        ))
    }
}
