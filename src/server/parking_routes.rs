//! Spot listing, search and management routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::session::Session;
use super::state::{GuardedParkingManager, ServerState};
use crate::error::ServiceResult;
use crate::parking::{NewSpot, ParkingSpot, SpotChanges, SpotQuery, SpotStatus};
use crate::user::Capability;

#[derive(Deserialize, Debug)]
struct ChangeStatusBody {
    pub status: SpotStatus,
}

async fn list_spots(
    State(parking_manager): State<GuardedParkingManager>,
    ApiQuery(query): ApiQuery<SpotQuery>,
) -> ServiceResult<Json<Vec<ParkingSpot>>> {
    Ok(Json(parking_manager.list_active_spots(&query)?))
}

async fn list_all_spots(
    State(parking_manager): State<GuardedParkingManager>,
    session: Session,
    ApiQuery(query): ApiQuery<SpotQuery>,
) -> ServiceResult<Json<Vec<ParkingSpot>>> {
    Ok(Json(
        parking_manager.list_all_spots(&session.actor(), &query)?,
    ))
}

async fn list_my_spots(
    State(parking_manager): State<GuardedParkingManager>,
    session: Session,
) -> ServiceResult<Json<Vec<ParkingSpot>>> {
    Ok(Json(parking_manager.list_owner_spots(&session.actor())?))
}

async fn get_spot(
    State(parking_manager): State<GuardedParkingManager>,
    session: Option<Session>,
    ApiPath(id): ApiPath<usize>,
) -> ServiceResult<Json<ParkingSpot>> {
    let actor = session.map(|s| s.actor());
    Ok(Json(parking_manager.get_spot(actor.as_ref(), id)?))
}

async fn add_spot(
    State(parking_manager): State<GuardedParkingManager>,
    session: Session,
    ApiJson(body): ApiJson<NewSpot>,
) -> ServiceResult<impl IntoResponse> {
    let actor = session.require(Capability::ManageOwnSpots)?;
    let spot = parking_manager.add_spot(&actor, body)?;
    Ok((StatusCode::CREATED, Json(spot)))
}

async fn update_spot(
    State(parking_manager): State<GuardedParkingManager>,
    session: Session,
    ApiPath(id): ApiPath<usize>,
    ApiJson(body): ApiJson<SpotChanges>,
) -> ServiceResult<Json<ParkingSpot>> {
    Ok(Json(parking_manager.update_spot(
        &session.actor(),
        id,
        body,
    )?))
}

async fn delete_spot(
    State(parking_manager): State<GuardedParkingManager>,
    session: Session,
    ApiPath(id): ApiPath<usize>,
) -> ServiceResult<StatusCode> {
    parking_manager.delete_spot(&session.actor(), id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_spot_status(
    State(parking_manager): State<GuardedParkingManager>,
    session: Session,
    ApiPath(id): ApiPath<usize>,
    ApiJson(body): ApiJson<ChangeStatusBody>,
) -> ServiceResult<Json<ParkingSpot>> {
    Ok(Json(parking_manager.change_spot_status(
        &session.actor(),
        id,
        body.status,
    )?))
}

/// Build the parking routes.
///
/// - GET /all (public, active spots only)
/// - GET /admin/all-spots
/// - GET /mine
/// - GET /{id}
/// - POST /add
/// - PUT /update/{id}
/// - DELETE /delete/{id}
/// - PUT /change-status/{id}
pub fn parking_routes() -> Router<ServerState> {
    Router::new()
        .route("/all", get(list_spots))
        .route("/admin/all-spots", get(list_all_spots))
        .route("/mine", get(list_my_spots))
        .route("/{id}", get(get_spot))
        .route("/add", post(add_spot))
        .route("/update/{id}", put(update_spot))
        .route("/delete/{id}", delete(delete_spot))
        .route("/change-status/{id}", put(change_spot_status))
}
