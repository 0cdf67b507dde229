//! Booking creation, listing and cancellation routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};

use super::metrics::record_booking_outcome;
use super::extract::{ApiJson, ApiPath};
use super::session::Session;
use super::state::{GuardedParkingManager, ServerState};
use crate::error::{ServiceError, ServiceResult};
use crate::parking::{Booking, BookingRequest};

fn booking_outcome_label(result: &ServiceResult<Booking>) -> &'static str {
    match result {
        Ok(_) => "created",
        Err(ServiceError::Validation(_)) => "invalid",
        Err(ServiceError::NotFound(_)) => "spot_not_found",
        Err(ServiceError::Conflict(_)) => "conflict",
        Err(ServiceError::Forbidden(_)) => "forbidden",
        Err(_) => "error",
    }
}

async fn create_booking(
    State(parking_manager): State<GuardedParkingManager>,
    session: Session,
    ApiJson(body): ApiJson<BookingRequest>,
) -> ServiceResult<impl IntoResponse> {
    let result = parking_manager.create_booking(&session.actor(), body);
    record_booking_outcome(booking_outcome_label(&result));
    Ok((StatusCode::CREATED, Json(result?)))
}

async fn list_user_bookings(
    State(parking_manager): State<GuardedParkingManager>,
    session: Session,
    ApiPath(user_id): ApiPath<usize>,
) -> ServiceResult<Json<Vec<Booking>>> {
    Ok(Json(
        parking_manager.list_user_bookings(&session.actor(), user_id)?,
    ))
}

async fn list_owner_bookings(
    State(parking_manager): State<GuardedParkingManager>,
    session: Session,
    ApiPath(owner_id): ApiPath<usize>,
) -> ServiceResult<Json<Vec<Booking>>> {
    Ok(Json(
        parking_manager.list_owner_bookings(&session.actor(), owner_id)?,
    ))
}

async fn cancel_booking(
    State(parking_manager): State<GuardedParkingManager>,
    session: Session,
    ApiPath(id): ApiPath<usize>,
) -> ServiceResult<Json<Booking>> {
    Ok(Json(parking_manager.cancel_booking(&session.actor(), id)?))
}

async fn delete_booking(
    State(parking_manager): State<GuardedParkingManager>,
    session: Session,
    ApiPath(id): ApiPath<usize>,
) -> ServiceResult<StatusCode> {
    parking_manager.delete_booking(&session.actor(), id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn booking_routes() -> Router<ServerState> {
    Router::new()
        .route("/create", post(create_booking))
        .route("/user/{user_id}", get(list_user_bookings))
        .route("/owner/{owner_id}", get(list_owner_bookings))
        .route("/cancel/{id}", put(cancel_booking))
        .route("/delete/{id}", delete(delete_booking))
}
