//! Admin-only routes: account management, spot approval and analytics.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use tracing::{error, info};

use super::extract::ApiPath;
use super::session::Session;
use super::state::ServerState;
use crate::error::{ServiceError, ServiceResult};
use crate::parking::{AdminAnalytics, ParkingSpot};
use crate::user::{Account, Capability};

async fn list_users(
    State(state): State<ServerState>,
    session: Session,
) -> ServiceResult<Json<Vec<Account>>> {
    session.require(Capability::ManageUsers)?;
    Ok(Json(state.user_manager.list_accounts()?))
}

async fn approve_spot(
    State(state): State<ServerState>,
    session: Session,
    ApiPath(id): ApiPath<usize>,
) -> ServiceResult<Json<ParkingSpot>> {
    Ok(Json(
        state.parking_manager.approve_spot(&session.actor(), id)?,
    ))
}

async fn get_analytics(
    State(state): State<ServerState>,
    session: Session,
) -> ServiceResult<Json<AdminAnalytics>> {
    let actor = session.require(Capability::ViewAnalytics)?;
    let users_by_role = state.user_manager.count_accounts_by_role()?;
    Ok(Json(state.parking_manager.analytics(&actor, users_by_role)?))
}

/// Removes an account together with its bookings and listings.
async fn delete_user(
    State(state): State<ServerState>,
    session: Session,
    ApiPath(id): ApiPath<usize>,
) -> ServiceResult<StatusCode> {
    let actor = session.require(Capability::ManageUsers)?;
    if id == actor.user_id {
        return Err(ServiceError::forbidden("Admins cannot delete their own account"));
    }
    if state.user_manager.get_account(id)?.is_none() {
        return Err(ServiceError::NotFound("Account"));
    }
    state.parking_manager.purge_account(id)?;
    if let Err(e) = state.user_manager.delete_account(id) {
        error!(
            "Purged parking data of user {} but failed to delete the account: {}",
            id, e
        );
        return Err(e);
    }
    info!("Admin {} deleted user {}", actor.user_id, id);
    Ok(StatusCode::NO_CONTENT)
}

pub fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/spot/approve/{id}", put(approve_spot))
        .route("/analytics", get(get_analytics))
        .route("/user/{id}", delete(delete_user))
}
