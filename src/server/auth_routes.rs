//! Sign-up, login and session routes.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::extract::ApiJson;
use super::metrics::record_login_attempt;
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::state::{GuardedUserManager, ServerState};
use crate::error::{ServiceError, ServiceResult};
use crate::user::{Account, AuthTokenValue, NewAccount};

#[derive(Deserialize)]
struct LoginBody {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginBody")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
pub struct LoginSuccessResponse {
    pub token: String,
    pub user: Account,
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_TOKEN_KEY, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
        .path("/")
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .same_site(SameSite::Lax)
        .build()
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    ApiJson(body): ApiJson<LoginBody>,
) -> ServiceResult<Response> {
    debug!("login() called with {:?}", body);
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ServiceError::validation("Email and password are required"));
    }

    let start = Instant::now();
    let result = user_manager.login(&body.email, &body.password);
    let outcome = match &result {
        Ok(_) => "success",
        Err(ServiceError::InvalidCredentials) => "failure",
        Err(_) => "error",
    };
    record_login_attempt(outcome, start.elapsed());

    let (account, token) = result?;
    info!("User {} logged in", account.id);
    let cookie = session_cookie(token.value.0.clone());
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(LoginSuccessResponse {
            token: token.value.0,
            user: account,
        }),
    )
        .into_response())
}

async fn register(
    State(user_manager): State<GuardedUserManager>,
    ApiJson(body): ApiJson<NewAccount>,
) -> ServiceResult<impl IntoResponse> {
    let account = user_manager.register(body)?;
    info!("Registered user {} as {}", account.id, account.role);
    Ok((StatusCode::CREATED, Json(account)))
}

async fn logout(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
) -> ServiceResult<impl IntoResponse> {
    user_manager.delete_auth_token(session.user_id, &AuthTokenValue(session.token))?;
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, expired_session_cookie().to_string())],
    ))
}

async fn get_session(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
) -> ServiceResult<Json<Account>> {
    let account = user_manager
        .get_account(session.user_id)?
        .ok_or(ServiceError::Unauthenticated)?;
    Ok(Json(account))
}

pub fn auth_routes() -> Router<ServerState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", get(logout))
        .route("/session", get(get_session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_cookie_is_in_the_past() {
        let cookie = expired_session_cookie();
        assert_eq!(cookie.value(), "");
        let expires = cookie.expires_datetime().unwrap();
        assert!(expires < time::OffsetDateTime::now_utc());
    }

    #[test]
    fn session_cookie_is_http_only() {
        let rendered = session_cookie("abc".to_string()).to_string();
        assert!(rendered.starts_with("session_token=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Path=/"));
    }

    #[test]
    fn login_body_debug_hides_password() {
        let body = LoginBody {
            email: "a@b.io".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(!format!("{:?}", body).contains("hunter22"));
    }
}
