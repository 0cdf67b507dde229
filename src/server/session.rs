use super::error_response::error_response;
use super::state::ServerState;
use crate::error::{ServiceError, ServiceResult};
use crate::parking::Actor;
use crate::user::auth::AuthTokenValue;
use crate::user::{Capability, Role};

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: usize,
    pub token: String,
    pub role: Role,
}

impl Session {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }

    /// Returns the acting account if its role grants `capability`.
    pub fn require(&self, capability: Capability) -> ServiceResult<Actor> {
        let actor = self.actor();
        actor.require(capability)?;
        Ok(actor)
    }
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";

pub enum SessionExtractionError {
    Unauthenticated,
    InternalError,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::Unauthenticated => {
                error_response(StatusCode::UNAUTHORIZED, ServiceError::Unauthenticated.to_string())
            }
            SessionExtractionError::InternalError => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

async fn extract_session_token_from_cookies(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Option<String> {
    let jar = CookieJar::from_request_parts(parts, ctx).await.ok()?;
    jar.get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(|s| s.to_string())
}

fn extract_session_token_from_headers(parts: &Parts) -> Option<String> {
    let raw = parts.headers.get(HEADER_SESSION_TOKEN_KEY)?.to_str().ok()?;
    let token = raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).trim();
    (!token.is_empty()).then(|| token.to_string())
}

async fn extract_session_from_request_parts(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Result<Option<Session>, SessionExtractionError> {
    let token = match extract_session_token_from_headers(parts) {
        Some(token) => token,
        None => match extract_session_token_from_cookies(parts, ctx).await {
            Some(token) => token,
            None => {
                debug!("No token in headers nor cookies.");
                return Ok(None);
            }
        },
    };

    let user_manager = &ctx.user_manager;
    let auth_token_value = AuthTokenValue(token);
    let auth_token = match user_manager.get_auth_token(&auth_token_value) {
        Ok(Some(token)) => token,
        Ok(None) => {
            debug!("Auth token not found in database");
            return Ok(None);
        }
        Err(e) => {
            debug!("Failed to get auth token from database: {}", e);
            return Err(SessionExtractionError::InternalError);
        }
    };

    if let Err(e) = user_manager.update_auth_token_last_used(&auth_token_value) {
        debug!("Failed to update auth token last_used timestamp: {}", e);
    }

    let account = match user_manager.get_account(auth_token.user_id) {
        Ok(Some(account)) => account,
        Ok(None) => {
            debug!("Token of deleted user_id={}", auth_token.user_id);
            return Ok(None);
        }
        Err(e) => {
            debug!("Failed to load account {}: {}", auth_token.user_id, e);
            return Err(SessionExtractionError::InternalError);
        }
    };

    Ok(Some(Session {
        user_id: account.id,
        token: auth_token.value.0,
        role: account.role,
    }))
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
            .await?
            .ok_or(SessionExtractionError::Unauthenticated)
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(HEADER_SESSION_TOKEN_KEY, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn strips_bearer_prefix() {
        assert_eq!(
            extract_session_token_from_headers(&parts_with_header("Bearer abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_session_token_from_headers(&parts_with_header("abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_session_token_from_headers(&parts_with_header("Bearer ")),
            None
        );
    }

    #[test]
    fn session_require_checks_role() {
        let session = Session {
            user_id: 3,
            token: "t".to_string(),
            role: Role::Owner,
        };
        assert_eq!(
            session.require(Capability::ManageOwnSpots).unwrap(),
            Actor::new(3, Role::Owner)
        );
        assert!(session.require(Capability::ReviewSpots).is_err());
    }
}
