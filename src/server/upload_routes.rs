//! Image upload for spot listings.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, info};

use super::config::ServerConfig;
use super::error_response::error_response;
use super::session::Session;
use super::state::ServerState;
use crate::error::ServiceError;
use crate::user::Capability;

pub const IMAGE_FIELD_NAME: &str = "image";
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
}

fn multipart_error(err: MultipartError) -> Response {
    debug!("Failed to read multipart body: {}", err);
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        error_response(status, "Image is too large")
    } else {
        ServiceError::validation(format!("Invalid multipart body: {}", err.body_text()))
            .into_response()
    }
}

/// Returns the extension to store the upload with, if the bytes are an image.
fn sniff_image_extension(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .map(|kind| kind.extension())
}

async fn upload_image(
    State(config): State<ServerConfig>,
    session: Session,
    mut multipart: Multipart,
) -> Response {
    if let Err(err) = session.require(Capability::UploadImages) {
        return err.into_response();
    }

    let mut data = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return multipart_error(err),
        };
        if field.name() != Some(IMAGE_FIELD_NAME) {
            continue;
        }
        match field.bytes().await {
            Ok(bytes) => data = Some(bytes),
            Err(err) => return multipart_error(err),
        }
    }

    let data = match data {
        Some(data) if !data.is_empty() => data,
        _ => {
            return ServiceError::validation(format!(
                "Multipart field '{}' is required",
                IMAGE_FIELD_NAME
            ))
            .into_response()
        }
    };

    let Some(extension) = sniff_image_extension(&data) else {
        return ServiceError::validation("Uploaded file is not an image").into_response();
    };

    let file_name = format!("{}.{}", uuid::Uuid::new_v4(), extension);
    if let Err(err) = tokio::fs::create_dir_all(&config.media_path).await {
        return ServiceError::Internal(err.into()).into_response();
    }
    if let Err(err) = tokio::fs::write(config.media_path.join(&file_name), &data).await {
        return ServiceError::Internal(err.into()).into_response();
    }

    info!(
        "User {} uploaded {} ({:#})",
        session.user_id,
        file_name,
        byte_unit::Byte::from(data.len())
    );
    (
        StatusCode::CREATED,
        Json(UploadResponse {
            image_url: format!("{}/{}", UPLOADS_URL_PREFIX, file_name),
        }),
    )
        .into_response()
}

pub fn upload_routes(max_upload_bytes: usize) -> Router<ServerState> {
    Router::new()
        .route("/image", post(upload_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
