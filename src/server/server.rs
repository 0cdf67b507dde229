use anyhow::{Context, Result};
use std::time::Duration;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::services::ServeDir;
use tracing::info;

use super::admin_routes::admin_routes;
use super::auth_routes::auth_routes;
use super::booking_routes::booking_routes;
use super::metrics::metrics_handler;
use super::parking_routes::parking_routes;
use super::session::Session;
use super::state::{GuardedParkingManager, GuardedUserManager, ServerState};
use super::upload_routes::{upload_routes, UPLOADS_URL_PREFIX};
use super::{log_requests, ServerConfig};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

pub fn make_app(
    config: ServerConfig,
    user_manager: GuardedUserManager,
    parking_manager: GuardedParkingManager,
) -> Router {
    let state = ServerState::new(config.clone(), user_manager, parking_manager);

    let api_routes: Router = Router::new()
        .nest("/auth", auth_routes())
        .nest("/parking", parking_routes())
        .nest("/booking", booking_routes())
        .nest("/admin", admin_routes())
        .nest("/upload", upload_routes(config.max_upload_bytes))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .nest("/api", api_routes)
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(&config.media_path))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    user_manager: GuardedUserManager,
    parking_manager: GuardedParkingManager,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, user_manager, parking_manager);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    let main_server = async { axum::serve(listener, app).await };
    let metrics_server = async { axum::serve(metrics_listener, make_metrics_app()).await };
    tokio::try_join!(main_server, metrics_server)?;
    Ok(())
}
