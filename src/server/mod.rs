mod admin_routes;
mod auth_routes;
mod booking_routes;
pub mod config;
mod error_response;
mod extract;
mod http_layers;
pub mod metrics;
mod parking_routes;
pub mod server;
pub mod session;
pub mod state;
mod upload_routes;

pub use config::ServerConfig;
pub use error_response::ErrorBody;
pub use http_layers::*;
pub use server::{make_app, make_metrics_app, run_server};
pub use upload_routes::{UploadResponse, IMAGE_FIELD_NAME, UPLOADS_URL_PREFIX};
