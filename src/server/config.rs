use super::RequestsLoggingLevel;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Where uploaded images are written and served from.
    pub media_path: PathBuf,
    pub max_upload_bytes: usize,
    pub frontend_dir_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            metrics_port: 9091,
            media_path: PathBuf::from("uploads"),
            max_upload_bytes: 5 * 1024 * 1024,
            frontend_dir_path: None,
        }
    }
}
