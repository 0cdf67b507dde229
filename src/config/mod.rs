mod file_config;

pub use file_config::{BackgroundConfig, FileConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_MAX_UPLOAD_MB: u64 = 5;
pub const DEFAULT_LIFECYCLE_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_AUTH_TOKEN_RETENTION_DAYS: u64 = 30;

/// CLI arguments that can be overridden by the TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub media_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub max_upload_mb: u64,
    pub lifecycle_interval_secs: u64,
    pub auth_token_retention_days: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            media_path: None,
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::default(),
            frontend_dir_path: None,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            lifecycle_interval_secs: DEFAULT_LIFECYCLE_INTERVAL_SECS,
            auth_token_retention_days: DEFAULT_AUTH_TOKEN_RETENTION_DAYS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub media_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub max_upload_mb: u64,
    pub background: BackgroundSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundSettings {
    pub lifecycle_interval_secs: u64,
    pub auth_token_retention_days: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let media_path = file
            .media_path
            .map(PathBuf::from)
            .or_else(|| cli.media_path.clone())
            .unwrap_or_else(|| db_dir.join("uploads"));

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let max_upload_mb = file.max_upload_mb.unwrap_or(cli.max_upload_mb);
        if max_upload_mb == 0 {
            bail!("max_upload_mb must be at least 1");
        }

        let background_file = file.background.unwrap_or_default();
        let background = BackgroundSettings {
            lifecycle_interval_secs: background_file
                .lifecycle_interval_secs
                .unwrap_or(cli.lifecycle_interval_secs),
            auth_token_retention_days: background_file
                .auth_token_retention_days
                .unwrap_or(cli.auth_token_retention_days),
        };
        if background.lifecycle_interval_secs == 0 {
            bail!("lifecycle_interval_secs must be at least 1");
        }

        Ok(Self {
            db_dir,
            media_path,
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            max_upload_mb,
            background,
        })
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }

    pub fn parking_db_path(&self) -> PathBuf {
        self.db_dir.join("parking.db")
    }

    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize) * 1024 * 1024
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
