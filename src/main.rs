use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parkinghub_server::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_AUTH_TOKEN_RETENTION_DAYS,
    DEFAULT_LIFECYCLE_INTERVAL_SECS, DEFAULT_MAX_UPLOAD_MB,
};
use parkinghub_server::maintenance::Maintenance;
use parkinghub_server::server::{self, metrics, ServerConfig};
use parkinghub_server::{
    ParkingManager, RequestsLoggingLevel, SqliteParkingStore, SqliteUserStore, UserManager,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding user.db and parking.db.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Directory where uploaded images are stored. Defaults to <db-dir>/uploads.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// Optional TOML file; its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Maximum size of an uploaded image, in MiB.
    #[clap(long, default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: u64,

    /// Seconds between lifecycle sweeps that start and complete bookings.
    #[clap(long, default_value_t = DEFAULT_LIFECYCLE_INTERVAL_SECS)]
    pub lifecycle_interval_secs: u64,

    /// Auth tokens unused for this many days are deleted.
    #[clap(long, default_value_t = DEFAULT_AUTH_TOKEN_RETENTION_DAYS)]
    pub auth_token_retention_days: u64,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            db_dir: args.db_dir.clone(),
            media_path: args.media_path.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            max_upload_mb: args.max_upload_mb,
            lifecycle_interval_secs: args.lifecycle_interval_secs,
            auth_token_retention_days: args.auth_token_retention_days,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    info!("Opening user database at {:?}...", config.user_db_path());
    let user_store = SqliteUserStore::new(config.user_db_path())?;
    info!("Opening parking database at {:?}...", config.parking_db_path());
    let parking_store = SqliteParkingStore::new(config.parking_db_path())?;

    let user_manager = Arc::new(UserManager::new(Arc::new(user_store)));
    let parking_manager = Arc::new(ParkingManager::new(Arc::new(parking_store)));

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::set_spot_counts(&parking_manager.count_spots_by_status()?);

    std::fs::create_dir_all(&config.media_path)
        .with_context(|| format!("Failed to create media directory {:?}", config.media_path))?;

    info!(
        "Lifecycle sweep every {}s, pruning auth tokens unused for {} days",
        config.background.lifecycle_interval_secs, config.background.auth_token_retention_days
    );
    Maintenance::new(
        user_manager.clone(),
        parking_manager.clone(),
        config.background.auth_token_retention_days,
    )
    .spawn(Duration::from_secs(
        config.background.lifecycle_interval_secs,
    ));

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        metrics_port: config.metrics_port,
        max_upload_bytes: config.max_upload_bytes(),
        media_path: config.media_path.clone(),
        frontend_dir_path: config.frontend_dir_path.clone(),
    };

    server::run_server(server_config, user_manager, parking_manager).await
}
