//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own databases and media directory.

use super::constants::*;
use super::fixtures::{seed, SeededData};
use parkinghub_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use parkinghub_server::{ParkingManager, SqliteParkingStore, SqliteUserStore, UserManager};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// API root, `base_url` + `/api`
    pub api_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Ids of the seeded accounts and spots
    pub seeded: SeededData,

    /// Direct access to the managers the server runs on
    pub user_manager: Arc<UserManager>,
    pub parking_manager: Arc<ParkingManager>,

    /// Where uploads land
    pub media_path: PathBuf,

    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new seeded test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the databases cannot be created, the port cannot be bound,
    /// or the server does not become ready within the timeout.
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let media_path = temp_db_dir.path().join("uploads");

        let user_store = SqliteUserStore::new(temp_db_dir.path().join("user.db"))
            .expect("Failed to open user store");
        let parking_store = SqliteParkingStore::new(temp_db_dir.path().join("parking.db"))
            .expect("Failed to open parking store");
        let user_manager = Arc::new(UserManager::new(Arc::new(user_store)));
        let parking_manager = Arc::new(ParkingManager::new(Arc::new(parking_store)));

        let seeded = seed(&user_manager, &parking_manager).expect("Failed to seed test data");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            metrics_port: 0,
            media_path: media_path.clone(),
            max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
            frontend_dir_path: None,
        };

        let app = make_app(config, user_manager.clone(), parking_manager.clone());

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            api_url: format!("{}/api", base_url),
            base_url,
            port,
            seeded,
            user_manager,
            parking_manager,
            media_path,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling `/`
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
