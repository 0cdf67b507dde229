use axum::extract::FromRef;

use crate::parking::ParkingManager;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedUserManager = Arc<UserManager>;
pub type GuardedParkingManager = Arc<ParkingManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub user_manager: GuardedUserManager,
    pub parking_manager: GuardedParkingManager,
    pub hash: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        user_manager: GuardedUserManager,
        parking_manager: GuardedParkingManager,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            user_manager,
            parking_manager,
            hash: env!("PARKINGHUB_GIT_HASH").to_owned(),
        }
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedParkingManager {
    fn from_ref(input: &ServerState) -> Self {
        input.parking_manager.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
