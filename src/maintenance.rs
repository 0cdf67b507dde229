//! Periodic upkeep run by the server: advancing bookings through their
//! lifecycle, pruning stale auth tokens and refreshing the spot gauges.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::parking::{LifecycleSweep, ParkingManager};
use crate::server::metrics::{record_lifecycle_sweep, set_spot_counts};
use crate::user::UserManager;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub sweep: LifecycleSweep,
    pub pruned_tokens: usize,
}

pub struct Maintenance {
    user_manager: Arc<UserManager>,
    parking_manager: Arc<ParkingManager>,
    auth_token_retention_days: u64,
}

impl Maintenance {
    pub fn new(
        user_manager: Arc<UserManager>,
        parking_manager: Arc<ParkingManager>,
        auth_token_retention_days: u64,
    ) -> Self {
        Self {
            user_manager,
            parking_manager,
            auth_token_retention_days,
        }
    }

    pub fn run_once(&self, now: DateTime<Utc>) -> Result<MaintenanceReport> {
        let sweep = self.parking_manager.advance_lifecycle(now)?;
        record_lifecycle_sweep(sweep.activated, sweep.completed);

        let pruned_tokens = self
            .user_manager
            .prune_unused_auth_tokens(self.auth_token_retention_days)?;

        set_spot_counts(&self.parking_manager.count_spots_by_status()?);

        Ok(MaintenanceReport {
            sweep,
            pruned_tokens,
        })
    }

    /// Runs [`Maintenance::run_once`] every `interval`, starting one interval from now.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                match self.run_once(Utc::now()) {
                    Ok(report) => {
                        if report.pruned_tokens > 0 {
                            info!("Pruned {} unused auth tokens", report.pruned_tokens);
                        }
                    }
                    Err(e) => {
                        error!("Maintenance pass failed: {:#}", e);
                    }
                }
            }
        })
    }
}
