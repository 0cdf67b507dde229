//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When seeded accounts or spots change, update only this file.

// ============================================================================
// Test Accounts
// ============================================================================

/// Driver account (role `user`)
pub const DRIVER_EMAIL: &str = "driver@example.com";

/// Driver account password
pub const DRIVER_PASS: &str = "driverpass123";

/// Owner of the seeded spots (role `owner`)
pub const OWNER_EMAIL: &str = "owner@example.com";

/// Owner account password
pub const OWNER_PASS: &str = "ownerpass123";

/// A second owner with no spots
pub const OTHER_OWNER_EMAIL: &str = "other.owner@example.com";

/// Second owner password
pub const OTHER_OWNER_PASS: &str = "otherpass123";

/// Admin account, created the way the admin CLI does
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Admin account password
pub const ADMIN_PASS: &str = "adminpass123";

// ============================================================================
// Seeded Spots
// ============================================================================

/// Approved spot: 50 per hour, 3 slots, amenities "covered" and "ev"
pub const ACTIVE_SPOT_NAME: &str = "Central Garage";

pub const ACTIVE_SPOT_ADDRESS: &str = "12 Market Street";

pub const ACTIVE_SPOT_PRICE: f64 = 50.0;

pub const ACTIVE_SPOT_SLOTS: u32 = 3;

/// Cheaper approved spot with a single slot and no amenities
pub const SMALL_SPOT_NAME: &str = "Corner Lot";

pub const SMALL_SPOT_PRICE: f64 = 10.0;

/// Spot waiting for approval
pub const PENDING_SPOT_NAME: &str = "Riverside Yard";

// ============================================================================
// Server Settings
// ============================================================================

/// Maximum time to wait for the server to answer on `/`
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval while waiting for the server
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Upload limit configured on test servers
pub const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;

// ============================================================================
// Test Files
// ============================================================================

/// Smallest valid PNG: 1x1 transparent pixel
pub const TEST_PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];
