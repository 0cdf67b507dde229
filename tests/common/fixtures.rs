//! Seeded accounts and spots for end-to-end tests
//!
//! Everything is created through the managers, so the data goes through
//! the same validation as production traffic.

use super::constants::*;
use anyhow::Result;
use parkinghub_server::parking::{Actor, NewSpot};
use parkinghub_server::user::{NewAccount, Role};
use parkinghub_server::{ParkingManager, UserManager};
use std::collections::BTreeSet;

/// Ids of the rows created by [`seed`].
#[derive(Debug, Clone, Copy)]
pub struct SeededData {
    pub driver_id: usize,
    pub owner_id: usize,
    pub other_owner_id: usize,
    pub admin_id: usize,
    /// Approved, 50 per hour, 3 slots
    pub active_spot_id: usize,
    /// Approved, 10 per hour, 1 slot
    pub small_spot_id: usize,
    /// Still pending approval
    pub pending_spot_id: usize,
}

fn create_account(
    user_manager: &UserManager,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<usize> {
    let account = user_manager.create_account(NewAccount {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role,
        phone: None,
    })?;
    Ok(account.id)
}

pub fn seed(user_manager: &UserManager, parking_manager: &ParkingManager) -> Result<SeededData> {
    let driver_id = create_account(user_manager, "Dana Driver", DRIVER_EMAIL, DRIVER_PASS, Role::User)?;
    let owner_id = create_account(user_manager, "Omar Owner", OWNER_EMAIL, OWNER_PASS, Role::Owner)?;
    let other_owner_id = create_account(
        user_manager,
        "Olga Owner",
        OTHER_OWNER_EMAIL,
        OTHER_OWNER_PASS,
        Role::Owner,
    )?;
    let admin_id = create_account(user_manager, "Ada Admin", ADMIN_EMAIL, ADMIN_PASS, Role::Admin)?;

    let owner = Actor::new(owner_id, Role::Owner);
    let admin = Actor::new(admin_id, Role::Admin);

    let active_spot = parking_manager.add_spot(
        &owner,
        NewSpot {
            name: ACTIVE_SPOT_NAME.to_string(),
            address: ACTIVE_SPOT_ADDRESS.to_string(),
            description: "Underground, staffed".to_string(),
            price_per_hour: ACTIVE_SPOT_PRICE,
            total_slots: ACTIVE_SPOT_SLOTS,
            lat: Some(45.46),
            lng: Some(9.19),
            amenities: BTreeSet::from(["covered".to_string(), "ev".to_string()]),
            image_url: None,
        },
    )?;
    parking_manager.approve_spot(&admin, active_spot.id)?;

    let small_spot = parking_manager.add_spot(
        &owner,
        NewSpot {
            name: SMALL_SPOT_NAME.to_string(),
            address: "3 Elm Avenue".to_string(),
            price_per_hour: SMALL_SPOT_PRICE,
            total_slots: 1,
            ..NewSpot::default()
        },
    )?;
    parking_manager.approve_spot(&admin, small_spot.id)?;

    let pending_spot = parking_manager.add_spot(
        &owner,
        NewSpot {
            name: PENDING_SPOT_NAME.to_string(),
            address: "80 River Road".to_string(),
            price_per_hour: 20.0,
            total_slots: 5,
            ..NewSpot::default()
        },
    )?;

    Ok(SeededData {
        driver_id,
        owner_id,
        other_owner_id,
        admin_id,
        active_spot_id: active_spot.id,
        small_spot_id: small_spot.id,
        pending_spot_id: pending_spot.id,
    })
}
