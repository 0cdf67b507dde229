//! End-to-end tests for the booking lifecycle
//!
//! Covers creation with ceiling-hour pricing, slot accounting, cancellation
//! rules and the time-driven reserved -> active -> completed progression.

mod common;

use chrono::{TimeDelta, Utc};
use common::{hours_from_now, TestClient, TestServer, ACTIVE_SPOT_SLOTS};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn available_slots(client: &TestClient, spot_id: usize) -> u64 {
    let spot: Value = client.get_spot(spot_id).await.json().await.unwrap();
    spot["availableSlots"].as_u64().unwrap()
}

fn id_of(value: &Value) -> usize {
    value["id"].as_u64().unwrap() as usize
}

#[tokio::test]
async fn test_booking_charges_started_hours_and_takes_a_slot() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    let spot_id = server.seeded.active_spot_id;

    let start = hours_from_now(24);
    let end = start + TimeDelta::minutes(150);
    let response = driver.create_booking(spot_id, start, end).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let booking: Value = response.json().await.unwrap();
    assert_eq!(booking["totalPrice"], 150.0);
    assert_eq!(booking["status"], "reserved");
    assert_eq!(booking["spotId"], spot_id);
    assert_eq!(booking["userId"], server.seeded.driver_id);

    assert_eq!(
        available_slots(&driver, spot_id).await,
        u64::from(ACTIVE_SPOT_SLOTS) - 1
    );
}

#[tokio::test]
async fn test_short_booking_is_charged_one_hour() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;

    let start = hours_from_now(5);
    let booking: Value = driver
        .create_booking(
            server.seeded.small_spot_id,
            start,
            start + TimeDelta::minutes(1),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(booking["totalPrice"], 10.0);
}

#[tokio::test]
async fn test_booking_requires_session() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .create_booking(server.seeded.active_spot_id, hours_from_now(1), hours_from_now(2))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_rejects_inverted_window() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    let spot_id = server.seeded.active_spot_id;

    let start = hours_from_now(3);
    let response = driver.create_booking(spot_id, start, start).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = driver
        .create_booking(spot_id, start, start - TimeDelta::hours(1))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(
        available_slots(&driver, spot_id).await,
        u64::from(ACTIVE_SPOT_SLOTS)
    );
}

#[tokio::test]
async fn test_booking_unknown_spot() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;

    let response = driver
        .create_booking(4242, hours_from_now(1), hours_from_now(2))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_with_malformed_body() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    let spot_id = server.seeded.active_spot_id;

    let response = driver
        .post_json_raw(
            "/booking/create",
            json!({ "spotId": spot_id, "startTime": "tomorrow morning" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());

    assert_eq!(available_slots(&driver, spot_id).await, ACTIVE_SPOT_SLOTS as u64);
}

#[tokio::test]
async fn test_booking_pending_spot_conflicts() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;

    let response = driver
        .create_booking(
            server.seeded.pending_spot_id,
            hours_from_now(1),
            hours_from_now(2),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_full_spot_rejects_booking_without_side_effects() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    let spot_id = server.seeded.small_spot_id;

    let response = driver
        .create_booking(spot_id, hours_from_now(1), hours_from_now(2))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(available_slots(&driver, spot_id).await, 0);

    let response = driver
        .create_booking(spot_id, hours_from_now(10), hours_from_now(11))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let bookings: Value = driver
        .get_user_bookings(server.seeded.driver_id)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(bookings.as_array().unwrap().len(), 1);
    assert_eq!(available_slots(&driver, spot_id).await, 0);
}

#[tokio::test]
async fn test_concurrent_bookings_never_oversell() {
    let server = TestServer::spawn().await;
    let spot_id = server.seeded.active_spot_id;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;

    let start = hours_from_now(48);
    let end = start + TimeDelta::hours(1);
    let mut requests = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let client = TestClient {
            client: driver.client.clone(),
            base_url: driver.base_url.clone(),
        };
        requests.spawn(async move { client.create_booking(spot_id, start, end).await.status() });
    }

    let mut created = 0;
    let mut conflicts = 0;
    while let Some(status) = requests.join_next().await {
        match status.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("Unexpected status {}", other),
        }
    }
    assert_eq!(created, ACTIVE_SPOT_SLOTS);
    assert_eq!(conflicts, 8 - ACTIVE_SPOT_SLOTS);
    assert_eq!(available_slots(&driver, spot_id).await, 0);
}

#[tokio::test]
async fn test_cancel_restores_slot() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    let spot_id = server.seeded.active_spot_id;

    let booking: Value = driver
        .create_booking(spot_id, hours_from_now(24), hours_from_now(26))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(
        available_slots(&driver, spot_id).await,
        u64::from(ACTIVE_SPOT_SLOTS) - 1
    );

    let response = driver.cancel_booking(id_of(&booking)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled: Value = response.json().await.unwrap();
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["totalPrice"], booking["totalPrice"]);

    assert_eq!(
        available_slots(&driver, spot_id).await,
        u64::from(ACTIVE_SPOT_SLOTS)
    );
}

#[tokio::test]
async fn test_cancel_twice_conflicts_and_keeps_slot_count() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    let spot_id = server.seeded.small_spot_id;

    let booking: Value = driver
        .create_booking(spot_id, hours_from_now(24), hours_from_now(25))
        .await
        .json()
        .await
        .unwrap();
    let booking_id = id_of(&booking);

    assert_eq!(driver.cancel_booking(booking_id).await.status(), StatusCode::OK);
    assert_eq!(
        driver.cancel_booking(booking_id).await.status(),
        StatusCode::CONFLICT
    );
    assert_eq!(available_slots(&driver, spot_id).await, 1);
}

#[tokio::test]
async fn test_cancel_permissions() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    let booking: Value = driver
        .create_booking(
            server.seeded.active_spot_id,
            hours_from_now(24),
            hours_from_now(25),
        )
        .await
        .json()
        .await
        .unwrap();
    let booking_id = id_of(&booking);

    let other_owner = TestClient::authenticated_other_owner(server.base_url.clone()).await;
    assert_eq!(
        other_owner.cancel_booking(booking_id).await.status(),
        StatusCode::FORBIDDEN
    );

    // The spot's owner may cancel bookings on their listing
    let owner = TestClient::authenticated_owner(server.base_url.clone()).await;
    assert_eq!(owner.cancel_booking(booking_id).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cancel_unknown_booking() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;

    assert_eq!(
        driver.cancel_booking(777).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_lifecycle_progression_and_cancel_window() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    let spot_id = server.seeded.active_spot_id;

    let start = hours_from_now(1);
    let end = start + TimeDelta::hours(2);
    let booking: Value = driver
        .create_booking(spot_id, start, end)
        .await
        .json()
        .await
        .unwrap();
    let booking_id = id_of(&booking);

    // Nothing happens before the window opens
    let sweep = server.parking_manager.advance_lifecycle(Utc::now()).unwrap();
    assert_eq!(sweep.activated, 0);

    let sweep = server
        .parking_manager
        .advance_lifecycle(start + TimeDelta::minutes(5))
        .unwrap();
    assert_eq!(sweep.activated, 1);
    assert_eq!(sweep.completed, 0);

    // Once active, the booking can no longer be cancelled
    assert_eq!(
        driver.cancel_booking(booking_id).await.status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        available_slots(&driver, spot_id).await,
        u64::from(ACTIVE_SPOT_SLOTS) - 1
    );

    let sweep = server.parking_manager.advance_lifecycle(end).unwrap();
    assert_eq!(sweep.completed, 1);

    let bookings: Value = driver
        .get_user_bookings(server.seeded.driver_id)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(bookings[0]["status"], "completed");
    assert_eq!(
        available_slots(&driver, spot_id).await,
        u64::from(ACTIVE_SPOT_SLOTS)
    );
}

#[tokio::test]
async fn test_delete_reserved_booking_restores_slot() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    let spot_id = server.seeded.small_spot_id;

    let booking: Value = driver
        .create_booking(spot_id, hours_from_now(3), hours_from_now(4))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(available_slots(&driver, spot_id).await, 0);

    let owner = TestClient::authenticated_owner(server.base_url.clone()).await;
    assert_eq!(
        owner.delete_booking(id_of(&booking)).await.status(),
        StatusCode::FORBIDDEN
    );

    let response = driver.delete_booking(id_of(&booking)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(available_slots(&driver, spot_id).await, 1);

    let bookings: Value = driver
        .get_user_bookings(server.seeded.driver_id)
        .await
        .json()
        .await
        .unwrap();
    assert!(bookings.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_cancelled_booking_keeps_slot_count() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    let spot_id = server.seeded.small_spot_id;

    let booking: Value = driver
        .create_booking(spot_id, hours_from_now(3), hours_from_now(4))
        .await
        .json()
        .await
        .unwrap();
    driver.cancel_booking(id_of(&booking)).await;

    assert_eq!(
        driver.delete_booking(id_of(&booking)).await.status(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(available_slots(&driver, spot_id).await, 1);
}

#[tokio::test]
async fn test_user_bookings_are_private() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    driver
        .create_booking(
            server.seeded.active_spot_id,
            hours_from_now(2),
            hours_from_now(3),
        )
        .await;

    let owner = TestClient::authenticated_owner(server.base_url.clone()).await;
    assert_eq!(
        owner.get_user_bookings(server.seeded.driver_id).await.status(),
        StatusCode::FORBIDDEN
    );

    let admin = TestClient::authenticated_admin(server.base_url.clone()).await;
    let bookings: Value = admin
        .get_user_bookings(server.seeded.driver_id)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(bookings.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_owner_sees_bookings_on_their_spots() {
    let server = TestServer::spawn().await;
    let driver = TestClient::authenticated_driver(server.base_url.clone()).await;
    driver
        .create_booking(
            server.seeded.active_spot_id,
            hours_from_now(2),
            hours_from_now(3),
        )
        .await;
    driver
        .create_booking(
            server.seeded.small_spot_id,
            hours_from_now(2),
            hours_from_now(3),
        )
        .await;

    let owner = TestClient::authenticated_owner(server.base_url.clone()).await;
    let response = owner.get_owner_bookings(server.seeded.owner_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bookings: Value = response.json().await.unwrap();
    assert_eq!(bookings.as_array().unwrap().len(), 2);

    let other_owner = TestClient::authenticated_other_owner(server.base_url.clone()).await;
    let bookings: Value = other_owner
        .get_owner_bookings(server.seeded.other_owner_id)
        .await
        .json()
        .await
        .unwrap();
    assert!(bookings.as_array().unwrap().is_empty());

    assert_eq!(
        other_owner
            .get_owner_bookings(server.seeded.owner_id)
            .await
            .status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        driver.get_owner_bookings(server.seeded.driver_id).await.status(),
        StatusCode::FORBIDDEN
    );
}
