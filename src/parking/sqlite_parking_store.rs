use super::parking_store::*;
use super::*;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned_db, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{
    params,
    types::{Type, Value},
    Connection, OptionalExtension, Row,
};
use std::{
    collections::BTreeSet,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{debug, info};

/// V 0
const SPOT_TABLE_V_0: Table = Table {
    name: "spot",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("owner_id", &SqlType::Integer, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("address", &SqlType::Text, non_null = true),
        sqlite_column!(
            "description",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!("price_per_hour", &SqlType::Real, non_null = true),
        sqlite_column!("total_slots", &SqlType::Integer, non_null = true),
        sqlite_column!("available_slots", &SqlType::Integer, non_null = true),
        sqlite_column!("lat", &SqlType::Real),
        sqlite_column!("lng", &SqlType::Real),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'pending'")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[
        ("idx_spot_owner_id", "owner_id"),
        ("idx_spot_status", "status"),
    ],
};
const SPOT_AMENITY_TABLE_V_0: Table = Table {
    name: "spot_amenity",
    columns: &[
        sqlite_column!(
            "spot_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "spot",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("amenity", &SqlType::Text, non_null = true),
    ],
    unique_constraints: &[&["spot_id", "amenity"]],
    indices: &[("idx_spot_amenity_spot_id", "spot_id")],
};
const BOOKING_TABLE_V_0: Table = Table {
    name: "booking",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "spot_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "spot",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("start_time", &SqlType::Integer, non_null = true),
        sqlite_column!("end_time", &SqlType::Integer, non_null = true),
        sqlite_column!("total_price", &SqlType::Real, non_null = true),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'reserved'")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[
        ("idx_booking_user_id", "user_id"),
        ("idx_booking_spot_id", "spot_id"),
        ("idx_booking_status", "status"),
    ],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[SPOT_TABLE_V_0, SPOT_AMENITY_TABLE_V_0, BOOKING_TABLE_V_0],
    migration: None,
}];

const SPOT_COLUMNS: &str = "id, owner_id, name, address, description, price_per_hour, \
     total_slots, available_slots, lat, lng, image_url, status, created";
const BOOKING_COLUMNS: &str =
    "id, user_id, spot_id, start_time, end_time, total_price, status, created";

fn timestamp_from_column(row: &Row, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let seconds: i64 = row.get(index)?;
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Integer,
            format!("Invalid timestamp {}", seconds).into(),
        )
    })
}

fn enum_from_column<T>(
    row: &Row,
    index: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(index)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("Invalid status {}", raw).into(),
        )
    })
}

/// Reads a spot row, amenities are filled in by [`load_amenities`].
fn spot_from_row(row: &Row) -> rusqlite::Result<ParkingSpot> {
    Ok(ParkingSpot {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        description: row.get(4)?,
        price_per_hour: row.get(5)?,
        total_slots: row.get(6)?,
        available_slots: row.get(7)?,
        lat: row.get(8)?,
        lng: row.get(9)?,
        amenities: BTreeSet::new(),
        image_url: row.get(10)?,
        status: enum_from_column(row, 11, SpotStatus::from_str)?,
        created_at: timestamp_from_column(row, 12)?,
    })
}

fn booking_from_row(row: &Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        spot_id: row.get(2)?,
        start_time: timestamp_from_column(row, 3)?,
        end_time: timestamp_from_column(row, 4)?,
        total_price: row.get(5)?,
        status: enum_from_column(row, 6, BookingStatus::from_str)?,
        created_at: timestamp_from_column(row, 7)?,
    })
}

fn normalize_amenities(amenities: &BTreeSet<String>) -> BTreeSet<String> {
    amenities
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

fn load_amenities(conn: &Connection, spot: &mut ParkingSpot) -> Result<()> {
    let mut stmt =
        conn.prepare_cached("SELECT amenity FROM spot_amenity WHERE spot_id = ?1")?;
    spot.amenities = stmt
        .query_map(params![spot.id], |row| row.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(())
}

fn replace_amenities(conn: &Connection, spot_id: usize, amenities: &BTreeSet<String>) -> Result<()> {
    conn.execute("DELETE FROM spot_amenity WHERE spot_id = ?1", params![spot_id])?;
    let mut stmt =
        conn.prepare_cached("INSERT INTO spot_amenity (spot_id, amenity) VALUES (?1, ?2)")?;
    for amenity in normalize_amenities(amenities) {
        stmt.execute(params![spot_id, amenity])?;
    }
    Ok(())
}

fn read_spot(conn: &Connection, spot_id: usize) -> Result<Option<ParkingSpot>> {
    let spot = conn
        .query_row(
            &format!("SELECT {} FROM spot WHERE id = ?1", SPOT_COLUMNS),
            params![spot_id],
            spot_from_row,
        )
        .optional()?;
    let Some(mut spot) = spot else {
        return Ok(None);
    };
    load_amenities(conn, &mut spot)?;
    Ok(Some(spot))
}

fn read_booking(conn: &Connection, booking_id: usize) -> Result<Option<Booking>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM booking WHERE id = ?1", BOOKING_COLUMNS),
            params![booking_id],
            booking_from_row,
        )
        .optional()?)
}

fn count_open_bookings(conn: &Connection, spot_id: usize) -> Result<usize> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM booking WHERE spot_id = ?1 AND status IN ('reserved', 'active')",
        params![spot_id],
        |row| row.get(0),
    )?)
}

/// Gives one slot back to the spot, never exceeding its capacity.
fn release_slot(conn: &Connection, spot_id: usize) -> Result<()> {
    conn.execute(
        "UPDATE spot SET available_slots = MIN(total_slots, available_slots + 1) WHERE id = ?1",
        params![spot_id],
    )?;
    Ok(())
}

#[derive(Clone)]
pub struct SqliteParkingStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteParkingStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_db(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteParkingStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Parking store connection lock poisoned"))
    }

    fn query_bookings(
        conn: &Connection,
        sql: &str,
        param: usize,
    ) -> Result<Vec<Booking>> {
        let mut stmt = conn.prepare(sql)?;
        let bookings = stmt
            .query_map(params![param], booking_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bookings)
    }
}

impl SpotStore for SqliteParkingStore {
    fn insert_spot(&self, owner_id: usize, new_spot: &NewSpot) -> Result<ParkingSpot> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO spot (owner_id, name, address, description, price_per_hour,
                total_slots, available_slots, lat, lng, image_url, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7, ?8, ?9, ?10)",
            params![
                owner_id,
                new_spot.name.trim(),
                new_spot.address.trim(),
                new_spot.description.trim(),
                new_spot.price_per_hour,
                new_spot.total_slots,
                new_spot.lat,
                new_spot.lng,
                new_spot.image_url,
                SpotStatus::Pending.as_str(),
            ],
        )
        .with_context(|| format!("Failed to insert spot {}", new_spot.name))?;
        let spot_id = tx.last_insert_rowid() as usize;
        replace_amenities(&tx, spot_id, &new_spot.amenities)?;
        let spot = read_spot(&tx, spot_id)?
            .with_context(|| format!("Spot {} vanished after insert", spot_id))?;
        tx.commit()?;
        Ok(spot)
    }

    fn get_spot(&self, spot_id: usize) -> Result<Option<ParkingSpot>> {
        let conn = self.lock()?;
        read_spot(&conn, spot_id)
    }

    fn list_spots(&self, scope: SpotScope, query: &SpotQuery) -> Result<Vec<ParkingSpot>> {
        let conn = self.lock()?;
        let (filter, param): (&str, Option<Value>) = match scope {
            SpotScope::All => ("1 = 1", None),
            SpotScope::WithStatus(status) => {
                ("status = ?1", Some(Value::Text(status.as_str().to_string())))
            }
            SpotScope::OwnedBy(owner_id) => ("owner_id = ?1", Some(Value::Integer(owner_id as i64))),
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM spot WHERE {} ORDER BY created DESC, id DESC",
            SPOT_COLUMNS, filter
        ))?;
        let rows = match param {
            Some(param) => stmt.query_map(params![param], spot_from_row)?,
            None => stmt.query_map([], spot_from_row)?,
        };
        let mut spots = Vec::new();
        for spot in rows {
            let mut spot = spot?;
            load_amenities(&conn, &mut spot)?;
            if query.matches(&spot) {
                spots.push(spot);
            }
        }
        Ok(spots)
    }

    fn update_spot(
        &self,
        spot_id: usize,
        changes: &SpotChanges,
        transition: Option<SpotTransition>,
    ) -> Result<SpotUpdateOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let Some(current) = read_spot(&tx, spot_id)? else {
            return Ok(SpotUpdateOutcome::NotFound);
        };
        if let Some(transition) = transition {
            if current.status != transition.from {
                return Ok(SpotUpdateOutcome::StatusMismatch(current.status));
            }
        }
        let status = transition.map_or(current.status, |t| t.to);

        let in_use = current.slots_in_use();
        let total_slots = changes.total_slots.unwrap_or(current.total_slots);
        if total_slots < in_use {
            return Ok(SpotUpdateOutcome::CapacityBelowUsage { in_use });
        }

        tx.execute(
            "UPDATE spot SET name = ?1, address = ?2, description = ?3, price_per_hour = ?4,
                total_slots = ?5, available_slots = ?6, lat = ?7, lng = ?8, image_url = ?9,
                status = ?10
             WHERE id = ?11",
            params![
                changes
                    .name
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or(current.name.as_str()),
                changes
                    .address
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or(current.address.as_str()),
                changes
                    .description
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or(current.description.as_str()),
                changes.price_per_hour.unwrap_or(current.price_per_hour),
                total_slots,
                total_slots - in_use,
                changes.lat.or(current.lat),
                changes.lng.or(current.lng),
                changes.image_url.as_ref().or(current.image_url.as_ref()),
                status.as_str(),
                spot_id,
            ],
        )?;
        if let Some(amenities) = &changes.amenities {
            replace_amenities(&tx, spot_id, amenities)?;
        }
        let updated = read_spot(&tx, spot_id)?
            .with_context(|| format!("Spot {} vanished during update", spot_id))?;
        tx.commit()?;
        Ok(SpotUpdateOutcome::Updated(updated))
    }

    fn set_spot_status(
        &self,
        spot_id: usize,
        transition: SpotTransition,
    ) -> Result<SpotUpdateOutcome> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE spot SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![transition.to.as_str(), spot_id, transition.from.as_str()],
        )?;
        let Some(spot) = read_spot(&conn, spot_id)? else {
            return Ok(SpotUpdateOutcome::NotFound);
        };
        if updated == 0 {
            return Ok(SpotUpdateOutcome::StatusMismatch(spot.status));
        }
        Ok(SpotUpdateOutcome::Updated(spot))
    }

    fn delete_spot(&self, spot_id: usize) -> Result<SpotDeleteOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let exists = tx
            .query_row("SELECT 1 FROM spot WHERE id = ?1", params![spot_id], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Ok(SpotDeleteOutcome::NotFound);
        }
        let open = count_open_bookings(&tx, spot_id)?;
        if open > 0 {
            return Ok(SpotDeleteOutcome::OpenBookings(open));
        }
        let deleted = tx.execute("DELETE FROM spot WHERE id = ?1", params![spot_id])?;
        tx.commit()?;
        debug!("delete_spot({}) removed {} rows", spot_id, deleted);
        Ok(SpotDeleteOutcome::Deleted)
    }

    fn count_spots_by_status(&self) -> Result<SpotsByStatus> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM spot GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, usize>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = SpotsByStatus::default();
        for (status, count) in rows {
            match SpotStatus::from_str(&status) {
                Some(status) => counts.add(status, count),
                None => debug!("Ignoring {} spots with unknown status {}", count, status),
            }
        }
        Ok(counts)
    }
}

impl BookingStore for SqliteParkingStore {
    fn create_booking(
        &self,
        user_id: usize,
        request: &BookingRequest,
    ) -> Result<BookingOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let Some(spot) = read_spot(&tx, request.spot_id)? else {
            return Ok(BookingOutcome::SpotNotFound);
        };
        if spot.status != SpotStatus::Active {
            return Ok(BookingOutcome::SpotNotActive);
        }
        if !spot.is_bookable() {
            return Ok(BookingOutcome::NoAvailability);
        }
        let total_price =
            match pricing::booking_price(spot.price_per_hour, request.start_time, request.end_time)
            {
                Ok(price) => price,
                Err(e) => return Ok(BookingOutcome::InvalidWindow(e)),
            };

        let taken = tx.execute(
            "UPDATE spot SET available_slots = available_slots - 1
             WHERE id = ?1 AND status = 'active' AND available_slots > 0",
            params![request.spot_id],
        )?;
        if taken == 0 {
            return Ok(BookingOutcome::NoAvailability);
        }

        tx.execute(
            "INSERT INTO booking (user_id, spot_id, start_time, end_time, total_price, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                request.spot_id,
                request.start_time.timestamp(),
                request.end_time.timestamp(),
                total_price,
                BookingStatus::Reserved.as_str(),
            ],
        )
        .with_context(|| format!("Failed to insert booking for spot {}", request.spot_id))?;
        let booking_id = tx.last_insert_rowid() as usize;
        let booking = read_booking(&tx, booking_id)?
            .with_context(|| format!("Booking {} vanished after insert", booking_id))?;
        tx.commit()?;
        Ok(BookingOutcome::Created(booking))
    }

    fn get_booking(&self, booking_id: usize) -> Result<Option<Booking>> {
        let conn = self.lock()?;
        read_booking(&conn, booking_id)
    }

    fn list_user_bookings(&self, user_id: usize) -> Result<Vec<Booking>> {
        let conn = self.lock()?;
        Self::query_bookings(
            &conn,
            &format!(
                "SELECT {} FROM booking WHERE user_id = ?1 ORDER BY start_time DESC, id DESC",
                BOOKING_COLUMNS
            ),
            user_id,
        )
    }

    fn list_owner_bookings(&self, owner_id: usize) -> Result<Vec<Booking>> {
        let conn = self.lock()?;
        let columns = BOOKING_COLUMNS
            .split(", ")
            .map(|c| format!("b.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        Self::query_bookings(
            &conn,
            &format!(
                "SELECT {} FROM booking b JOIN spot s ON s.id = b.spot_id
                 WHERE s.owner_id = ?1 ORDER BY b.start_time DESC, b.id DESC",
                columns
            ),
            owner_id,
        )
    }

    fn transition_booking(
        &self,
        booking_id: usize,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<BookingTransitionOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let Some(current) = read_booking(&tx, booking_id)? else {
            return Ok(BookingTransitionOutcome::NotFound);
        };
        if current.status != from {
            return Ok(BookingTransitionOutcome::StatusMismatch(current.status));
        }

        tx.execute(
            "UPDATE booking SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![to.as_str(), booking_id, from.as_str()],
        )?;
        if from.holds_slot() && !to.holds_slot() {
            release_slot(&tx, current.spot_id)?;
        }
        let updated = read_booking(&tx, booking_id)?
            .with_context(|| format!("Booking {} vanished during update", booking_id))?;
        tx.commit()?;
        Ok(BookingTransitionOutcome::Applied(updated))
    }

    fn delete_booking(&self, booking_id: usize) -> Result<Option<Booking>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let Some(booking) = read_booking(&tx, booking_id)? else {
            return Ok(None);
        };
        tx.execute("DELETE FROM booking WHERE id = ?1", params![booking_id])?;
        if booking.status.holds_slot() {
            release_slot(&tx, booking.spot_id)?;
        }
        tx.commit()?;
        Ok(Some(booking))
    }

    fn advance_lifecycle(&self, now: DateTime<Utc>) -> Result<LifecycleSweep> {
        let now = now.timestamp();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let activated = tx.execute(
            "UPDATE booking SET status = 'active' WHERE status = 'reserved' AND start_time <= ?1",
            params![now],
        )?;
        tx.execute(
            "UPDATE spot SET available_slots = MIN(total_slots, available_slots + (
                SELECT COUNT(*) FROM booking
                WHERE booking.spot_id = spot.id AND status = 'active' AND end_time <= ?1))
             WHERE id IN (SELECT spot_id FROM booking WHERE status = 'active' AND end_time <= ?1)",
            params![now],
        )?;
        let completed = tx.execute(
            "UPDATE booking SET status = 'completed' WHERE status = 'active' AND end_time <= ?1",
            params![now],
        )?;
        tx.commit()?;

        if activated > 0 || completed > 0 {
            info!(
                "Lifecycle sweep activated {} and completed {} bookings",
                activated, completed
            );
        }
        Ok(LifecycleSweep {
            activated,
            completed,
        })
    }

    fn purge_account(&self, user_id: usize) -> Result<PurgedAccountData> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE spot SET available_slots = MIN(total_slots, available_slots + (
                SELECT COUNT(*) FROM booking
                WHERE booking.spot_id = spot.id AND user_id = ?1
                    AND status IN ('reserved', 'active')))
             WHERE id IN (SELECT spot_id FROM booking WHERE user_id = ?1)",
            params![user_id],
        )?;
        let bookings = tx.execute("DELETE FROM booking WHERE user_id = ?1", params![user_id])?;
        let spots = tx.execute("DELETE FROM spot WHERE owner_id = ?1", params![user_id])?;
        tx.commit()?;

        Ok(PurgedAccountData { bookings, spots })
    }

    fn booking_stats(&self) -> Result<(BookingsByStatus, f64)> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*), COALESCE(SUM(total_price), 0) FROM booking GROUP BY status",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, usize>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = BookingsByStatus::default();
        let mut revenue = 0.0;
        for (status, count, sum) in rows {
            let Some(status) = BookingStatus::from_str(&status) else {
                debug!("Ignoring {} bookings with unknown status {}", count, status);
                continue;
            };
            counts.add(status, count);
            if status != BookingStatus::Cancelled {
                revenue += sum;
            }
        }
        Ok((counts, revenue))
    }
}
