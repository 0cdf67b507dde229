use super::parking_store::{
    BookingOutcome, BookingTransitionOutcome, ParkingStore, PurgedAccountData,
    SpotDeleteOutcome, SpotScope, SpotTransition, SpotUpdateOutcome,
};
use super::{
    AdminAnalytics, Booking, BookingRequest, BookingTransitionError, LifecycleSweep,
    NewSpot, ParkingSpot, SpotChanges, SpotQuery, SpotStatus, SpotsByStatus,
};
use crate::error::{ServiceError, ServiceResult};
use crate::user::{AccountsByRole, Capability, Role};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// The authenticated account a request acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: usize,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: usize, role: Role) -> Self {
        Actor { user_id, role }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.has_capability(capability)
    }

    pub fn require(&self, capability: Capability) -> ServiceResult<()> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(ServiceError::forbidden(format!(
                "Role {} is not allowed to do this",
                self.role
            )))
        }
    }

    fn can_manage_spot(&self, spot: &ParkingSpot) -> bool {
        self.can(Capability::ReviewSpots)
            || (self.can(Capability::ManageOwnSpots) && spot.owner_id == self.user_id)
    }

    fn can_see_spot(&self, spot: &ParkingSpot) -> bool {
        spot.status.is_visible() || self.can_manage_spot(spot)
    }
}

pub struct ParkingManager {
    store: Arc<dyn ParkingStore>,
}

impl ParkingManager {
    pub fn new(store: Arc<dyn ParkingStore>) -> Self {
        Self { store }
    }

    /// Public search. Only active spots ever leave this call.
    pub fn list_active_spots(&self, query: &SpotQuery) -> ServiceResult<Vec<ParkingSpot>> {
        let spots = self
            .store
            .list_spots(SpotScope::WithStatus(SpotStatus::Active), query)?;
        Ok(spots.into_iter().filter(|s| s.status.is_visible()).collect())
    }

    pub fn list_all_spots(&self, actor: &Actor, query: &SpotQuery) -> ServiceResult<Vec<ParkingSpot>> {
        actor.require(Capability::ReviewSpots)?;
        Ok(self.store.list_spots(SpotScope::All, query)?)
    }

    pub fn list_owner_spots(&self, actor: &Actor) -> ServiceResult<Vec<ParkingSpot>> {
        actor.require(Capability::ManageOwnSpots)?;
        Ok(self
            .store
            .list_spots(SpotScope::OwnedBy(actor.user_id), &SpotQuery::default())?)
    }

    /// Non-active spots are reported as missing to anyone but their owner or an admin.
    pub fn get_spot(&self, actor: Option<&Actor>, spot_id: usize) -> ServiceResult<ParkingSpot> {
        let spot = self
            .store
            .get_spot(spot_id)?
            .ok_or(ServiceError::NotFound("Parking spot"))?;
        let visible = match actor {
            Some(actor) => actor.can_see_spot(&spot),
            None => spot.status.is_visible(),
        };
        if !visible {
            return Err(ServiceError::NotFound("Parking spot"));
        }
        Ok(spot)
    }

    fn get_managed_spot(&self, actor: &Actor, spot_id: usize) -> ServiceResult<ParkingSpot> {
        let spot = self
            .store
            .get_spot(spot_id)?
            .ok_or(ServiceError::NotFound("Parking spot"))?;
        if !actor.can_manage_spot(&spot) {
            return Err(ServiceError::forbidden(format!(
                "Spot {} belongs to another owner",
                spot_id
            )));
        }
        Ok(spot)
    }

    pub fn add_spot(&self, actor: &Actor, new_spot: NewSpot) -> ServiceResult<ParkingSpot> {
        actor.require(Capability::ManageOwnSpots)?;
        new_spot.validate()?;
        let spot = self.store.insert_spot(actor.user_id, &new_spot)?;
        info!("Owner {} listed spot {} ({})", actor.user_id, spot.id, spot.name);
        Ok(spot)
    }

    /// Applies a partial update. A `status` field is reserved to admins and is
    /// checked against the approval rules before anything is written.
    pub fn update_spot(
        &self,
        actor: &Actor,
        spot_id: usize,
        changes: SpotChanges,
    ) -> ServiceResult<ParkingSpot> {
        changes.validate()?;
        let spot = self.get_managed_spot(actor, spot_id)?;

        let transition = match changes.status {
            Some(target) => {
                actor.require(Capability::ReviewSpots)?;
                let next = spot.status.transition_to(target)?;
                (next != spot.status).then_some(SpotTransition {
                    from: spot.status,
                    to: next,
                })
            }
            None => None,
        };
        if !changes.has_field_changes() && transition.is_none() {
            return Ok(spot);
        }

        let outcome = self.store.update_spot(spot_id, &changes, transition)?;
        updated_spot(spot_id, outcome)
    }

    pub fn delete_spot(&self, actor: &Actor, spot_id: usize) -> ServiceResult<()> {
        self.get_managed_spot(actor, spot_id)?;
        match self.store.delete_spot(spot_id)? {
            SpotDeleteOutcome::Deleted => {
                info!("Spot {} deleted by user {}", spot_id, actor.user_id);
                Ok(())
            }
            SpotDeleteOutcome::NotFound => Err(ServiceError::NotFound("Parking spot")),
            SpotDeleteOutcome::OpenBookings(open) => Err(ServiceError::conflict(format!(
                "Spot {} still has {} open bookings",
                spot_id, open
            ))),
        }
    }

    /// Moves a spot through the approval state machine. Requesting the current
    /// status succeeds without writing.
    pub fn change_spot_status(
        &self,
        actor: &Actor,
        spot_id: usize,
        target: SpotStatus,
    ) -> ServiceResult<ParkingSpot> {
        actor.require(Capability::ReviewSpots)?;
        let spot = self
            .store
            .get_spot(spot_id)?
            .ok_or(ServiceError::NotFound("Parking spot"))?;
        let next = spot.status.transition_to(target)?;
        if next == spot.status {
            debug!("Spot {} already {}", spot_id, next);
            return Ok(spot);
        }
        let transition = SpotTransition {
            from: spot.status,
            to: next,
        };
        let updated = match self.store.set_spot_status(spot_id, transition)? {
            SpotUpdateOutcome::StatusMismatch(current) if current == next => {
                debug!("Spot {} reached {} concurrently", spot_id, next);
                return self.get_spot(Some(actor), spot_id);
            }
            outcome => updated_spot(spot_id, outcome)?,
        };
        info!(
            "Admin {} moved spot {} from {} to {}",
            actor.user_id, spot_id, spot.status, next
        );
        Ok(updated)
    }

    pub fn approve_spot(&self, actor: &Actor, spot_id: usize) -> ServiceResult<ParkingSpot> {
        self.change_spot_status(actor, spot_id, SpotStatus::Active)
    }

    /// Books one slot. Checks run in a fixed order: the time window, the spot's
    /// existence, its status and finally its availability.
    pub fn create_booking(&self, actor: &Actor, request: BookingRequest) -> ServiceResult<Booking> {
        actor.require(Capability::BookSpots)?;
        let request = request.normalized();
        request.validate()?;

        match self.store.create_booking(actor.user_id, &request)? {
            BookingOutcome::Created(booking) => {
                info!(
                    "User {} booked spot {} as booking {} for {}",
                    actor.user_id, booking.spot_id, booking.id, booking.total_price
                );
                Ok(booking)
            }
            BookingOutcome::SpotNotFound => Err(ServiceError::NotFound("Parking spot")),
            BookingOutcome::SpotNotActive => Err(ServiceError::conflict(format!(
                "Spot {} is not open for booking",
                request.spot_id
            ))),
            BookingOutcome::NoAvailability => Err(ServiceError::conflict(format!(
                "Spot {} has no available slots",
                request.spot_id
            ))),
            BookingOutcome::InvalidWindow(e) => Err(ServiceError::validation(e.to_string())),
        }
    }

    pub fn list_user_bookings(&self, actor: &Actor, user_id: usize) -> ServiceResult<Vec<Booking>> {
        if actor.user_id != user_id && !actor.can(Capability::ManageUsers) {
            return Err(ServiceError::forbidden(
                "Bookings of other accounts are not visible",
            ));
        }
        Ok(self.store.list_user_bookings(user_id)?)
    }

    pub fn list_owner_bookings(&self, actor: &Actor, owner_id: usize) -> ServiceResult<Vec<Booking>> {
        let own = actor.user_id == owner_id && actor.can(Capability::ViewOwnerBookings);
        if !own && !actor.can(Capability::ManageUsers) {
            return Err(ServiceError::forbidden(
                "Bookings of other owners are not visible",
            ));
        }
        Ok(self.store.list_owner_bookings(owner_id)?)
    }

    /// Cancels a reserved booking on behalf of its account, the spot's owner
    /// or an admin, releasing its slot.
    pub fn cancel_booking(&self, actor: &Actor, booking_id: usize) -> ServiceResult<Booking> {
        let booking = self
            .store
            .get_booking(booking_id)?
            .ok_or(ServiceError::NotFound("Booking"))?;
        if booking.user_id != actor.user_id && !actor.can(Capability::ManageUsers) {
            let owns_spot = self
                .store
                .get_spot(booking.spot_id)?
                .is_some_and(|spot| spot.owner_id == actor.user_id);
            if !owns_spot {
                return Err(ServiceError::forbidden(
                    "Only the booking's account, the spot owner or an admin can cancel it",
                ));
            }
        }

        let target = booking.status.cancel()?;
        match self
            .store
            .transition_booking(booking_id, booking.status, target)?
        {
            BookingTransitionOutcome::Applied(booking) => {
                info!("Booking {} cancelled by user {}", booking_id, actor.user_id);
                Ok(booking)
            }
            BookingTransitionOutcome::NotFound => Err(ServiceError::NotFound("Booking")),
            BookingTransitionOutcome::StatusMismatch(current) => Err(BookingTransitionError {
                from: current,
                to: target,
            }
            .into()),
        }
    }

    pub fn delete_booking(&self, actor: &Actor, booking_id: usize) -> ServiceResult<()> {
        let booking = self
            .store
            .get_booking(booking_id)?
            .ok_or(ServiceError::NotFound("Booking"))?;
        if booking.user_id != actor.user_id && !actor.can(Capability::ManageUsers) {
            return Err(ServiceError::forbidden(
                "Only the booking's account or an admin can delete it",
            ));
        }
        if self.store.delete_booking(booking_id)?.is_none() {
            return Err(ServiceError::NotFound("Booking"));
        }
        info!("Booking {} deleted by user {}", booking_id, actor.user_id);
        Ok(())
    }

    pub fn advance_lifecycle(&self, now: DateTime<Utc>) -> Result<LifecycleSweep> {
        self.store.advance_lifecycle(now)
    }

    /// Drops the bookings and spots of an account that is about to be deleted.
    pub fn purge_account(&self, user_id: usize) -> Result<PurgedAccountData> {
        let purged = self.store.purge_account(user_id)?;
        info!(
            "Purged {} bookings and {} spots of user {}",
            purged.bookings, purged.spots, user_id
        );
        Ok(purged)
    }

    pub fn analytics(
        &self,
        actor: &Actor,
        users_by_role: AccountsByRole,
    ) -> ServiceResult<AdminAnalytics> {
        actor.require(Capability::ViewAnalytics)?;
        let spots_by_status = self.store.count_spots_by_status()?;
        let (bookings_by_status, revenue) = self.store.booking_stats()?;
        Ok(AdminAnalytics::new(
            users_by_role,
            spots_by_status,
            bookings_by_status,
            revenue,
        ))
    }

    pub fn count_spots_by_status(&self) -> Result<SpotsByStatus> {
        self.store.count_spots_by_status()
    }
}

fn updated_spot(spot_id: usize, outcome: SpotUpdateOutcome) -> ServiceResult<ParkingSpot> {
    match outcome {
        SpotUpdateOutcome::Updated(spot) => Ok(spot),
        SpotUpdateOutcome::NotFound => Err(ServiceError::NotFound("Parking spot")),
        SpotUpdateOutcome::CapacityBelowUsage { in_use } => Err(ServiceError::conflict(format!(
            "{} slots are held by bookings, capacity cannot go below that",
            in_use
        ))),
        SpotUpdateOutcome::StatusMismatch(current) => Err(ServiceError::conflict(format!(
            "Spot {} was moved to {} in the meantime",
            spot_id, current
        ))),
    }
}
