//! Headless view logic: role gate, booking draft, search filter and the
//! owner analytics projection.

use chrono::{DateTime, Days, NaiveDate, Utc};

use super::{ApiError, ClientSession};
use crate::parking::pricing::{self, PricingError};
use crate::parking::{Booking, BookingRequest, BookingStatus, ParkingSpot, SpotQuery};
use crate::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    Login,
    Signup,
    FindParking,
    MyBookings,
    OwnerDashboard,
    AddParking,
    OwnerBookings,
    OwnerAnalytics,
    AdminDashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    Public,
    SignedIn,
    AnyOf(&'static [Role]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    NotSignedIn,
    RoleNotPermitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied(DenialReason),
}

const OWNER_ROLES: &[Role] = &[Role::Owner, Role::Admin];
const ADMIN_ROLES: &[Role] = &[Role::Admin];

impl View {
    pub const ALL: [View; 10] = [
        View::Home,
        View::Login,
        View::Signup,
        View::FindParking,
        View::MyBookings,
        View::OwnerDashboard,
        View::AddParking,
        View::OwnerBookings,
        View::OwnerAnalytics,
        View::AdminDashboard,
    ];

    pub fn required_roles(self) -> RoleRequirement {
        match self {
            View::Home | View::Login | View::Signup | View::FindParking => RoleRequirement::Public,
            View::MyBookings => RoleRequirement::SignedIn,
            View::OwnerDashboard
            | View::AddParking
            | View::OwnerBookings
            | View::OwnerAnalytics => RoleRequirement::AnyOf(OWNER_ROLES),
            View::AdminDashboard => RoleRequirement::AnyOf(ADMIN_ROLES),
        }
    }
}

/// Decides whether `view` may render for the cached session. Never talks to the server.
pub fn check_access(view: View, session: Option<&ClientSession>) -> Access {
    match (view.required_roles(), session) {
        (RoleRequirement::Public, _) => Access::Granted,
        (_, None) => Access::Denied(DenialReason::NotSignedIn),
        (RoleRequirement::SignedIn, Some(_)) => Access::Granted,
        (RoleRequirement::AnyOf(roles), Some(session)) if roles.contains(&session.role) => {
            Access::Granted
        }
        (RoleRequirement::AnyOf(_), Some(_)) => Access::Denied(DenialReason::RoleNotPermitted),
    }
}

/// Keeps the active spots matching `query`.
pub fn search_visible(spots: Vec<ParkingSpot>, query: &SpotQuery) -> Vec<ParkingSpot> {
    spots
        .into_iter()
        .filter(|spot| spot.status.is_visible() && query.matches(spot))
        .collect()
}

/// Booking form state for one spot, with the price shown before confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub spot_id: usize,
    pub price_per_hour: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl BookingDraft {
    pub fn for_spot(spot: &ParkingSpot) -> Self {
        Self {
            spot_id: spot.id,
            price_per_hour: spot.price_per_hour,
            start_time: None,
            end_time: None,
        }
    }

    pub fn set_window(&mut self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
    }

    fn request(&self) -> Option<BookingRequest> {
        Some(
            BookingRequest {
                spot_id: self.spot_id,
                start_time: self.start_time?,
                end_time: self.end_time?,
            }
            .normalized(),
        )
    }

    /// Price the server will charge, or `None` until both ends are chosen.
    pub fn estimate(&self) -> Option<Result<f64, PricingError>> {
        self.request().map(|request| {
            pricing::booking_price(self.price_per_hour, request.start_time, request.end_time)
        })
    }

    pub fn to_request(&self) -> Result<BookingRequest, ApiError> {
        let request = self
            .request()
            .ok_or_else(|| ApiError::Validation("Pick a start and an end time".to_string()))?;
        request
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBookings {
    pub date: NaiveDate,
    pub bookings: usize,
    pub revenue: f64,
}

/// What an owner sees on the analytics page.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerAnalyticsSummary {
    pub total_spots: usize,
    pub total_bookings: usize,
    /// Reserved or active bookings.
    pub active_bookings: usize,
    /// Sum over bookings that were not cancelled.
    pub total_revenue: f64,
    /// Last seven days ending at `today`, oldest first, keyed by booking creation date.
    pub last_week: Vec<DailyBookings>,
}

const WEEK_DAYS: u64 = 7;

fn is_billable(booking: &Booking) -> bool {
    booking.status != BookingStatus::Cancelled
}

impl OwnerAnalyticsSummary {
    pub fn from_parts(
        owner_id: usize,
        spots: &[ParkingSpot],
        bookings: &[Booking],
        today: NaiveDate,
    ) -> Self {
        let last_week = (0..WEEK_DAYS)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back)))
            .map(|date| {
                let day: Vec<&Booking> = bookings
                    .iter()
                    .filter(|b| b.created_at.date_naive() == date)
                    .collect();
                DailyBookings {
                    date,
                    bookings: day.len(),
                    revenue: day.iter().filter(|b| is_billable(b)).map(|b| b.total_price).sum(),
                }
            })
            .collect();

        Self {
            total_spots: spots.iter().filter(|s| s.owner_id == owner_id).count(),
            total_bookings: bookings.len(),
            active_bookings: bookings.iter().filter(|b| b.status.holds_slot()).count(),
            total_revenue: bookings
                .iter()
                .filter(|b| is_billable(b))
                .map(|b| b.total_price)
                .sum(),
            last_week,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parking::SpotStatus;
    use chrono::{TimeDelta, TimeZone};
    use std::collections::BTreeSet;

    fn session(role: Role) -> ClientSession {
        ClientSession {
            user_id: 1,
            name: "Kit".to_string(),
            email: "kit@example.com".to_string(),
            role,
            token: "t".to_string(),
        }
    }

    fn spot(id: usize, owner_id: usize, status: SpotStatus, price: f64) -> ParkingSpot {
        ParkingSpot {
            id,
            owner_id,
            name: format!("Spot {}", id),
            address: "1 Dock Road".to_string(),
            description: String::new(),
            price_per_hour: price,
            total_slots: 3,
            available_slots: 3,
            lat: None,
            lng: None,
            amenities: BTreeSet::new(),
            image_url: None,
            status,
            created_at: Utc::now(),
        }
    }

    fn booking(id: usize, status: BookingStatus, price: f64, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id,
            user_id: 9,
            spot_id: 1,
            start_time: created_at,
            end_time: created_at + TimeDelta::hours(1),
            total_price: price,
            status,
            created_at,
        }
    }

    #[test]
    fn public_views_need_no_session() {
        for view in [View::Home, View::Login, View::Signup, View::FindParking] {
            assert_eq!(check_access(view, None), Access::Granted);
        }
    }

    #[test]
    fn gates_views_by_role() {
        assert_eq!(
            check_access(View::MyBookings, None),
            Access::Denied(DenialReason::NotSignedIn)
        );
        assert_eq!(
            check_access(View::MyBookings, Some(&session(Role::User))),
            Access::Granted
        );
        assert_eq!(
            check_access(View::OwnerDashboard, Some(&session(Role::User))),
            Access::Denied(DenialReason::RoleNotPermitted)
        );
        assert_eq!(
            check_access(View::OwnerAnalytics, Some(&session(Role::Owner))),
            Access::Granted
        );
        assert_eq!(
            check_access(View::AddParking, Some(&session(Role::Admin))),
            Access::Granted
        );
        assert_eq!(
            check_access(View::AdminDashboard, Some(&session(Role::Owner))),
            Access::Denied(DenialReason::RoleNotPermitted)
        );
        assert_eq!(
            check_access(View::AdminDashboard, Some(&session(Role::Admin))),
            Access::Granted
        );
    }

    #[test]
    fn every_view_is_reachable_by_admin() {
        let admin = session(Role::Admin);
        for view in View::ALL {
            assert_eq!(check_access(view, Some(&admin)), Access::Granted, "{:?}", view);
        }
    }

    #[test]
    fn search_drops_inactive_spots() {
        let spots = vec![
            spot(1, 2, SpotStatus::Active, 10.0),
            spot(2, 2, SpotStatus::Pending, 10.0),
            spot(3, 2, SpotStatus::Inactive, 10.0),
            spot(4, 2, SpotStatus::Active, 80.0),
        ];
        let query = SpotQuery {
            max_price: Some(50.0),
            ..SpotQuery::default()
        };
        let visible = search_visible(spots, &query);
        assert_eq!(visible.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn draft_estimates_ceiling_hours() {
        let mut draft = BookingDraft::for_spot(&spot(1, 2, SpotStatus::Active, 50.0));
        assert!(draft.estimate().is_none());
        assert!(matches!(draft.to_request(), Err(ApiError::Validation(_))));

        let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        draft.set_window(start, start + TimeDelta::minutes(150));
        assert_eq!(draft.estimate(), Some(Ok(150.0)));

        draft.set_window(start, start + TimeDelta::minutes(60));
        assert_eq!(draft.estimate(), Some(Ok(50.0)));

        draft.set_window(start, start + TimeDelta::minutes(61));
        assert_eq!(draft.estimate(), Some(Ok(100.0)));
        assert_eq!(draft.to_request().unwrap().spot_id, 1);
    }

    #[test]
    fn draft_rejects_backwards_window() {
        let mut draft = BookingDraft::for_spot(&spot(1, 2, SpotStatus::Active, 50.0));
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        draft.set_window(start, start);
        assert_eq!(draft.estimate(), Some(Err(PricingError::EmptyWindow)));
        assert!(matches!(draft.to_request(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn owner_summary_excludes_cancelled_revenue() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let noon = |date: NaiveDate| date.and_hms_opt(12, 0, 0).unwrap().and_utc();
        let three_days_ago = today.checked_sub_days(Days::new(3)).unwrap();
        let long_ago = today.checked_sub_days(Days::new(30)).unwrap();

        let spots = vec![
            spot(1, 2, SpotStatus::Active, 10.0),
            spot(2, 2, SpotStatus::Pending, 10.0),
            spot(3, 5, SpotStatus::Active, 10.0),
        ];
        let bookings = vec![
            booking(1, BookingStatus::Reserved, 20.0, noon(today)),
            booking(2, BookingStatus::Active, 30.0, noon(three_days_ago)),
            booking(3, BookingStatus::Cancelled, 40.0, noon(today)),
            booking(4, BookingStatus::Completed, 50.0, noon(long_ago)),
        ];

        let summary = OwnerAnalyticsSummary::from_parts(2, &spots, &bookings, today);
        assert_eq!(summary.total_spots, 2);
        assert_eq!(summary.total_bookings, 4);
        assert_eq!(summary.active_bookings, 2);
        assert_eq!(summary.total_revenue, 100.0);

        assert_eq!(summary.last_week.len(), 7);
        assert_eq!(summary.last_week[0].date, today.checked_sub_days(Days::new(6)).unwrap());
        let last = &summary.last_week[6];
        assert_eq!(last.date, today);
        assert_eq!(last.bookings, 2);
        assert_eq!(last.revenue, 20.0);
        assert_eq!(summary.last_week[3].bookings, 1);
        assert_eq!(summary.last_week[3].revenue, 30.0);
    }
}
