use async_trait::async_trait;
use bigwing_shared::{PageRequest, PaginatedResponse};
use uuid::Uuid;

use crate::booking::{Booking, BookingDetails, BookingStatus, NewBooking};
use crate::catalog::{FlightDetails, FlightOption, Location};
use crate::search::SearchLeg;
use crate::CoreResult;

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Fails with `CoreError::Conflict` when the user already holds an active
    /// booking for the schedule.
    async fn insert_booking(&self, booking: &NewBooking) -> CoreResult<Booking>;

    async fn has_active_booking(&self, schedule_id: Uuid, user_id: Uuid) -> CoreResult<bool>;

    async fn list_bookings(&self, user_id: Uuid) -> CoreResult<Vec<BookingDetails>>;

    async fn get_booking(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<Option<BookingDetails>>;

    async fn booking_status(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<Option<BookingStatus>>;
}

/// Repository trait for flight search and lookup
#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn search_flights(
        &self,
        leg: &SearchLeg,
        page: PageRequest,
    ) -> CoreResult<PaginatedResponse<FlightOption>>;

    async fn get_flight(&self, flight_id: Uuid) -> CoreResult<Option<FlightDetails>>;
}

/// Repository trait for airport lookup
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Locations ordered by name. `search` matches the airport code partially and
    /// case-insensitively.
    async fn search_locations(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> CoreResult<PaginatedResponse<Location>>;
}
