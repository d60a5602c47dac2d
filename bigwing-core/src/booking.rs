use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::catalog::{Airline, Location};
use crate::identity::AuthUser;
use crate::repository::BookingRepository;
use crate::{CoreError, CoreResult};

pub const BOOKING_EXISTS: &str = "Booking already exists";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Statuses that hold a schedule for the user. At most one such booking may
    /// exist per (user, schedule).
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            "Completed" => Ok(BookingStatus::Completed),
            other => Err(CoreError::InternalError(format!("unknown booking status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub route_id: Uuid,
    pub schedule_id: Uuid,
    pub booking_status: BookingStatus,
    pub total_price: f64,
    pub is_return: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub flight_id: Uuid,
    pub route_id: Uuid,
    pub schedule_id: Uuid,
    pub total_price: f64,
    pub is_return: bool,
}

impl CreateBookingRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.total_price.is_finite() || self.total_price < 0.0 {
            return Err(CoreError::ValidationError(
                "totalPrice must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Row to insert. The id is assigned by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub route_id: Uuid,
    pub schedule_id: Uuid,
    pub booking_status: BookingStatus,
    pub total_price: f64,
    pub is_return: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct BookingUser {
    pub id: Uuid,
    pub email: Option<String>,
}

impl From<&AuthUser> for BookingUser {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct CreatedBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub user: BookingUser,
}

// Joined shape returned by the booking read endpoints. Field names follow the
// table each object comes from.

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub id: Uuid,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub frequency: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub origin_id: Uuid,
    pub origin: Location,
    pub destination: Location,
    pub is_direct: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlightSummary {
    pub id: Uuid,
    pub airline_id: Uuid,
    pub airlines: Airline,
    pub flight_number: String,
    pub flight_status: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub schedules: ScheduleSummary,
    pub routes: RouteSummary,
    pub flights: FlightSummary,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub booking_status: BookingStatus,
}

/// Booking operations on behalf of an authenticated user.
#[derive(Clone)]
pub struct BookingManager {
    repo: Arc<dyn BookingRepository>,
}

impl BookingManager {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    /// Insert a `Pending` booking. A second active booking for the same schedule is
    /// refused by the repository's uniqueness constraint, not by a prior lookup.
    pub async fn create_booking(
        &self,
        user: &AuthUser,
        req: CreateBookingRequest,
    ) -> CoreResult<CreatedBooking> {
        req.validate()?;

        let new_booking = NewBooking {
            user_id: user.id,
            flight_id: req.flight_id,
            route_id: req.route_id,
            schedule_id: req.schedule_id,
            booking_status: BookingStatus::Pending,
            total_price: req.total_price,
            is_return: req.is_return,
            created_at: Utc::now(),
        };

        let booking = self.repo.insert_booking(&new_booking).await.map_err(|e| match e {
            CoreError::Conflict(_) => {
                info!(
                    "Duplicate booking refused for user {} schedule {}",
                    user.id, req.schedule_id
                );
                CoreError::Conflict(BOOKING_EXISTS.to_string())
            }
            other => other,
        })?;

        info!("Booking {} created for user {}", booking.id, user.id);

        Ok(CreatedBooking {
            booking,
            user: BookingUser::from(user),
        })
    }

    pub async fn has_booking(&self, schedule_id: Uuid, user_id: Uuid) -> CoreResult<bool> {
        self.repo.has_active_booking(schedule_id, user_id).await
    }

    pub async fn list_bookings(&self, user_id: Uuid) -> CoreResult<Vec<BookingDetails>> {
        self.repo.list_bookings(user_id).await
    }

    /// A booking that does not exist and one owned by someone else are both reported
    /// as not found.
    pub async fn get_booking(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<BookingDetails> {
        self.repo
            .get_booking(booking_id, user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Booking".to_string()))
    }

    pub async fn current_status(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<StatusSnapshot> {
        let booking_status = self
            .repo
            .booking_status(booking_id, user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Booking".to_string()))?;
        Ok(StatusSnapshot { booking_status })
    }
}
