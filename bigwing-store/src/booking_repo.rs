use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use bigwing_core::booking::{
    Booking, BookingDetails, BookingStatus, FlightSummary, NewBooking, RouteSummary,
    ScheduleSummary,
};
use bigwing_core::catalog::{Airline, Location};
use bigwing_core::query::Ident;
use bigwing_core::repository::BookingRepository;
use bigwing_core::{CoreError, CoreResult};

use crate::database::{insert_error, storage_error};
use crate::query::{QueryComposer, Record};

pub struct PgBookingRepository {
    pool: PgPool,
    composer: QueryComposer,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        let composer = QueryComposer::new(pool.clone());
        Self { pool, composer }
    }
}

// Row as returned by `to_jsonb` on the bookings table.
#[derive(Deserialize)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    flight_id: Uuid,
    route_id: Uuid,
    schedule_id: Uuid,
    booking_status: BookingStatus,
    total_price: f64,
    is_return: bool,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            user_id: row.user_id,
            flight_id: row.flight_id,
            route_id: row.route_id,
            schedule_id: row.schedule_id,
            booking_status: row.booking_status,
            total_price: row.total_price,
            is_return: row.is_return,
            created_at: row.created_at,
        }
    }
}

fn booking_record(booking: &NewBooking) -> CoreResult<Record> {
    let values = json!({
        "user_id": booking.user_id,
        "flight_id": booking.flight_id,
        "route_id": booking.route_id,
        "schedule_id": booking.schedule_id,
        "booking_status": booking.booking_status,
        "total_price": booking.total_price,
        "is_return": booking.is_return,
        "created_at": booking.created_at,
    });
    match values {
        Value::Object(map) => Record::from_json(map),
        _ => Err(CoreError::InternalError("booking record is not an object".to_string())),
    }
}

#[derive(sqlx::FromRow)]
struct BookingDetailRow {
    id: Uuid,
    user_id: Uuid,
    flight_id: Uuid,
    route_id: Uuid,
    schedule_id: Uuid,
    booking_status: String,
    total_price: f64,
    is_return: bool,
    created_at: DateTime<Utc>,
    departure_time: NaiveTime,
    arrival_time: NaiveTime,
    frequency: String,
    route_flight_id: Uuid,
    is_direct: bool,
    origin_id: Uuid,
    origin_name: String,
    origin_code: String,
    origin_city: String,
    origin_country: String,
    destination_id: Uuid,
    destination_name: String,
    destination_code: String,
    destination_city: String,
    destination_country: String,
    airline_id: Uuid,
    flight_number: String,
    flight_status: String,
    airline_name: String,
    airline_code: String,
    airline_logo_url: Option<String>,
    airline_country: String,
}

impl TryFrom<BookingDetailRow> for BookingDetails {
    type Error = CoreError;

    fn try_from(row: BookingDetailRow) -> Result<Self, Self::Error> {
        Ok(BookingDetails {
            booking: Booking {
                id: row.id,
                user_id: row.user_id,
                flight_id: row.flight_id,
                route_id: row.route_id,
                schedule_id: row.schedule_id,
                booking_status: row.booking_status.parse()?,
                total_price: row.total_price,
                is_return: row.is_return,
                created_at: row.created_at,
            },
            schedules: ScheduleSummary {
                id: row.schedule_id,
                departure_time: row.departure_time,
                arrival_time: row.arrival_time,
                frequency: row.frequency,
            },
            routes: RouteSummary {
                id: row.route_id,
                flight_id: row.route_flight_id,
                origin_id: row.origin_id,
                origin: Location {
                    id: row.origin_id,
                    name: row.origin_name,
                    code: row.origin_code,
                    city: row.origin_city,
                    country: row.origin_country,
                },
                destination: Location {
                    id: row.destination_id,
                    name: row.destination_name,
                    code: row.destination_code,
                    city: row.destination_city,
                    country: row.destination_country,
                },
                is_direct: row.is_direct,
            },
            flights: FlightSummary {
                id: row.flight_id,
                airline_id: row.airline_id,
                airlines: Airline {
                    id: row.airline_id,
                    name: row.airline_name,
                    code: row.airline_code,
                    logo_url: row.airline_logo_url,
                    country: row.airline_country,
                },
                flight_number: row.flight_number,
                flight_status: row.flight_status,
            },
        })
    }
}

const BOOKING_DETAILS_SQL: &str = r#"
    SELECT
        b.id, b.user_id, b.flight_id, b.route_id, b.schedule_id,
        b.booking_status, b.total_price, b.is_return, b.created_at,
        s.departure_time, s.arrival_time, s.frequency,
        r.flight_id AS route_flight_id, r.is_direct,
        o.id AS origin_id, o.name AS origin_name, o.code AS origin_code,
        o.city AS origin_city, o.country AS origin_country,
        d.id AS destination_id, d.name AS destination_name, d.code AS destination_code,
        d.city AS destination_city, d.country AS destination_country,
        f.airline_id, f.flight_number, f.flight_status,
        a.name AS airline_name, a.code AS airline_code,
        a.logo_url AS airline_logo_url, a.country AS airline_country
    FROM bookings b
    JOIN schedules s ON s.id = b.schedule_id
    JOIN routes r ON r.id = b.route_id
    JOIN locations o ON o.id = r.origin_id
    JOIN locations d ON d.id = r.destination_id
    JOIN flights f ON f.id = b.flight_id
    JOIN airlines a ON a.id = f.airline_id
    WHERE b.user_id = $1
"#;

fn active_statuses() -> Vec<String> {
    BookingStatus::ACTIVE.iter().map(|s| s.as_str().to_string()).collect()
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_booking(&self, booking: &NewBooking) -> CoreResult<Booking> {
        let table = Ident::parse("bookings")?;
        let record = booking_record(booking)?;

        let rows = self
            .composer
            .insert(&table, &record)
            .await
            .map_err(insert_error)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::InternalError("insert returned no row".to_string()))?;
        let row: BookingRow = serde_json::from_value(row).map_err(CoreError::storage)?;
        Ok(row.into())
    }

    async fn has_active_booking(&self, schedule_id: Uuid, user_id: Uuid) -> CoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM bookings
                WHERE schedule_id = $1 AND user_id = $2 AND booking_status = ANY($3)
            )
            "#,
        )
        .bind(schedule_id)
        .bind(user_id)
        .bind(active_statuses())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)
    }

    async fn list_bookings(&self, user_id: Uuid) -> CoreResult<Vec<BookingDetails>> {
        let sql = format!("{} ORDER BY b.created_at DESC", BOOKING_DETAILS_SQL);
        let rows = sqlx::query_as::<_, BookingDetailRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        rows.into_iter().map(BookingDetails::try_from).collect()
    }

    async fn get_booking(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<Option<BookingDetails>> {
        let sql = format!("{} AND b.id = $2", BOOKING_DETAILS_SQL);
        let row = sqlx::query_as::<_, BookingDetailRow>(&sql)
            .bind(user_id)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.map(BookingDetails::try_from).transpose()
    }

    async fn booking_status(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<Option<BookingStatus>> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT booking_status FROM bookings WHERE id = $1 AND user_id = $2",
        )
        .bind(booking_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        status.map(|s| s.parse()).transpose()
    }
}
