//! Seed rows for the `#[sqlx::test]` suites. Each test gets a fresh database with
//! the migrations applied.

use chrono::{NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bigwing_core::booking::{BookingStatus, NewBooking};

pub(crate) async fn location(pool: &PgPool, code: &str, name: &str) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO locations (name, code, city, country) VALUES ($1, $2, $3, 'USA') RETURNING id",
    )
    .bind(name)
    .bind(code)
    .bind(format!("{} City", code))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub(crate) async fn airline(pool: &PgPool) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO airlines (name, code, country) VALUES ('Big Wing Air', 'BW', 'USA') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap()
}

/// One flight with a single route and a single schedule.
pub(crate) struct SeededFlight {
    pub flight_id: Uuid,
    pub route_id: Uuid,
    pub schedule_id: Uuid,
}

pub(crate) struct FlightSeed<'a> {
    pub airline_id: Uuid,
    pub origin_id: Uuid,
    pub destination_id: Uuid,
    pub flight_number: &'a str,
    pub flight_status: &'a str,
    pub departure_hour: u32,
    pub price: f64,
}

pub(crate) async fn flight(pool: &PgPool, seed: FlightSeed<'_>) -> SeededFlight {
    let flight_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO flights (flight_number, airline_id, origin_id, destination_id, price, flight_status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(seed.flight_number)
    .bind(seed.airline_id)
    .bind(seed.origin_id)
    .bind(seed.destination_id)
    .bind(seed.price)
    .bind(seed.flight_status)
    .fetch_one(pool)
    .await
    .unwrap();

    let route_id: Uuid = sqlx::query_scalar(
        "INSERT INTO routes (flight_id, origin_id, destination_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(flight_id)
    .bind(seed.origin_id)
    .bind(seed.destination_id)
    .fetch_one(pool)
    .await
    .unwrap();

    let departure = NaiveTime::from_hms_opt(seed.departure_hour, 0, 0).unwrap();
    let arrival = NaiveTime::from_hms_opt((seed.departure_hour + 5) % 24, 30, 0).unwrap();
    let schedule_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO schedules (route_id, departure_time, arrival_time, frequency, price)
        VALUES ($1, $2, $3, 'Daily', $4)
        RETURNING id
        "#,
    )
    .bind(route_id)
    .bind(departure)
    .bind(arrival)
    .bind(seed.price)
    .fetch_one(pool)
    .await
    .unwrap();

    SeededFlight {
        flight_id,
        route_id,
        schedule_id,
    }
}

/// LAX -> JFK, flight BW101 departing at 08:00.
pub(crate) async fn lax_to_jfk(pool: &PgPool) -> SeededFlight {
    let airline_id = airline(pool).await;
    let origin_id = location(pool, "LAX", "Los Angeles International Airport").await;
    let destination_id = location(pool, "JFK", "John F. Kennedy International Airport").await;

    flight(
        pool,
        FlightSeed {
            airline_id,
            origin_id,
            destination_id,
            flight_number: "BW101",
            flight_status: "Scheduled",
            departure_hour: 8,
            price: 300.0,
        },
    )
    .await
}

pub(crate) fn new_booking(user_id: Uuid, seeded: &SeededFlight) -> NewBooking {
    NewBooking {
        user_id,
        flight_id: seeded.flight_id,
        route_id: seeded.route_id,
        schedule_id: seeded.schedule_id,
        booking_status: BookingStatus::Pending,
        total_price: 300.0,
        is_return: false,
        created_at: Utc::now(),
    }
}

pub(crate) async fn booking_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(pool)
        .await
        .unwrap()
}
