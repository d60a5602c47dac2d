use async_trait::async_trait;
use chrono::NaiveTime;
use sqlx::PgPool;
use uuid::Uuid;

use bigwing_core::catalog::{Airline, FlightDetails, FlightOption, Location, RouteDetails, Schedule};
use bigwing_core::repository::FlightRepository;
use bigwing_core::search::SearchLeg;
use bigwing_core::CoreResult;
use bigwing_shared::{PageRequest, PaginatedResponse};

use crate::database::storage_error;

pub struct PgFlightRepository {
    pool: PgPool,
}

impl PgFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FlightOptionRow {
    flight_id: Uuid,
    flight_number: String,
    airline_name: String,
    airline_code: String,
    route_id: Uuid,
    origin_name: String,
    origin_code: String,
    destination_name: String,
    destination_code: String,
    schedule_id: Uuid,
    departure_time: NaiveTime,
    arrival_time: NaiveTime,
    frequency: String,
    price: f64,
    flight_status: String,
}

impl FlightOptionRow {
    fn into_option(self, leg: &SearchLeg) -> FlightOption {
        FlightOption {
            flight_id: self.flight_id,
            flight_number: self.flight_number,
            airline_name: self.airline_name,
            airline_code: self.airline_code,
            route_id: self.route_id,
            origin_name: self.origin_name,
            origin_code: self.origin_code,
            destination_name: self.destination_name,
            destination_code: self.destination_code,
            schedule_id: self.schedule_id,
            departure_date: leg.departure_date,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            frequency: self.frequency,
            price: self.price,
            flight_status: self.flight_status,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    flight_number: String,
    cabin_class: Option<String>,
    flight_status: String,
    price: f64,
    total_duration_minutes: Option<i32>,
    airline_id: Uuid,
    airline_name: String,
    airline_code: String,
    airline_logo_url: Option<String>,
    airline_country: String,
}

#[derive(sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
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
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid,
    route_id: Uuid,
    departure_time: NaiveTime,
    arrival_time: NaiveTime,
    frequency: String,
    price: f64,
}

// Shared FROM/WHERE of the search and its count. Cancelled flights are never offered.
const SEARCH_FROM: &str = r#"
    FROM schedules s
    JOIN routes r ON r.id = s.route_id
    JOIN flights f ON f.id = r.flight_id
    JOIN airlines a ON a.id = f.airline_id
    JOIN locations o ON o.id = r.origin_id
    JOIN locations d ON d.id = r.destination_id
    WHERE o.code = $1 AND d.code = $2 AND f.flight_status <> 'Cancelled'
"#;

#[async_trait]
impl FlightRepository for PgFlightRepository {
    async fn search_flights(
        &self,
        leg: &SearchLeg,
        page: PageRequest,
    ) -> CoreResult<PaginatedResponse<FlightOption>> {
        let count_sql = format!("SELECT COUNT(*) {}", SEARCH_FROM);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&leg.origin_code)
            .bind(&leg.destination_code)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;

        let sql = format!(
            r#"
            SELECT
                f.id AS flight_id, f.flight_number, f.flight_status,
                a.name AS airline_name, a.code AS airline_code,
                r.id AS route_id,
                o.name AS origin_name, o.code AS origin_code,
                d.name AS destination_name, d.code AS destination_code,
                s.id AS schedule_id, s.departure_time, s.arrival_time, s.frequency, s.price
            {}
            ORDER BY s.departure_time, s.price, s.id
            LIMIT $3 OFFSET $4
            "#,
            SEARCH_FROM
        );
        let rows = sqlx::query_as::<_, FlightOptionRow>(&sql)
            .bind(&leg.origin_code)
            .bind(&leg.destination_code)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        let options = rows.into_iter().map(|row| row.into_option(leg)).collect();
        Ok(PaginatedResponse::new(options, page, total))
    }

    async fn get_flight(&self, flight_id: Uuid) -> CoreResult<Option<FlightDetails>> {
        let flight = sqlx::query_as::<_, FlightRow>(
            r#"
            SELECT
                f.id, f.flight_number, f.cabin_class, f.flight_status, f.price,
                f.total_duration_minutes,
                a.id AS airline_id, a.name AS airline_name, a.code AS airline_code,
                a.logo_url AS airline_logo_url, a.country AS airline_country
            FROM flights f
            JOIN airlines a ON a.id = f.airline_id
            WHERE f.id = $1
            "#,
        )
        .bind(flight_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        let Some(flight) = flight else {
            return Ok(None);
        };

        let routes = sqlx::query_as::<_, RouteRow>(
            r#"
            SELECT
                r.id, r.is_direct,
                o.id AS origin_id, o.name AS origin_name, o.code AS origin_code,
                o.city AS origin_city, o.country AS origin_country,
                d.id AS destination_id, d.name AS destination_name, d.code AS destination_code,
                d.city AS destination_city, d.country AS destination_country
            FROM routes r
            JOIN locations o ON o.id = r.origin_id
            JOIN locations d ON d.id = r.destination_id
            WHERE r.flight_id = $1
            ORDER BY o.code, d.code
            "#,
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        let route_ids: Vec<Uuid> = routes.iter().map(|r| r.id).collect();
        let schedules = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT id, route_id, departure_time, arrival_time, frequency, price
            FROM schedules
            WHERE route_id = ANY($1)
            ORDER BY departure_time
            "#,
        )
        .bind(&route_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(Some(assemble_flight(flight, routes, schedules)))
    }
}

fn assemble_flight(flight: FlightRow, routes: Vec<RouteRow>, schedules: Vec<ScheduleRow>) -> FlightDetails {
    let routes = routes
        .into_iter()
        .map(|route| RouteDetails {
            id: route.id,
            is_direct: route.is_direct,
            origin: Location {
                id: route.origin_id,
                name: route.origin_name,
                code: route.origin_code,
                city: route.origin_city,
                country: route.origin_country,
            },
            destination: Location {
                id: route.destination_id,
                name: route.destination_name,
                code: route.destination_code,
                city: route.destination_city,
                country: route.destination_country,
            },
            schedules: schedules
                .iter()
                .filter(|s| s.route_id == route.id)
                .map(|s| Schedule {
                    id: s.id,
                    route_id: s.route_id,
                    departure_time: s.departure_time,
                    arrival_time: s.arrival_time,
                    frequency: s.frequency.clone(),
                    price: s.price,
                })
                .collect(),
        })
        .collect();

    FlightDetails {
        id: flight.id,
        flight_number: flight.flight_number,
        cabin_class: flight.cabin_class,
        flight_status: flight.flight_status,
        price: flight.price,
        total_duration_minutes: flight.total_duration_minutes,
        airline: Airline {
            id: flight.airline_id,
            name: flight.airline_name,
            code: flight.airline_code,
            logo_url: flight.airline_logo_url,
            country: flight.airline_country,
        },
        routes,
    }
}
