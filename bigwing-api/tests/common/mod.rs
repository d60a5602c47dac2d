#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use chrono::{NaiveTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use uuid::Uuid;

use bigwing_api::{app, middleware::JwtVerifier, AppState};
use bigwing_core::booking::{
    Booking, BookingDetails, BookingManager, BookingStatus, FlightSummary, NewBooking,
    RouteSummary, ScheduleSummary,
};
use bigwing_core::catalog::{Airline, FlightDetails, FlightOption, Location, RouteDetails, Schedule};
use bigwing_core::identity::{AuthUser, TokenVerifier};
use bigwing_core::repository::{BookingRepository, FlightRepository, LocationRepository};
use bigwing_core::search::SearchLeg;
use bigwing_core::{CoreError, CoreResult};
use bigwing_shared::{Masked, PageRequest, PaginatedResponse};

pub const SECRET: &str = "integration-test-secret";
pub const AUDIENCE: &str = "authenticated";

pub fn token_for(user_id: Uuid) -> String {
    let claims = json!({
        "sub": user_id,
        "email": format!("{}@example.com", user_id.simple()),
        "role": "authenticated",
        "aud": AUDIENCE,
        "exp": Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn verifier() -> Arc<JwtVerifier> {
    Arc::new(JwtVerifier::new(&Masked(SECRET.to_string()), AUDIENCE))
}

fn location(code: &str, name: &str, city: &str) -> Location {
    Location {
        id: Uuid::new_v4(),
        name: name.to_string(),
        code: code.to_string(),
        city: city.to_string(),
        country: "USA".to_string(),
    }
}

fn airline() -> Airline {
    Airline {
        id: Uuid::new_v4(),
        name: "Big Wing Air".to_string(),
        code: "BW".to_string(),
        logo_url: None,
        country: "USA".to_string(),
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// Enforces one active booking per (user, schedule) under a single lock, like the
/// partial unique index does.
#[derive(Default)]
pub struct MemoryBookings {
    rows: Mutex<Vec<Booking>>,
    status_polls: AtomicUsize,
    fail_status: AtomicBool,
}

impl MemoryBookings {
    pub fn set_status(&self, booking_id: Uuid, status: BookingStatus) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|b| b.id == booking_id) {
            row.booking_status = status;
        }
    }

    pub fn remove(&self, booking_id: Uuid) {
        self.rows.lock().unwrap().retain(|b| b.id != booking_id);
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn status_polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }

    /// Makes every later status read fail like a lost database connection.
    pub fn break_status_reads(&self) {
        self.fail_status.store(true, Ordering::SeqCst);
    }

    pub fn seed(&self, user_id: Uuid, status: BookingStatus) -> Booking {
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id,
            flight_id: Uuid::new_v4(),
            route_id: Uuid::new_v4(),
            schedule_id: Uuid::new_v4(),
            booking_status: status,
            total_price: 320.0,
            is_return: false,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(booking.clone());
        booking
    }

    fn details(booking: &Booking) -> BookingDetails {
        let origin = location("LAX", "Los Angeles International Airport", "Los Angeles");
        let destination = location("JFK", "John F. Kennedy International Airport", "New York");
        let airlines = airline();
        BookingDetails {
            booking: booking.clone(),
            schedules: ScheduleSummary {
                id: booking.schedule_id,
                departure_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                arrival_time: NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
                frequency: "Daily".to_string(),
            },
            routes: RouteSummary {
                id: booking.route_id,
                flight_id: booking.flight_id,
                origin_id: origin.id,
                origin,
                destination,
                is_direct: true,
            },
            flights: FlightSummary {
                id: booking.flight_id,
                airline_id: airlines.id,
                airlines,
                flight_number: "BW101".to_string(),
                flight_status: "Scheduled".to_string(),
            },
        }
    }
}

#[async_trait]
impl BookingRepository for MemoryBookings {
    async fn insert_booking(&self, booking: &NewBooking) -> CoreResult<Booking> {
        let mut rows = self.rows.lock().unwrap();
        let taken = rows.iter().any(|b| {
            b.user_id == booking.user_id
                && b.schedule_id == booking.schedule_id
                && b.booking_status.is_active()
        });
        if taken {
            return Err(CoreError::Conflict("bookings_active_schedule_unique".to_string()));
        }
        let stored = Booking {
            id: Uuid::new_v4(),
            user_id: booking.user_id,
            flight_id: booking.flight_id,
            route_id: booking.route_id,
            schedule_id: booking.schedule_id,
            booking_status: booking.booking_status,
            total_price: booking.total_price,
            is_return: booking.is_return,
            created_at: booking.created_at,
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn has_active_booking(&self, schedule_id: Uuid, user_id: Uuid) -> CoreResult<bool> {
        Ok(self.rows.lock().unwrap().iter().any(|b| {
            b.schedule_id == schedule_id && b.user_id == user_id && b.booking_status.is_active()
        }))
    }

    async fn list_bookings(&self, user_id: Uuid) -> CoreResult<Vec<BookingDetails>> {
        let mut mine: Vec<Booking> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine.iter().map(Self::details).collect())
    }

    async fn get_booking(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<Option<BookingDetails>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == booking_id && b.user_id == user_id)
            .map(Self::details))
    }

    async fn booking_status(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<Option<BookingStatus>> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(CoreError::storage(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by 10.0.0.7",
            )));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == booking_id && b.user_id == user_id)
            .map(|b| b.booking_status))
    }
}

// ============================================================================
// Catalog
// ============================================================================

pub struct MemoryFlights {
    pub options: Vec<FlightOption>,
    pub flight: FlightDetails,
}

impl MemoryFlights {
    pub fn new() -> Self {
        let lax = location("LAX", "Los Angeles International Airport", "Los Angeles");
        let jfk = location("JFK", "John F. Kennedy International Airport", "New York");
        let airline = airline();
        let flight_id = Uuid::new_v4();

        let mut routes = Vec::new();
        let mut options = Vec::new();
        for (origin, destination) in [(&lax, &jfk), (&jfk, &lax)] {
            let route_id = Uuid::new_v4();
            let mut schedules = Vec::new();
            for (hour, price) in [(14, 280.0), (8, 320.0), (8, 300.0)] {
                let schedule = Schedule {
                    id: Uuid::new_v4(),
                    route_id,
                    departure_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                    arrival_time: NaiveTime::from_hms_opt(hour + 5, 30, 0).unwrap(),
                    frequency: "Daily".to_string(),
                    price,
                };
                options.push(FlightOption {
                    flight_id,
                    flight_number: "BW101".to_string(),
                    airline_name: airline.name.clone(),
                    airline_code: airline.code.clone(),
                    route_id,
                    origin_name: origin.name.clone(),
                    origin_code: origin.code.clone(),
                    destination_name: destination.name.clone(),
                    destination_code: destination.code.clone(),
                    schedule_id: schedule.id,
                    departure_date: chrono::NaiveDate::MIN,
                    departure_time: schedule.departure_time,
                    arrival_time: schedule.arrival_time,
                    frequency: schedule.frequency.clone(),
                    price,
                    flight_status: "Scheduled".to_string(),
                });
                schedules.push(schedule);
            }
            routes.push(RouteDetails {
                id: route_id,
                is_direct: true,
                origin: origin.clone(),
                destination: destination.clone(),
                schedules,
            });
        }

        let flight = FlightDetails {
            id: flight_id,
            flight_number: "BW101".to_string(),
            cabin_class: Some("Economy".to_string()),
            flight_status: "Scheduled".to_string(),
            price: 300.0,
            total_duration_minutes: Some(330),
            airline,
            routes,
        };
        Self { options, flight }
    }
}

#[async_trait]
impl FlightRepository for MemoryFlights {
    async fn search_flights(
        &self,
        leg: &SearchLeg,
        page: PageRequest,
    ) -> CoreResult<PaginatedResponse<FlightOption>> {
        let mut matching: Vec<FlightOption> = self
            .options
            .iter()
            .filter(|o| o.origin_code == leg.origin_code && o.destination_code == leg.destination_code)
            .cloned()
            .map(|mut o| {
                o.departure_date = leg.departure_date;
                o
            })
            .collect();
        matching.sort_by(|a, b| {
            a.departure_time
                .cmp(&b.departure_time)
                .then(a.price.total_cmp(&b.price))
        });
        Ok(PaginatedResponse::from_all(matching, page))
    }

    async fn get_flight(&self, flight_id: Uuid) -> CoreResult<Option<FlightDetails>> {
        Ok((self.flight.id == flight_id).then(|| self.flight.clone()))
    }
}

/// Fifteen locations named `Location 01` .. `Location 15` with codes `L01` .. `L15`.
pub struct MemoryLocations {
    rows: Vec<Location>,
}

impl MemoryLocations {
    pub fn new() -> Self {
        // Inserted out of order; reads sort by name.
        let rows = (1..=15)
            .rev()
            .map(|i| location(&format!("L{:02}", i), &format!("Location {:02}", i), "Somewhere"))
            .collect();
        Self { rows }
    }
}

#[async_trait]
impl LocationRepository for MemoryLocations {
    async fn search_locations(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> CoreResult<PaginatedResponse<Location>> {
        let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        let mut matching: Vec<Location> = self
            .rows
            .iter()
            .filter(|l| l.code.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(PaginatedResponse::from_all(matching, page))
    }
}

// ============================================================================
// Verifier whose tokens can be revoked mid-stream
// ============================================================================

pub struct RevocableVerifier {
    pub user: AuthUser,
    revoked: AtomicBool,
}

impl RevocableVerifier {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user: AuthUser {
                id: user_id,
                email: None,
                role: "authenticated".to_string(),
            },
            revoked: AtomicBool::new(false),
        }
    }

    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenVerifier for RevocableVerifier {
    async fn verify(&self, _token: &str) -> CoreResult<AuthUser> {
        if self.revoked.load(Ordering::SeqCst) {
            return Err(CoreError::IdentityError("token revoked".to_string()));
        }
        Ok(self.user.clone())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct TestApp {
    pub router: Router,
    pub bookings: Arc<MemoryBookings>,
    pub flights: Arc<MemoryFlights>,
}

pub fn test_app() -> TestApp {
    test_app_with_origins(&[])
}

pub fn test_app_with_origins(cors_whitelist: &[String]) -> TestApp {
    let bookings = Arc::new(MemoryBookings::default());
    let flights = Arc::new(MemoryFlights::new());

    let state = AppState {
        bookings: BookingManager::new(bookings.clone()),
        flight_repo: flights.clone(),
        location_repo: Arc::new(MemoryLocations::new()),
        verifier: verifier(),
        stream_interval: Duration::from_secs(5),
    };

    TestApp {
        router: app(state, cors_whitelist),
        bookings,
        flights,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
