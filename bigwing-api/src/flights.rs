use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use bigwing_core::catalog::{FlightDetails, FlightOption, RoundTripFlights};
use bigwing_core::search::{OneWaySearchQuery, RoundTripSearchQuery};
use bigwing_core::CoreError;
use bigwing_shared::{ApiResponse, PaginatedResponse};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flights/one-way", get(search_one_way))
        .route("/flights/round-trip", get(search_round_trip))
        .route("/flights/{flight_id}", get(get_flight))
}

#[utoipa::path(
    get,
    path = "/flights/one-way",
    tag = "flights",
    params(OneWaySearchQuery),
    responses(
        (status = 200, description = "Matching schedules, earliest departure first", body = ApiResponse<PaginatedResponse<FlightOption>>),
        (status = 400, description = "Missing or malformed query parameters")
    )
)]
pub(crate) async fn search_one_way(
    State(state): State<AppState>,
    query: Result<Query<OneWaySearchQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PaginatedResponse<FlightOption>>>, AppError> {
    let Query(query) = query?;
    let (leg, page) = query.into_leg()?;

    let flights = state.flight_repo.search_flights(&leg, page).await?;
    info!(
        "One-way search {} -> {} on {}: {} results",
        leg.origin_code,
        leg.destination_code,
        leg.departure_date,
        flights.data.len()
    );

    Ok(Json(ApiResponse::ok(flights).with_message("Flights fetched successfully")))
}

#[utoipa::path(
    get,
    path = "/flights/round-trip",
    tag = "flights",
    params(RoundTripSearchQuery),
    responses(
        (status = 200, description = "Outbound and return schedules, paged independently", body = ApiResponse<RoundTripFlights>),
        (status = 400, description = "Missing or malformed query parameters, or returnDate before departureDate")
    )
)]
pub(crate) async fn search_round_trip(
    State(state): State<AppState>,
    query: Result<Query<RoundTripSearchQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<RoundTripFlights>>, AppError> {
    let Query(query) = query?;
    let (outbound, inbound, page) = query.into_legs()?;

    let (from, return_flights) = tokio::try_join!(
        state.flight_repo.search_flights(&outbound, page),
        state.flight_repo.search_flights(&inbound, page),
    )?;

    Ok(Json(
        ApiResponse::ok(RoundTripFlights { from, return_flights })
            .with_message("Flights fetched successfully"),
    ))
}

#[utoipa::path(
    get,
    path = "/flights/{flight_id}",
    tag = "flights",
    params(("flight_id" = Uuid, Path, description = "Flight id")),
    responses(
        (status = 200, description = "The flight with its airline, routes and schedules", body = ApiResponse<FlightDetails>),
        (status = 400, description = "flight_id is not a UUID"),
        (status = 404, description = "Flight not found")
    )
)]
pub(crate) async fn get_flight(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<FlightDetails>>, AppError> {
    let Path(flight_id) = path?;
    let flight = state
        .flight_repo
        .get_flight(flight_id)
        .await?
        .ok_or_else(|| CoreError::NotFound("Flight".to_string()))?;

    Ok(Json(ApiResponse::ok(flight).with_message("Flight fetched successfully")))
}
