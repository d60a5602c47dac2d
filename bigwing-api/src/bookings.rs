use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use bigwing_core::booking::{BookingDetails, CreateBookingRequest, CreatedBooking};
use bigwing_core::identity::AuthUser;
use bigwing_shared::ApiResponse;

use crate::error::AppError;
use crate::state::AppState;

/// Routes that need a bearer token. The caller layers `require_user` on top.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/verify", get(has_booking))
        .route("/bookings/has-booking", get(has_booking))
        .route("/bookings/{booking_id}", get(get_booking))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HasBookingQuery {
    schedule_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created with status Pending", body = ApiResponse<CreatedBooking>),
        (status = 400, description = "Malformed body, or ids that do not belong to one flight"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 409, description = "Booking already exists")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedBooking>>), AppError> {
    let Json(req) = payload?;
    let created = state.bookings.create_booking(&user, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(created).with_message("Booking created successfully")),
    ))
}

/// Also served as `/bookings/has-booking`.
#[utoipa::path(
    get,
    path = "/bookings/verify",
    tag = "bookings",
    params(HasBookingQuery),
    responses(
        (status = 200, description = "Whether the caller holds a Pending or Confirmed booking for the schedule", body = ApiResponse<bool>),
        (status = 400, description = "scheduleId is missing or not a UUID"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn has_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<HasBookingQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let Query(query) = query?;
    let exists = state.bookings.has_booking(query.schedule_id, user.id).await?;
    Ok(Json(ApiResponse::ok(exists)))
}

#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    responses(
        (status = 200, description = "The caller's bookings, newest first", body = ApiResponse<Vec<BookingDetails>>),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<BookingDetails>>>, AppError> {
    let bookings = state.bookings.list_bookings(user.id).await?;
    Ok(Json(ApiResponse::ok(bookings).with_message("Bookings fetched successfully")))
}

#[utoipa::path(
    get,
    path = "/bookings/{booking_id}",
    tag = "bookings",
    params(("booking_id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "The booking with its schedule, route and flight", body = ApiResponse<BookingDetails>),
        (status = 400, description = "booking_id is not a UUID"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<BookingDetails>>, AppError> {
    let Path(booking_id) = path?;
    let booking = state.bookings.get_booking(booking_id, user.id).await?;
    Ok(Json(ApiResponse::ok(booking).with_message("Booking fetched successfully")))
}
