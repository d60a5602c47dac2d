//! Server-Sent Events feed of one booking's status.
//!
//! The stream polls: each tick re-verifies the caller's token and re-reads the
//! status, then emits a `booking-status` event whether or not it changed. The
//! first tick fires as soon as the stream is polled. A failed tick emits one
//! `error` event carrying the failure envelope and ends the stream. Dropping the
//! stream drops its timer.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use chrono::Utc;
use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, error};
use uuid::Uuid;

use bigwing_core::booking::{BookingManager, StatusSnapshot};
use bigwing_core::identity::TokenVerifier;
use bigwing_shared::{ApiResponse, Masked};

use crate::error::AppError;
use crate::middleware::auth::{authenticate, INVALID_TOKEN};
use crate::state::AppState;

pub const STATUS_EVENT: &str = "booking-status";
pub const ERROR_EVENT: &str = "error";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings/{booking_id}/status-stream", get(status_stream))
        .route("/bookings/{booking_id}/status", get(status_stream))
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamQuery {
    token: Option<Masked<String>>,
}

/// Everything one tick needs to produce a snapshot.
pub struct StatusPoller {
    bookings: BookingManager,
    verifier: Arc<dyn TokenVerifier>,
    token: Masked<String>,
    booking_id: Uuid,
}

impl StatusPoller {
    pub fn new(
        bookings: BookingManager,
        verifier: Arc<dyn TokenVerifier>,
        token: Masked<String>,
        booking_id: Uuid,
    ) -> Self {
        Self {
            bookings,
            verifier,
            token,
            booking_id,
        }
    }

    pub async fn poll(&self) -> Result<StatusSnapshot, AppError> {
        let user = self
            .verifier
            .verify(self.token.expose())
            .await
            .map_err(|_| AppError::AuthenticationError(INVALID_TOKEN.to_string()))?;

        Ok(self.bookings.current_status(self.booking_id, user.id).await?)
    }
}

/// One item per tick of `period`, the first immediately. Ends after the first `Err`.
pub fn status_ticks(
    poller: StatusPoller,
    period: Duration,
) -> impl Stream<Item = Result<StatusSnapshot, AppError>> {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    stream::unfold(Some((poller, ticker)), |state: Option<(StatusPoller, Interval)>| async move {
        let (poller, mut ticker) = state?;
        ticker.tick().await;

        match poller.poll().await {
            Ok(snapshot) => Some((Ok(snapshot), Some((poller, ticker)))),
            Err(err) => Some((Err(err), None)),
        }
    })
}

pub fn status_event(snapshot: StatusSnapshot) -> Event {
    Event::default()
        .event(STATUS_EVENT)
        .id(Utc::now().to_rfc3339())
        .json_data(ApiResponse::ok(snapshot))
        .unwrap_or_else(|e| {
            error!("Failed to encode status event: {}", e);
            fallback_error_event()
        })
}

pub fn error_event(err: &AppError) -> Event {
    Event::default()
        .event(ERROR_EVENT)
        .json_data(err.envelope())
        .unwrap_or_else(|e| {
            error!("Failed to encode error event: {}", e);
            fallback_error_event()
        })
}

fn fallback_error_event() -> Event {
    Event::default().event(ERROR_EVENT).data(
        r#"{"status":false,"message":"Internal Server Error","error":{"statusCode":500}}"#,
    )
}

#[utoipa::path(
    get,
    path = "/bookings/{booking_id}/status-stream",
    tag = "bookings",
    params(
        ("booking_id" = Uuid, Path, description = "Booking id"),
        ("token" = String, Query, description = "Bearer token; EventSource cannot send headers")
    ),
    responses(
        (status = 200, description = "`booking-status` events on every poll; a final `error` event ends the stream. Also served as `/bookings/{booking_id}/status`.", body = ApiResponse<StatusSnapshot>, content_type = "text/event-stream"),
        (status = 400, description = "booking_id is not a UUID"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Booking not found")
    )
)]
pub(crate) async fn status_stream(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<StreamQuery>, QueryRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let Path(booking_id) = path?;
    let Query(query) = query?;
    let token = query
        .token
        .ok_or_else(|| AppError::AuthenticationError("Missing token".to_string()))?;

    // Refuse before the response starts so the failure keeps its status code.
    let user = authenticate(&state, &token).await?;
    state.bookings.current_status(booking_id, user.id).await?;

    debug!("Status stream opened for booking {} by user {}", booking_id, user.id);

    let poller = StatusPoller::new(
        state.bookings.clone(),
        state.verifier.clone(),
        token,
        booking_id,
    );

    let events = status_ticks(poller, state.stream_interval).map(|tick| {
        Ok::<_, Infallible>(match tick {
            Ok(snapshot) => status_event(snapshot),
            Err(err) => error_event(&err),
        })
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
