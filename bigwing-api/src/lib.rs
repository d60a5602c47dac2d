use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use bigwing_shared::ApiResponse;

pub mod bookings;
pub mod error;
pub mod flights;
pub mod locations;
pub mod middleware;
pub mod openapi;
pub mod state;
pub mod status_stream;

pub use state::AppState;

pub fn app(state: AppState, cors_whitelist: &[String]) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(cors_whitelist))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let protected = bookings::routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::require_user,
    ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .merge(status_stream::routes())
        .merge(flights::routes())
        .merge(locations::routes())
        .merge(openapi::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Exact-match origin list. An empty list admits no cross-origin caller.
fn allowed_origins(whitelist: &[String]) -> AllowOrigin {
    if whitelist.is_empty() {
        warn!("CORS whitelist is empty; cross-origin requests will be refused");
    }

    let origins: Vec<HeaderValue> = whitelist
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    AllowOrigin::list(origins)
}

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
async fn health() -> Json<ApiResponse<()>> {
    Json(ApiResponse::notice("ok"))
}
