//! OpenAPI description of the HTTP API. The JSON document is always served at
//! [`SPEC_PATH`]; the `swagger-ui` feature adds the browsable UI at [`DOCS_PATH`].

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;
use crate::{bookings, flights, locations, status_stream};

pub const DOCS_PATH: &str = "/api/docs";
pub const SPEC_PATH: &str = "/api/docs/openapi.json";

/// Name of the bearer scheme the protected operations refer to.
pub const BEARER_SCHEME: &str = "bearer";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Big Wing API",
        description = "Flight search, airport lookup, bookings and live booking status."
    ),
    paths(
        crate::health,
        bookings::create_booking,
        bookings::list_bookings,
        bookings::has_booking,
        bookings::get_booking,
        status_stream::status_stream,
        flights::search_one_way,
        flights::search_round_trip,
        flights::get_flight,
        locations::list_locations,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "bookings", description = "Bookings of the authenticated user"),
        (name = "flights", description = "Flight search and details"),
        (name = "locations", description = "Airports")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    utoipa_swagger_ui::SwaggerUi::new(DOCS_PATH)
        .url(SPEC_PATH, ApiDoc::openapi())
        .into()
}

#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    Router::new().route(SPEC_PATH, axum::routing::get(openapi_json))
}

#[cfg(not(feature = "swagger-ui"))]
async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}
