use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use bigwing_core::catalog::Location;
use bigwing_shared::{ApiResponse, PageRequest, PaginatedResponse, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/locations", get(list_locations))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LocationsQuery {
    /// Partial, case-insensitive match on the airport code.
    search: Option<String>,
    /// Defaults to 1.
    page: Option<u32>,
    /// Defaults to 7, at most 100.
    page_size: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/locations",
    tag = "locations",
    params(LocationsQuery),
    responses(
        (status = 200, description = "Airports ordered by name", body = ApiResponse<PaginatedResponse<Location>>),
        (status = 400, description = "page or pageSize out of range")
    )
)]
pub(crate) async fn list_locations(
    State(state): State<AppState>,
    query: Result<Query<LocationsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PaginatedResponse<Location>>>, AppError> {
    let Query(query) = query?;
    let page = PageRequest::new(
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    )
    .ok_or_else(|| {
        AppError::ValidationError(format!(
            "page must be at least 1 and pageSize between 1 and {}",
            MAX_PAGE_SIZE
        ))
    })?;

    let locations = state
        .location_repo
        .search_locations(query.search.as_deref(), page)
        .await?;

    Ok(Json(ApiResponse::ok(locations).with_message("Locations fetched successfully")))
}
