use bigwing_shared::PaginatedResponse;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Airline {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub logo_url: Option<String>,
    pub country: String,
}

/// One bookable schedule of a route, flattened for search results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlightOption {
    pub flight_id: Uuid,
    pub flight_number: String,
    pub airline_name: String,
    pub airline_code: String,
    pub route_id: Uuid,
    pub origin_name: String,
    pub origin_code: String,
    pub destination_name: String,
    pub destination_code: String,
    pub schedule_id: Uuid,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub frequency: String,
    pub price: f64,
    pub flight_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct RoundTripFlights {
    pub from: PaginatedResponse<FlightOption>,
    #[serde(rename = "return")]
    pub return_flights: PaginatedResponse<FlightOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Uuid,
    pub route_id: Uuid,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub frequency: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteDetails {
    pub id: Uuid,
    pub is_direct: bool,
    pub origin: Location,
    pub destination: Location,
    pub schedules: Vec<Schedule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlightDetails {
    pub id: Uuid,
    pub flight_number: String,
    pub cabin_class: Option<String>,
    pub flight_status: String,
    pub price: f64,
    pub total_duration_minutes: Option<i32>,
    pub airline: Airline,
    pub routes: Vec<RouteDetails>,
}
