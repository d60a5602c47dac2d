pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod flight_repo;
pub mod location_repo;
pub mod query;

#[cfg(test)]
pub(crate) mod test_support;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use flight_repo::PgFlightRepository;
pub use location_repo::PgLocationRepository;
pub use query::{QueryComposer, Record};
