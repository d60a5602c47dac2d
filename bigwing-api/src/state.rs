use std::sync::Arc;
use std::time::Duration;

use bigwing_core::booking::BookingManager;
use bigwing_core::identity::TokenVerifier;
use bigwing_core::repository::{FlightRepository, LocationRepository};

#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingManager,
    pub flight_repo: Arc<dyn FlightRepository>,
    pub location_repo: Arc<dyn LocationRepository>,
    pub verifier: Arc<dyn TokenVerifier>,
    /// Period between booking status polls on an open status stream.
    pub stream_interval: Duration,
}
