use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use bigwing_core::CoreError;

use crate::app_config::DatabaseConfig;

/// Name of the partial unique index guarding one active booking per (user, schedule).
pub const ACTIVE_BOOKING_INDEX: &str = "bookings_active_schedule_unique";

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Driver errors pass through unchanged as `CoreError::Storage`.
pub(crate) fn storage_error(err: sqlx::Error) -> CoreError {
    CoreError::storage(err)
}

/// Constraint violations carry domain meaning on insert; everything else is storage.
pub(crate) fn insert_error(err: sqlx::Error) -> CoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some(ACTIVE_BOOKING_INDEX) {
            return CoreError::Conflict(ACTIVE_BOOKING_INDEX.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return CoreError::ValidationError(
                "scheduleId, routeId and flightId must exist and belong to the same flight"
                    .to_string(),
            );
        }
    }
    storage_error(err)
}
