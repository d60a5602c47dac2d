use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use bigwing_api::{app, middleware::JwtVerifier, AppState};
use bigwing_core::booking::BookingManager;
use bigwing_store::{app_config::Config, DbClient, PgBookingRepository, PgFlightRepository, PgLocationRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bigwing_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Big Wing API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    if config.database.run_migrations {
        db.migrate().await.context("Failed to run migrations")?;
    }

    let app_state = AppState {
        bookings: BookingManager::new(Arc::new(PgBookingRepository::new(db.pool.clone()))),
        flight_repo: Arc::new(PgFlightRepository::new(db.pool.clone())),
        location_repo: Arc::new(PgLocationRepository::new(db.pool.clone())),
        verifier: Arc::new(JwtVerifier::new(&config.auth.jwt_secret, &config.auth.audience)),
        stream_interval: config.stream.poll_interval(),
    };

    let app = app(app_state, &config.server.cors_whitelist);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
