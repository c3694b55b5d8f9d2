use anyhow::Context;
use marquee_api::{app, AppState};
use marquee_core::{BookingRepository, BookingService, InMemorySeatInventory, MemoryBookingStore};
use marquee_store::{app_config::Config, DbClient, PgBookingStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    let store: Arc<dyn BookingRepository> = match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Using Postgres booking store");
            Arc::new(PgBookingStore::new(db.pool.clone()))
        }
        None => {
            tracing::warn!("No database configured, using in-memory booking store");
            Arc::new(MemoryBookingStore::new())
        }
    };

    // A restarted process must not re-grant seats that are already persisted.
    let inventory = Arc::new(InMemorySeatInventory::new());
    let claims = store
        .claimed_seats()
        .await
        .context("Failed to load committed seat claims")?;
    inventory.preload(claims);

    let service = Arc::new(BookingService::new(
        inventory,
        store,
        config.booking.release_retry_attempts,
    ));

    let app = app(AppState { service });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    axum::serve(listener, app).await.context("Server exited")?;
    Ok(())
}
