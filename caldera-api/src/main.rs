use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use caldera_api::{app, Adapters, AppState};
use caldera_core::inventory::NoopPartnerInventory;
use caldera_store::{
    Config, DbClient, PgBookingRepository, PgCatalogRepository, PgReviewRepository, ResendEmailSender,
};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caldera_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    config.validate().map_err(anyhow::Error::msg)?;
    tracing::info!(
        "Starting Caldera API on port {} ({})",
        config.server.port,
        config.server.environment
    );

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    if config.database.run_migrations {
        db.migrate().await.context("Failed to run migrations")?;
    }

    let email = ResendEmailSender::new(
        config.email.api_url.clone(),
        config.email.api_key.clone().unwrap_or_default(),
        config.email.from_address.clone(),
    );

    let adapters = Adapters {
        catalog: Arc::new(PgCatalogRepository::new(db.pool.clone())),
        bookings: Arc::new(PgBookingRepository::new(db.pool.clone())),
        reviews: Arc::new(PgReviewRepository::new(db.pool.clone())),
        inventory: Arc::new(NoopPartnerInventory),
        email: Arc::new(email),
    };
    let state = AppState::new(adapters, &config).context("Failed to register metrics")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
