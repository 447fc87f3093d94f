//! Library API server
//!
//! Wires configuration, stores, services, the HTTP router and the daily
//! late-loan job together.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_api::{
    api,
    clock::{Clock, SystemClock},
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    scheduler::{self, LateLoanJob},
    services::{email::SmtpMailTransport, Services},
    AppState,
};

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("library_api={},tower_http=debug", logging.level).into());

    let json = logging.format.eq_ignore_ascii_case("json");
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

async fn connect(config: &AppConfig) -> anyhow::Result<Repository> {
    if config.database.is_in_memory() {
        tracing::warn!("Using the in-memory store, data is lost on shutdown");
        return Ok(Repository::in_memory());
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations completed");

    Ok(Repository::new(pool))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    tracing::info!("Starting Library API v{}", env!("CARGO_PKG_VERSION"));

    let repository = connect(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mail_transport = Arc::new(SmtpMailTransport::new(&config.email)?);
    let services = Services::new(
        repository.clone(),
        clock.clone(),
        config.email.clone(),
        mail_transport,
    );

    if config.scheduler.enabled {
        let run_at = config
            .scheduler
            .run_at_time()
            .with_context(|| format!("Invalid scheduler.run_at: {}", config.scheduler.run_at))?;
        let job = LateLoanJob::new(
            services.loans.clone(),
            services.email.clone(),
            config.scheduler.late_loans_message.clone(),
        );
        scheduler::spawn_daily(job, run_at, clock);
        tracing::info!("Late loan job scheduled daily at {} UTC", run_at);
    }

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        repository,
    };
    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
