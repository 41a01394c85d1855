use std::net::SocketAddr;
use std::sync::Arc;

use formguard_core::config::ValidatorConfig;
use formguard_core::validation::evaluator::Validator;
use formguard_db::PgPresenceVerifier;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formguard_api::config::ServerConfig;
use formguard_api::router::build_app_router;
use formguard_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formguard_api=debug,formguard_core=info,tower_http=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    let validator_config = ValidatorConfig::from_env().expect("Invalid validator configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        probe_timeout_ms = validator_config.probe_timeout.as_millis() as u64,
        probe_attempts = validator_config.probe_attempts,
        "Loaded configuration"
    );

    let mut validator = Validator::new(validator_config);

    // --- Database (optional) ---
    let pool = match &config.database_url {
        Some(database_url) => {
            let pool = formguard_db::create_pool(database_url, config.db_max_connections)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            formguard_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            validator = validator.with_presence(Arc::new(PgPresenceVerifier::new(pool.clone())));
            Some(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; unique and exists rules will always fail");
            None
        }
    };

    let addr = SocketAddr::new(config.host, config.port);
    let state = AppState {
        validator: Arc::new(validator),
        config: Arc::new(config.clone()),
        pool,
    };
    let app = build_app_router(state, &config);

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
