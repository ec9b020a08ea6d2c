use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod db;
mod handlers;
mod models;
mod routes;
mod services;
mod store;
mod utils;

use api::moneropay::{MoneroPayClient, StatusSource};
use handlers::AppState;
use services::{retention_service, CallbackService};
use store::{MySqlStore, TransactionStore};
use utils::Config;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("moneropos=debug".parse().unwrap()),
        )
        .with_target(true)
        .init();

    info!("Starting moneropos backend...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    info!("Initializing database...");
    let pool = match db::init_db(&config.database_url).await {
        Ok(pool) => {
            info!("Database initialized successfully");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };

    let config = Arc::new(config);
    let store: Arc<dyn TransactionStore> = Arc::new(MySqlStore::new(pool));
    let status_source: Arc<dyn StatusSource> =
        Arc::new(MoneroPayClient::new(config.moneropay_url.clone()));

    let service = Arc::new(CallbackService::new(
        store.clone(),
        status_source,
        config.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = service.clone().start_confirmation_checker(shutdown_rx.clone());
    let retention = retention_service::start_retention_sweep(
        store.clone(),
        config.pending_retention,
        shutdown_rx,
    );

    let app = routes::create_router(AppState { service, store });

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind_addr, e);
            return;
        }
    };
    info!("Listening on {}", config.bind_addr);

    let serve = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received");
    });

    if let Err(e) = serve.await {
        error!("Server error: {}", e);
    }

    // Stop the background tasks before exiting
    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(sweeper, retention);
}
