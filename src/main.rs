use std::sync::Arc;

use axum::http::Method;
use player_api::config::Config;
use player_api::db::SqliteStore;
use player_api::reconcile::{self, Reconciler};
use player_api::retry::{retry_with_backoff, Backoff};
use player_api::routes::{self, AppState};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting api server...");

    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| fatal(&e));
    tracing::info!("CSV snapshot: {}", config.csv_path.display());

    let store = retry_with_backoff(Backoff::default(), tokio::time::sleep, || {
        SqliteStore::connect(&config.database_url)
    })
    .await
    .unwrap_or_else(|e| fatal(&format!("Could not connect to the database: {e}")));

    tracing::info!("Database connection established.");

    store
        .ensure_schema()
        .await
        .unwrap_or_else(|e| fatal(&format!("Could not create tables: {e}")));

    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        config.csv_path.clone(),
        config.sync_strategy,
    ));

    let sync = if config.sync_on_start {
        tracing::info!("Populating the player database");
        if let Err(e) = reconciler.run_once().await {
            tracing::error!("Initial reconciliation failed: {}", e);
        }
        reconcile::spawn_periodic(Arc::clone(&reconciler), config.sync_interval)
    } else {
        reconcile::spawn_periodic_at(
            Arc::clone(&reconciler),
            tokio::time::Instant::now(),
            config.sync_interval,
        )
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    let state = AppState::new(store).with_page_sizes(config.default_page_size, config.max_page_size);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| fatal(&format!("Failed to bind to {addr}: {e}")));

    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    sync.shutdown().await;
    tracing::info!("Server stopped.");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn fatal(message: &dyn std::fmt::Display) -> ! {
    tracing::error!("{}", message);
    std::process::exit(1);
}
