#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use axum::{Router, middleware, routing::get};
use sales_analytics_api::{construct_router, seed, state::State};
use sales_analytics_storage::create_store;
use std::sync::Arc;

mod config;
mod metrics;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    metrics::init_telemetry();

    tracing::info!("Starting sales analytics service");

    let config = config::Config::from_env()?;
    tracing::info!(
        "Loaded configuration: store={}, seed={:?}",
        config.store.name(),
        config.seed
    );

    let store = create_store(&config.store).await?;

    // Seeding finishes before the first request can be accepted.
    let outcome = seed::seed_if_empty(store.as_ref(), config.seed).await?;
    tracing::info!(?outcome, "Startup seeding finished");

    let state = Arc::new(State::new(store));

    let app = Router::new()
        .merge(construct_router(state))
        .route("/metrics", get(metrics::handler))
        .layer(middleware::from_fn(metrics::metrics_middleware));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
