use axum::{Router, middleware::from_fn, routing::get};
use state::AppState;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, decompression::RequestDecompressionLayer,
    trace::TraceLayer,
};

pub mod error;
mod middleware;
pub mod routes;
pub mod seed;
pub mod state;

pub use axum;
pub use sales_analytics_storage as storage;

/// The sales HTTP surface, without process-level concerns such as metrics
/// export or listener setup.
pub fn construct_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(routes::ping::ping))
        .nest("/health", routes::health::routes())
        .nest("/sales", routes::sales::routes())
        .with_state(state)
        .layer(from_fn(middleware::error_reporting::error_reporting_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new()),
        )
}
