use axum::{Router, routing::get};

use crate::state::AppState;

pub mod analytics;
pub mod bulk;
pub mod records;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(records::find_sales)
                .post(records::create_sales)
                .patch(bulk::update_all_sales),
        )
        .route("/count", get(bulk::count_sales))
        // Analytics
        .route(
            "/analytics/{country}/{year}",
            get(analytics::count_for_year),
        )
        .route(
            "/analytics/{country}/{year}/{month}",
            get(analytics::count_for_month),
        )
        .route(
            "/{id}",
            get(records::get_sales)
                .patch(records::update_sales)
                .put(records::replace_sales)
                .delete(records::delete_sales),
        )
}
