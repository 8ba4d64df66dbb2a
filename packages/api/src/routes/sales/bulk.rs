use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use sales_analytics_storage::{SalesPatch, Where};
use serde_json::Value;

use crate::{
    error::ApiError,
    routes::{CountResponse, WhereParams},
    state::AppState,
};

fn parse_where(params: &WhereParams) -> Result<Option<Where>, ApiError> {
    Ok(params
        .where_clause
        .as_deref()
        .map(Where::parse)
        .transpose()?)
}

/// GET /sales/count?where=
#[tracing::instrument(name = "GET /sales/count", skip(state, query))]
pub async fn count_sales(
    State(state): State<AppState>,
    query: Result<Query<WhereParams>, QueryRejection>,
) -> Result<Json<CountResponse>, ApiError> {
    let Query(params) = query?;
    let where_clause = parse_where(&params)?;

    let count = state.store.count(where_clause.as_ref()).await?;
    Ok(Json(CountResponse { count }))
}

/// PATCH /sales?where= - Apply a partial update to every matching record
#[tracing::instrument(name = "PATCH /sales", skip(state, query, body))]
pub async fn update_all_sales(
    State(state): State<AppState>,
    query: Result<Query<WhereParams>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CountResponse>, ApiError> {
    let Query(params) = query?;
    let where_clause = parse_where(&params)?;
    let Json(body) = body?;
    let patch = SalesPatch::from_json(&body)?;

    let count = state.store.update_all(&patch, where_clause.as_ref()).await?;

    tracing::info!(updated = count, "Sales records updated in bulk");
    Ok(Json(CountResponse { count }))
}
