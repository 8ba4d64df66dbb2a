use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use sales_analytics_storage::{Filter, Sales, SalesData, SalesPatch};
use serde_json::Value;

use crate::{error::ApiError, routes::FilterParams, state::AppState};

fn parse_id(raw: &str) -> Result<i32, ApiError> {
    Ok(raw.parse::<i32>()?)
}

/// POST /sales - Create a record; the store assigns the id
#[tracing::instrument(name = "POST /sales", skip(state, body))]
pub async fn create_sales(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Sales>, ApiError> {
    let Json(body) = body?;
    let data = SalesData::from_json(&body)?;

    let created = state.store.create(data).await?;

    tracing::info!(
        sales_id = created.id,
        country = %created.country,
        "Sales record created"
    );

    Ok(Json(created))
}

/// GET /sales?filter= - List records matching an optional filter
#[tracing::instrument(name = "GET /sales", skip(state, query))]
pub async fn find_sales(
    State(state): State<AppState>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<Vec<Sales>>, ApiError> {
    let Query(params) = query?;
    let filter = params
        .filter
        .as_deref()
        .map(Filter::parse)
        .transpose()?
        .unwrap_or_default();

    let records = state.store.find(&filter).await?;
    Ok(Json(records))
}

/// GET /sales/{id}
#[tracing::instrument(name = "GET /sales/{id}", skip(state))]
pub async fn get_sales(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Sales>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.store.find_by_id(id).await?))
}

/// PATCH /sales/{id} - Partial update
#[tracing::instrument(name = "PATCH /sales/{id}", skip(state, body))]
pub async fn update_sales(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let Json(body) = body?;
    let patch = SalesPatch::from_json(&body)?;

    state.store.update_by_id(id, &patch).await?;

    tracing::info!(sales_id = id, "Sales record updated");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /sales/{id} - Replace every field except the id
#[tracing::instrument(name = "PUT /sales/{id}", skip(state, body))]
pub async fn replace_sales(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let Json(body) = body?;
    let data = SalesData::from_json_for(id, &body)?;

    state.store.replace_by_id(id, data).await?;

    tracing::info!(sales_id = id, "Sales record replaced");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /sales/{id}
#[tracing::instrument(name = "DELETE /sales/{id}", skip(state))]
pub async fn delete_sales(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    state.store.delete_by_id(id).await?;

    tracing::info!(sales_id = id, "Sales record deleted");
    Ok(StatusCode::NO_CONTENT)
}
