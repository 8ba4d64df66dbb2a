use std::collections::BTreeMap;

use axum::Json;
use axum::http::{HeaderMap, Uri};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Echo of the incoming request, handy for checking proxies and routing.
#[derive(Serialize, Deserialize, Debug)]
pub struct PingResponse {
    pub greeting: String,
    pub date: DateTime<Utc>,
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

#[tracing::instrument(name = "GET /ping", skip(headers))]
pub async fn ping(uri: Uri, headers: HeaderMap) -> Json<PingResponse> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    Json(PingResponse {
        greeting: "Hello from the sales analytics service".to_string(),
        date: Utc::now(),
        url: uri.to_string(),
        headers,
    })
}
