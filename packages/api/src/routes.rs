use serde::{Deserialize, Serialize};

pub mod health;
pub mod ping;
pub mod sales;

/// `?where=` as a JSON string
#[derive(Clone, Deserialize, Serialize, Debug, Default)]
pub struct WhereParams {
    #[serde(rename = "where")]
    pub where_clause: Option<String>,
}

/// `?filter=` as a JSON string
#[derive(Clone, Deserialize, Serialize, Debug, Default)]
pub struct FilterParams {
    pub filter: Option<String>,
}

#[derive(Clone, Deserialize, Serialize, Debug, PartialEq, Eq)]
pub struct CountResponse {
    pub count: u64,
}
