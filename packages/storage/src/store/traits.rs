//! Gateway trait definitions

use crate::filter::{Filter, Where};
use crate::model::{SalesData, SalesPatch};
use crate::Sales;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Sales record not found: {0}")]
    NotFound(i32),

    #[error("Invalid sales record: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Persistence gateway for sales records
///
/// Each implementation maps these calls onto one backing store. No caching,
/// retries or transactions happen at this layer: every mutating call goes
/// straight to the store and backend failures come back as
/// [`StoreError::Database`].
#[async_trait::async_trait]
pub trait SalesStore: Send + Sync {
    /// Insert a record and return it with its store-generated id
    async fn create(&self, data: SalesData) -> StoreResult<Sales>;

    /// Records matching the filter, in the filter's order (id order by default)
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Sales>>;

    async fn find_by_id(&self, id: i32) -> StoreResult<Sales>;

    /// Number of records matching the where clause, or all records
    async fn count(&self, where_clause: Option<&Where>) -> StoreResult<u64>;

    /// Apply a partial update to every matching record and return how many
    /// records matched. Matching nothing is not an error.
    async fn update_all(&self, patch: &SalesPatch, where_clause: Option<&Where>)
    -> StoreResult<u64>;

    async fn update_by_id(&self, id: i32, patch: &SalesPatch) -> StoreResult<()>;

    /// Overwrite every non-id field of an existing record
    async fn replace_by_id(&self, id: i32, data: SalesData) -> StoreResult<()>;

    async fn delete_by_id(&self, id: i32) -> StoreResult<()>;

    /// Round-trip to the backing store
    async fn ping(&self) -> StoreResult<()>;
}
