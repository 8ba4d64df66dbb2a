//! Sales store backends
//!
//! This module provides one gateway trait over interchangeable stores:
//! - In-memory store (local development and tests)
//! - SeaORM database store (PostgreSQL, SQLite)

mod traits;

pub mod database;
pub mod memory;

use std::sync::Arc;

pub use database::DatabaseSalesStore;
pub use memory::MemorySalesStore;
pub use traits::{SalesStore, StoreError, StoreResult};

/// Store provider selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreProvider {
    /// Process-local store, lost on restart
    Memory,
    /// SeaORM connection
    Database { url: String, max_connections: u32 },
}

impl StoreProvider {
    pub fn name(&self) -> &'static str {
        match self {
            StoreProvider::Memory => "memory",
            StoreProvider::Database { .. } => "database",
        }
    }
}

/// Create a store backend, preparing its schema when it has one
pub async fn create_store(provider: &StoreProvider) -> StoreResult<Arc<dyn SalesStore>> {
    match provider {
        StoreProvider::Memory => {
            tracing::warn!("Using in-memory sales store; data is lost on restart");
            Ok(Arc::new(MemorySalesStore::new()))
        }
        StoreProvider::Database {
            url,
            max_connections,
        } => {
            let store = DatabaseSalesStore::connect(url, *max_connections).await?;
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
    }
}
