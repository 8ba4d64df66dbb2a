//! Persistence for sales records.
//!
//! This crate owns the record schema ([`entity::sales`]), the input validation
//! that guards it ([`model`]), the JSON filter language used by list/count and
//! bulk updates ([`filter`]), and the [`SalesStore`] gateway with its two
//! backends:
//! - [`MemorySalesStore`] for local development and tests
//! - [`DatabaseSalesStore`] for sea-orm connections (PostgreSQL, SQLite)

pub mod entity;
pub mod filter;
pub mod model;
pub mod store;

pub use entity::sales::Model as Sales;
pub use filter::{Filter, Order, Where};
pub use model::{SalesData, SalesPatch};
pub use store::{
    DatabaseSalesStore, MemorySalesStore, SalesStore, StoreError, StoreProvider, StoreResult,
    create_store,
};

pub use sea_orm;
