//! In-memory sales store
//!
//! Used for local development and tests where no database is configured.
//! Records live in a `BTreeMap` so that unordered queries come back in id
//! order, matching the database backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{SalesStore, StoreError, StoreResult};
use crate::Sales;
use crate::filter::{Filter, Where};
use crate::model::{SalesData, SalesPatch};

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<i32, Sales>,
    last_id: i32,
}

/// In-memory store implementation
#[derive(Clone, Default)]
pub struct MemorySalesStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemorySalesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }
}

fn matches(where_clause: Option<&Where>, record: &Sales) -> bool {
    where_clause.is_none_or(|clause| clause.matches(record))
}

#[async_trait::async_trait]
impl SalesStore for MemorySalesStore {
    async fn create(&self, data: SalesData) -> StoreResult<Sales> {
        let mut inner = self.inner.write();
        inner.last_id += 1;
        let record = data.into_record(inner.last_id);
        inner.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Sales>> {
        let inner = self.inner.read();
        Ok(filter.apply(inner.records.values()))
    }

    async fn find_by_id(&self, id: i32) -> StoreResult<Sales> {
        self.inner
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn count(&self, where_clause: Option<&Where>) -> StoreResult<u64> {
        let inner = self.inner.read();
        let count = inner
            .records
            .values()
            .filter(|record| matches(where_clause, record))
            .count();
        Ok(count as u64)
    }

    async fn update_all(
        &self,
        patch: &SalesPatch,
        where_clause: Option<&Where>,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.write();
        let mut updated = 0;
        for record in inner.records.values_mut() {
            if matches(where_clause, record) {
                patch.apply(record);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn update_by_id(&self, id: i32, patch: &SalesPatch) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let record = inner.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        patch.apply(record);
        Ok(())
    }

    async fn replace_by_id(&self, id: i32, data: SalesData) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let record = inner.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *record = data.into_record(id);
        Ok(())
    }

    async fn delete_by_id(&self, id: i32) -> StoreResult<()> {
        self.inner
            .write()
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
