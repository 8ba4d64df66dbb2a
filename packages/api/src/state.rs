use std::sync::Arc;

use chrono::{DateTime, Utc};
use sales_analytics_storage::SalesStore;

pub type AppState = Arc<State>;

pub struct State {
    /// Shared by every request; consistency is left to the backing store
    pub store: Arc<dyn SalesStore>,
    pub started_at: DateTime<Utc>,
}

impl State {
    pub fn new(store: Arc<dyn SalesStore>) -> Self {
        Self {
            store,
            started_at: Utc::now(),
        }
    }
}
