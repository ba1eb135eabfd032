use std::sync::Arc;

use crate::store::ContactStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
    pub deduplicate_contacts: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self {
            store,
            deduplicate_contacts: false,
        }
    }

    pub fn with_deduplication(mut self, enabled: bool) -> Self {
        self.deduplicate_contacts = enabled;
        self
    }
}
