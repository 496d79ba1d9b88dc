use parking_lot::RwLock;
use std::collections::HashMap;

use super::{SessionRecord, SessionStore, StoreError};

/// Process-local session store.
#[derive(Default)]
pub struct MemorySessionStore {
    rows: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &str, now: i64) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self
            .rows
            .read()
            .get(id)
            .filter(|r| r.expires_at > now)
            .cloned())
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.rows.write().insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn touch(&self, id: &str, expires_at: i64) -> Result<(), StoreError> {
        if let Some(row) = self.rows.write().get_mut(id) {
            row.expires_at = expires_at;
        }
        Ok(())
    }

    fn destroy(&self, id: &str) -> Result<(), StoreError> {
        self.rows.write().remove(id);
        Ok(())
    }

    fn prune_expired(&self, now: i64) -> Result<usize, StoreError> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|_, r| r.expires_at > now);
        Ok(before - rows.len())
    }
}
