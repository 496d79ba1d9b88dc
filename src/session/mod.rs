//! # Session Module
//!
//! Server-held session state referenced from the client by a signed
//! `sessionId` cookie.
//!
//! ## Lifecycle
//!
//! - A request without a valid cookie gets a fresh, empty [`Session`].
//! - Empty new sessions are never written; the first write persists the row
//!   and issues the cookie.
//! - Every later request with a valid cookie loads the row, and the expiry is
//!   pushed forward (sliding window of [`SESSION_TTL_SECS`]).
//! - Rows past their expiry are ignored on load and pruned at startup.
//! - [`Session::invalidate`] deletes the row and expires the cookie.
//!
//! Storage is behind the [`SessionStore`] trait: [`SqliteSessionStore`] is
//! used by the server, [`MemorySessionStore`] by tests.

mod cookie;
mod memory;
mod sqlite;

pub use cookie::{CookieSigner, SessionCookie, SESSION_COOKIE_NAME};
pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use serde_json::{Map, Value};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ids::new_session_id;

/// Thirty days.
pub const SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Seconds since the Unix epoch.
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// A stored session row.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: String,
    pub data: Map<String, Value>,
    pub expires_at: i64,
}

/// Session attached to the current request.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    data: Map<String, Value>,
    expires_at: i64,
    is_new: bool,
    modified: bool,
    invalidated: bool,
}

impl Session {
    /// A brand-new, empty session that is not yet persisted.
    pub fn fresh() -> Self {
        Self {
            id: new_session_id(),
            data: Map::new(),
            expires_at: now_unix() + SESSION_TTL_SECS,
            is_new: true,
            modified: false,
            invalidated: false,
        }
    }

    /// A session loaded from the store.
    pub fn from_record(record: SessionRecord) -> Self {
        Self {
            id: record.id,
            data: record.data,
            expires_at: record.expires_at,
            is_new: false,
            modified: false,
            invalidated: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.data.insert(key.to_string(), value.into());
        self.modified = true;
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.data.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// Mutable access to a value; marks the session modified.
    pub fn entry_mut(&mut self, key: &str) -> &mut Value {
        self.modified = true;
        self.data.entry(key.to_string()).or_insert(Value::Null)
    }

    /// Mark the session for deletion at the end of the request.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
        self.data.clear();
    }

    /// Push the expiry forward from `now`.
    pub(crate) fn extend(&mut self, now: i64) {
        self.expires_at = now + SESSION_TTL_SECS;
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            id: self.id.clone(),
            data: self.data.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Persistence for session rows.
pub trait SessionStore: Send + Sync {
    /// Load a session that has not expired as of `now`.
    fn load(&self, id: &str, now: i64) -> Result<Option<SessionRecord>, StoreError>;
    /// Insert or replace a session row.
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;
    /// Update only the expiry of an existing row.
    fn touch(&self, id: &str, expires_at: i64) -> Result<(), StoreError>;
    fn destroy(&self, id: &str) -> Result<(), StoreError>;
    /// Delete rows expired as of `now`, returning how many were removed.
    fn prune_expired(&self, now: i64) -> Result<usize, StoreError>;
}

/// Session storage failure.
#[derive(Debug)]
pub enum StoreError {
    /// The database could not be opened.
    Connect(rusqlite::Error),
    /// The reachability probe failed.
    Verify(rusqlite::Error),
    /// Creating the session table failed.
    Schema(rusqlite::Error),
    /// A read or write failed.
    Query(rusqlite::Error),
    /// A stored payload could not be encoded or decoded.
    Payload(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Connect(e) => write!(f, "session store: cannot open database: {e}"),
            StoreError::Verify(e) => write!(f, "session store: database unreachable: {e}"),
            StoreError::Schema(e) => write!(f, "session store: schema setup failed: {e}"),
            StoreError::Query(e) => write!(f, "session store: query failed: {e}"),
            StoreError::Payload(e) => write!(f, "session store: invalid session payload: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Connect(e)
            | StoreError::Verify(e)
            | StoreError::Schema(e)
            | StoreError::Query(e) => Some(e),
            StoreError::Payload(e) => Some(e),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{SessionRecord, SessionStore, StoreError};

    /// Finds no sessions and rejects every write.
    pub struct ReadOnlyStore;

    fn rejected() -> StoreError {
        StoreError::Query(rusqlite::Error::InvalidQuery)
    }

    impl SessionStore for ReadOnlyStore {
        fn load(&self, _id: &str, _now: i64) -> Result<Option<SessionRecord>, StoreError> {
            Ok(None)
        }

        fn save(&self, _record: &SessionRecord) -> Result<(), StoreError> {
            Err(rejected())
        }

        fn touch(&self, _id: &str, _expires_at: i64) -> Result<(), StoreError> {
            Err(rejected())
        }

        fn destroy(&self, _id: &str) -> Result<(), StoreError> {
            Err(rejected())
        }

        fn prune_expired(&self, _now: i64) -> Result<usize, StoreError> {
            Err(rejected())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_is_new_and_clean() {
        let s = Session::fresh();
        assert!(s.is_new());
        assert!(s.is_empty());
        assert!(!s.is_modified());
        assert!(s.expires_at() > now_unix());
    }

    #[test]
    fn test_insert_and_remove_mark_modified() {
        let mut s = Session::from_record(SessionRecord {
            id: "abc".into(),
            data: Map::new(),
            expires_at: 0,
        });
        assert!(!s.is_modified());
        assert_eq!(s.remove("missing"), None);
        assert!(!s.is_modified());
        s.insert("k", "v");
        assert!(s.is_modified());
        assert_eq!(s.get("k"), Some(&Value::from("v")));
    }

    #[test]
    fn test_invalidate_clears_data() {
        let mut s = Session::fresh();
        s.insert("k", 1);
        s.invalidate();
        assert!(s.is_invalidated());
        assert!(s.is_empty());
    }
}
