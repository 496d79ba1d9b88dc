use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

use super::{SessionRecord, SessionStore, StoreError};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS session (
    sid    TEXT PRIMARY KEY NOT NULL,
    sess   TEXT NOT NULL,
    expire INTEGER NOT NULL
)";

const CREATE_EXPIRE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_session_expire ON session (expire)";

/// Session rows in a SQLite `session(sid, sess, expire)` table.
///
/// Startup is three explicit steps so the binary can fail fast on each:
/// [`connect`](Self::connect), [`verify`](Self::verify),
/// [`ensure_schema`](Self::ensure_schema).
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open (or create) the database file at `path`.
    pub fn connect<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(StoreError::Connect)?;
        info!(path = %path.display(), "session database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, mostly useful in tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Connect)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Round-trip a trivial query to prove the database answers.
    pub fn verify(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let one: i64 = conn
            .query_row("SELECT 1", [], |row| row.get(0))
            .map_err(StoreError::Verify)?;
        debug!(result = one, "session database verified");
        Ok(())
    }

    /// Create the session table and its expiry index when missing.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(CREATE_TABLE, []).map_err(StoreError::Schema)?;
        conn.execute(CREATE_EXPIRE_INDEX, [])
            .map_err(StoreError::Schema)?;
        info!("session table ready");
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self, id: &str, now: i64) -> Result<Option<SessionRecord>, StoreError> {
        let row: Option<(String, i64)> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT sess, expire FROM session WHERE sid = ?1 AND expire > ?2",
                params![id, now],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(StoreError::Query)?
        };
        match row {
            Some((sess, expires_at)) => {
                let data = serde_json::from_str(&sess).map_err(StoreError::Payload)?;
                Ok(Some(SessionRecord {
                    id: id.to_string(),
                    data,
                    expires_at,
                }))
            }
            None => Ok(None),
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let sess = serde_json::to_string(&record.data).map_err(StoreError::Payload)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO session (sid, sess, expire) VALUES (?1, ?2, ?3)
             ON CONFLICT (sid) DO UPDATE SET sess = excluded.sess, expire = excluded.expire",
            params![record.id, sess, record.expires_at],
        )
        .map_err(StoreError::Query)?;
        Ok(())
    }

    fn touch(&self, id: &str, expires_at: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE session SET expire = ?2 WHERE sid = ?1",
            params![id, expires_at],
        )
        .map_err(StoreError::Query)?;
        Ok(())
    }

    fn destroy(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM session WHERE sid = ?1", params![id])
            .map_err(StoreError::Query)?;
        Ok(())
    }

    fn prune_expired(&self, now: i64) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM session WHERE expire <= ?1", params![now])
            .map_err(StoreError::Query)
    }
}
