// SqliteStore — rusqlite backend implementing the KeyValueStore trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.
//
// Holding the mutex for the duration of one statement makes every single
// operation atomic, but a get followed by a compare_and_set is two lock
// acquisitions, so concurrent cycles still race and rely on the version check.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use serde_json::Value;
use tokio::sync::Mutex;

use super::traits::{KeyValueStore, Versioned};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Fresh in-memory store with the schema applied. Used by tests and by
    /// `serve --ephemeral`.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn get(&self, key: &str) -> Result<Option<Versioned>> {
        let conn = self.conn.lock().await;
        super::queries::get_entry(&conn, key)
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Versioned)>> {
        let conn = self.conn.lock().await;
        super::queries::list_prefix(&conn, prefix)
    }

    async fn set(&self, key: &str, value: &Value) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::set_entry(&conn, key, value)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<i64>,
        value: &Value,
    ) -> Result<bool> {
        let conn = self.conn.lock().await;
        super::queries::compare_and_set(&conn, key, expected, value)
    }
}
