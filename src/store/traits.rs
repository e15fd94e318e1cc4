// KeyValueStore trait — backend-agnostic async interface over the kv table.
//
// Implementors: SqliteStore (wraps rusqlite), PgStore (wraps sqlx).
// All methods are async so both sync (rusqlite via Mutex) and native async
// (sqlx) backends fit behind a single interface.
//
// Every entry carries a version that starts at 1 and increments on each
// write. `compare_and_set` is the only primitive the approval pipeline needs
// to serialize read-modify-write cycles for one user.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A stored value together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub version: i64,
    pub value: Value,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Reads ---

    /// Fetch a value and its current version.
    async fn get(&self, key: &str) -> Result<Option<Versioned>>;

    /// All entries whose key starts with `prefix`, ordered by key.
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Versioned)>>;

    // --- Writes ---

    /// Unconditional upsert. Returns the new version.
    async fn set(&self, key: &str, value: &Value) -> Result<i64>;

    /// Write `value` only if the stored version still equals `expected`
    /// (`None` means the key must not exist yet). Returns false on conflict.
    async fn compare_and_set(&self, key: &str, expected: Option<i64>, value: &Value)
        -> Result<bool>;
}
