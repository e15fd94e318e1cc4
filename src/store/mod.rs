// Storage layer — the namespaced key-value store behind every user record.
//
// SQLite (rusqlite, bundled) is the default backend; PostgreSQL is available
// behind the `postgres` feature. Callers hold an `Arc<dyn KeyValueStore>` and
// never see which one is in use.

pub mod keys;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod queries;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use traits::{KeyValueStore, Versioned};

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Open (or create) the SQLite database and run migrations.
#[cfg(feature = "sqlite")]
pub fn initialize_sqlite(db_path: &str) -> Result<Arc<dyn KeyValueStore>> {
    use std::path::Path;

    // Create parent directories if needed
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {db_path}"))?;
        }
    }

    let conn = rusqlite::Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {db_path}"))?;

    // Enable WAL mode for better concurrent read performance
    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(Arc::new(sqlite::SqliteStore::new(conn)))
}

/// Open an existing SQLite database (fails if it doesn't exist yet).
#[cfg(feature = "sqlite")]
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn KeyValueStore>> {
    if !std::path::Path::new(db_path).exists() {
        anyhow::bail!("Database not found at {db_path}. Run `ingrow init` first.");
    }

    let conn = rusqlite::Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {db_path}"))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Cheap and idempotent; picks up tables added since the file was created.
    schema::create_tables(&conn)?;

    Ok(Arc::new(sqlite::SqliteStore::new(conn)))
}

/// Connect to PostgreSQL and run migrations.
#[cfg(feature = "postgres")]
pub async fn connect_postgres(database_url: &str) -> Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(postgres::PgStore::connect(database_url).await?))
}

/// Read a key and deserialize it, keeping the version.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<(i64, T)>> {
    match store.get(key).await? {
        Some(entry) => {
            let value = serde_json::from_value(entry.value)
                .with_context(|| format!("Stored value under {key} has an unexpected shape"))?;
            Ok(Some((entry.version, value)))
        }
        None => Ok(None),
    }
}

/// Serialize and upsert a value.
pub async fn set_typed<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<i64> {
    let json = serde_json::to_value(value)?;
    store.set(key, &json).await
}
