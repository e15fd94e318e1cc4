// PgStore — PostgreSQL backend implementing the KeyValueStore trait.
//
// Uses sqlx PgPool for native async queries. All queries use runtime
// parameter binding (not compile-time macros) to avoid requiring
// DATABASE_URL at compile time.
//
// Key differences from SQLite:
// - TIMESTAMPTZ instead of TEXT for timestamps
// - JSONB instead of TEXT for values
// - $1/$2 parameter syntax (handled by sqlx)

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx_core::pool::Pool;
use sqlx_core::row::Row;
use sqlx_postgres::Postgres;

use super::traits::{KeyValueStore, Versioned};

/// Type alias for the PostgreSQL connection pool.
pub type PgPool = Pool<Postgres>;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to PostgreSQL and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run all pending migrations.
    ///
    /// Acquires a session-level advisory lock so two app instances starting
    /// together don't race to apply the same migration. Session locks are
    /// bound to the backend session that took them, so lock and unlock run on
    /// one dedicated connection; the unlock always runs, and a migration
    /// error takes priority over an unlock error.
    async fn run_migrations(&self) -> Result<()> {
        // ASCII "INGROWKV" as a big-endian i64.
        const MIGRATION_LOCK_KEY: i64 = 0x494E47524F574B56_u64 as i64;

        let mut lock_conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection for migration advisory lock")?;

        sqlx_core::query::query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *lock_conn)
            .await
            .context("Failed to acquire migration advisory lock")?;

        let migration_result: Result<()> = async {
            sqlx_core::query::query(
                "CREATE TABLE IF NOT EXISTS schema_version (
                    version INTEGER PRIMARY KEY,
                    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )",
            )
            .execute(&self.pool)
            .await?;

            let migrations = [(
                1,
                include_str!("../../migrations/postgres/0001_initial.sql"),
            )];

            for (version, sql) in migrations {
                let applied: bool = sqlx_core::query::query(
                    "SELECT COUNT(*) > 0 FROM schema_version WHERE version = $1",
                )
                .bind(version)
                .fetch_one(&self.pool)
                .await
                .map(|row| row.get::<bool, _>(0))
                .unwrap_or(false);

                if !applied {
                    // Schema change and schema_version insert commit together.
                    let mut tx = self.pool.begin().await?;
                    sqlx_core::raw_sql::raw_sql(sql).execute(&mut *tx).await?;
                    tx.commit().await?;
                }
            }

            Ok(())
        }
        .await;

        let unlock_result = sqlx_core::query::query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *lock_conn)
            .await
            .context("Failed to release migration advisory lock");

        migration_result?;
        unlock_result?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for PgStore {
    async fn table_count(&self) -> Result<i64> {
        let row = sqlx_core::query::query(
            "SELECT COUNT(*)::bigint FROM information_schema.tables
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>(0))
    }

    async fn get(&self, key: &str) -> Result<Option<Versioned>> {
        let row = sqlx_core::query::query("SELECT value, version FROM kv_entries WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Versioned {
            value: r.get::<Value, _>(0),
            version: r.get::<i64, _>(1),
        }))
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Versioned)>> {
        // starts_with keeps '%' and '_' in ids literal, unlike LIKE
        let rows = sqlx_core::query::query(
            "SELECT key, value, version FROM kv_entries
             WHERE starts_with(key, $1)
             ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    r.get::<String, _>(0),
                    Versioned {
                        value: r.get::<Value, _>(1),
                        version: r.get::<i64, _>(2),
                    },
                )
            })
            .collect())
    }

    async fn set(&self, key: &str, value: &Value) -> Result<i64> {
        let row = sqlx_core::query::query(
            "INSERT INTO kv_entries (key, value, version, updated_at)
             VALUES ($1, $2, 1, NOW())
             ON CONFLICT(key) DO UPDATE SET
                value = $2,
                version = kv_entries.version + 1,
                updated_at = NOW()
             RETURNING version",
        )
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>(0))
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<i64>,
        value: &Value,
    ) -> Result<bool> {
        let result = match expected {
            None => {
                sqlx_core::query::query(
                    "INSERT INTO kv_entries (key, value, version, updated_at)
                     VALUES ($1, $2, 1, NOW())
                     ON CONFLICT(key) DO NOTHING",
                )
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await?
            }
            Some(version) => {
                sqlx_core::query::query(
                    "UPDATE kv_entries
                     SET value = $2, version = version + 1, updated_at = NOW()
                     WHERE key = $1 AND version = $3",
                )
                .bind(key)
                .bind(value)
                .bind(version)
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected() == 1)
    }
}
