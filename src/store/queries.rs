// SQLite queries — every kv_entries statement lives here.
//
// Values go in and out as JSON text; callers work with serde_json::Value.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::traits::Versioned;

/// Fetch a value and its version.
pub fn get_entry(conn: &Connection, key: &str) -> Result<Option<Versioned>> {
    let mut stmt = conn.prepare("SELECT value, version FROM kv_entries WHERE key = ?1")?;
    let row: Option<(String, i64)> = stmt
        .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
        .optional()?;

    match row {
        Some((json, version)) => {
            let value = serde_json::from_str(&json)
                .with_context(|| format!("Corrupt JSON stored under {key}"))?;
            Ok(Some(Versioned { version, value }))
        }
        None => Ok(None),
    }
}

/// All entries under a key prefix, ordered by key.
pub fn list_prefix(conn: &Connection, prefix: &str) -> Result<Vec<(String, Versioned)>> {
    // substr comparison instead of LIKE so '%' and '_' in user ids stay literal
    let mut stmt = conn.prepare(
        "SELECT key, value, version FROM kv_entries
         WHERE substr(key, 1, length(?1)) = ?1
         ORDER BY key",
    )?;

    let rows = stmt.query_map(params![prefix], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (key, json, version) = row?;
        let value: Value = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt JSON stored under {key}"))?;
        entries.push((key, Versioned { version, value }));
    }
    Ok(entries)
}

/// Unconditional upsert; returns the new version.
pub fn set_entry(conn: &Connection, key: &str, value: &Value) -> Result<i64> {
    let json = serde_json::to_string(value)?;
    let version: i64 = conn.query_row(
        "INSERT INTO kv_entries (key, value, version, updated_at)
         VALUES (?1, ?2, 1, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET
            value = ?2,
            version = version + 1,
            updated_at = datetime('now')
         RETURNING version",
        params![key, json],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Conditional write. `expected = None` inserts only if the key is absent.
pub fn compare_and_set(
    conn: &Connection,
    key: &str,
    expected: Option<i64>,
    value: &Value,
) -> Result<bool> {
    let json = serde_json::to_string(value)?;
    let changed = match expected {
        None => conn.execute(
            "INSERT INTO kv_entries (key, value, version, updated_at)
             VALUES (?1, ?2, 1, datetime('now'))
             ON CONFLICT(key) DO NOTHING",
            params![key, json],
        )?,
        Some(version) => conn.execute(
            "UPDATE kv_entries
             SET value = ?2, version = version + 1, updated_at = datetime('now')
             WHERE key = ?1 AND version = ?3",
            params![key, json, version],
        )?,
    };
    Ok(changed == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::create_tables;
    use serde_json::json;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn test_set_bumps_version() {
        let conn = conn();
        assert_eq!(set_entry(&conn, "k", &json!({"a": 1})).unwrap(), 1);
        assert_eq!(set_entry(&conn, "k", &json!({"a": 2})).unwrap(), 2);
        let entry = get_entry(&conn, "k").unwrap().unwrap();
        assert_eq!(entry.version, 2);
        assert_eq!(entry.value, json!({"a": 2}));
    }

    #[test]
    fn test_cas_insert_only_when_absent() {
        let conn = conn();
        assert!(compare_and_set(&conn, "k", None, &json!(1)).unwrap());
        assert!(!compare_and_set(&conn, "k", None, &json!(2)).unwrap());
        assert_eq!(get_entry(&conn, "k").unwrap().unwrap().value, json!(1));
    }

    #[test]
    fn test_cas_rejects_stale_version() {
        let conn = conn();
        set_entry(&conn, "k", &json!("a")).unwrap();
        assert!(compare_and_set(&conn, "k", Some(1), &json!("b")).unwrap());
        assert!(!compare_and_set(&conn, "k", Some(1), &json!("c")).unwrap());
        let entry = get_entry(&conn, "k").unwrap().unwrap();
        assert_eq!(entry.value, json!("b"));
        assert_eq!(entry.version, 2);
    }

    #[test]
    fn test_list_prefix_treats_wildcards_literally() {
        let conn = conn();
        set_entry(&conn, "user:a_b:x", &json!(1)).unwrap();
        set_entry(&conn, "user:aXb:x", &json!(2)).unwrap();
        let rows = list_prefix(&conn, "user:a_b:").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "user:a_b:x");
    }
}
