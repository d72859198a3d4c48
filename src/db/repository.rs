use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

pub async fn find_entry(db: &SqlitePool, key: &str) -> Result<Option<CacheEntry>, sqlx::Error> {
    sqlx::query_as::<_, CacheEntry>(
        "SELECT key, value, updated_at FROM cache_entries WHERE key = ?"
    )
    .bind(key)
    .fetch_optional(db)
    .await
}

pub async fn upsert_entry(db: &SqlitePool, key: &str, value: &str) -> Result<CacheEntry, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO cache_entries (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#
    )
    .bind(key)
    .bind(value)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(CacheEntry {
        key: key.to_string(),
        value: value.to_string(),
        updated_at: now,
    })
}

pub async fn delete_entry(db: &SqlitePool, key: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?")
        .bind(key)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    #[tokio::test]
    async fn test_upsert_and_find_entry() {
        let pool = connect_in_memory().await.expect("Failed to create test db");

        assert!(find_entry(&pool, "k").await.unwrap().is_none());

        upsert_entry(&pool, "k", "[]").await.expect("Failed to insert entry");
        upsert_entry(&pool, "k", "[1]").await.expect("Failed to update entry");

        let entry = find_entry(&pool, "k").await.unwrap().expect("Entry not found");
        assert_eq!(entry.value, "[1]");
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        upsert_entry(&pool, "k", "[]").await.unwrap();

        assert!(delete_entry(&pool, "k").await.unwrap());
        assert!(!delete_entry(&pool, "k").await.unwrap());
        assert!(find_entry(&pool, "k").await.unwrap().is_none());
    }
}
