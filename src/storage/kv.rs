use anyhow::Result;

use super::schema::Database;

impl Database {
    // ========================================================================
    // Key-Value Slot Operations
    // ========================================================================

    /// Get the value stored under `key`.
    ///
    /// # Returns
    ///
    /// The stored text if the slot exists, or `None` if it was never written.
    pub async fn get_slot(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Replace the value stored under `key` (UPSERT).
    ///
    /// The value is written as a whole; there are no partial updates.
    pub async fn set_slot(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete the slot. Returns `true` if it existed.
    pub async fn delete_slot(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_slot_missing() {
        let db = test_db().await;
        let value = db.get_slot("marquee.nothing").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_and_get_slot() {
        let db = test_db().await;
        db.set_slot("marquee.watchlist", "[]").await.unwrap();

        let value = db.get_slot("marquee.watchlist").await.unwrap();
        assert_eq!(value, Some("[]".to_string()));
    }

    #[tokio::test]
    async fn test_set_slot_upsert() {
        let db = test_db().await;
        db.set_slot("marquee.watchlist", "[]").await.unwrap();
        db.set_slot("marquee.watchlist", r#"[{"id":1}]"#)
            .await
            .unwrap();

        let value = db.get_slot("marquee.watchlist").await.unwrap();
        assert_eq!(value, Some(r#"[{"id":1}]"#.to_string()));
    }

    #[tokio::test]
    async fn test_delete_slot() {
        let db = test_db().await;
        db.set_slot("marquee.watchlist", "[]").await.unwrap();

        assert!(db.delete_slot("marquee.watchlist").await.unwrap());
        assert!(!db.delete_slot("marquee.watchlist").await.unwrap());
        assert_eq!(db.get_slot("marquee.watchlist").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_slots_are_independent() {
        let db = test_db().await;
        db.set_slot("marquee.watchlist", "[]").await.unwrap();
        db.set_slot("marquee.theme", "light").await.unwrap();

        assert!(db.delete_slot("marquee.watchlist").await.unwrap());
        assert_eq!(db.get_slot("marquee.theme").await.unwrap().as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn test_set_slot_fails_after_close() {
        let db = test_db().await;
        db.close().await;
        assert!(db.set_slot("marquee.watchlist", "[]").await.is_err());
    }
}
