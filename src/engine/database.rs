use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;
use tokio::fs;

#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Sqlite>,
}

impl Database {
    pub async fn new(db_path: &str) -> Result<Self> {
        // Create file if not exists
        if !Path::new(db_path).exists() {
            fs::File::create(db_path).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite://{}", db_path))
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub async fn in_memory() -> Result<Self> {
        // One connection, otherwise every connection gets its own empty database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS saves (
                key TEXT PRIMARY KEY NOT NULL,
                data TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn save_snapshot(&self, key: &str, data: &str) -> Result<()> {
        let updated_at = chrono::Utc::now().timestamp_millis();
        sqlx::query(
            r#"
            INSERT INTO saves (key, data, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(data)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_snapshot(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM saves WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(data,)| data))
    }

    pub async fn delete_snapshot(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM saves WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_upsert_and_delete() {
        let db = Database::in_memory().await.unwrap();
        assert_eq!(db.load_snapshot("slot").await.unwrap(), None);

        db.save_snapshot("slot", "{\"money\":1}").await.unwrap();
        db.save_snapshot("slot", "{\"money\":2}").await.unwrap();
        assert_eq!(db.load_snapshot("slot").await.unwrap().as_deref(), Some("{\"money\":2}"));

        db.delete_snapshot("slot").await.unwrap();
        assert_eq!(db.load_snapshot("slot").await.unwrap(), None);
        // Deleting twice is fine
        db.delete_snapshot("slot").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let db = Database::in_memory().await.unwrap();
        db.save_snapshot("a", "1").await.unwrap();
        db.save_snapshot("b", "2").await.unwrap();
        db.delete_snapshot("a").await.unwrap();
        assert_eq!(db.load_snapshot("b").await.unwrap().as_deref(), Some("2"));
    }
}
