use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::Database;

impl Database {
    pub async fn get_blob(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.query_row(
                "SELECT value FROM blobs WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("failed to read blob '{key}'"))
        })
        .await
    }

    /// Upserts inside a transaction so a reader never sees a half-written value.
    pub async fn set_blob(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open blob transaction")?;
            tx.execute(
                "INSERT INTO blobs (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("failed to write blob '{key}'"))?;
            tx.commit().context("failed to commit blob write")?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use tempfile::TempDir;

    #[tokio::test]
    async fn blobs_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.sqlite3");

        {
            let db = Database::new(path.clone()).unwrap();
            assert_eq!(db.get_blob("moodEntries").await.unwrap(), None);
            db.set_blob("moodEntries", "[1]".into()).await.unwrap();
            db.set_blob("moodEntries", "[1,2]".into()).await.unwrap();
        }

        let db = Database::new(path).unwrap();
        assert_eq!(
            db.get_blob("moodEntries").await.unwrap().as_deref(),
            Some("[1,2]")
        );
        assert_eq!(db.get_blob("other").await.unwrap(), None);
    }
}
