//! SQLite database holding the persisted file generation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteRow};
use sqlx::{Connection, Row};
use tracing::{debug, info};

use common::{DurableStore, FileRecord};

use crate::error::{Result, StoreError};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS files (
        path TEXT PRIMARY KEY NOT NULL,
        bytes BLOB NOT NULL,
        mime_type TEXT NOT NULL
    )
"#;

/// Handle to the SQLite file backing the durable store.
///
/// Cloning is cheap; the handle only carries connection options.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    options: SqliteConnectOptions,
}

impl Database {
    /// Create a handle for the database at `path`.
    ///
    /// The parent directory and the database file are created if missing,
    /// and one connection is opened and closed so a bad path is reported now
    /// rather than on the first background write.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Self::new_lazy(path);
        let conn = db.open().await?;
        conn.close().await.map_err(StoreError::Open)?;

        info!("Durable store initialized at {:?}", path);
        Ok(db)
    }

    /// Create a handle without touching the filesystem.
    ///
    /// Problems with the path only surface as errors from later operations.
    pub fn new_lazy(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        Self {
            path: path.to_path_buf(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection and make sure the schema exists.
    async fn open(&self) -> Result<SqliteConnection> {
        let mut conn = SqliteConnection::connect_with(&self.options)
            .await
            .map_err(StoreError::Open)?;

        sqlx::query(SCHEMA)
            .execute(&mut conn)
            .await
            .map_err(StoreError::Open)?;

        Ok(conn)
    }

    /// Read every persisted record.
    pub async fn get_all(&self) -> Result<Vec<FileRecord>> {
        let mut conn = self.open().await?;

        let mut tx = conn.begin().await.map_err(StoreError::Open)?;
        let rows = sqlx::query("SELECT path, bytes, mime_type FROM files")
            .fetch_all(&mut *tx)
            .await
            .map_err(StoreError::Read)?;
        tx.commit().await.map_err(StoreError::Read)?;
        close(conn).await;

        let records = rows
            .iter()
            .map(row_to_record)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Read)?;

        debug!(count = records.len(), "read persisted files");
        Ok(records)
    }

    /// Write one record, replacing any record with the same path.
    pub async fn put(&self, record: FileRecord) -> Result<()> {
        let mut conn = self.open().await?;

        let mut tx = conn.begin().await.map_err(StoreError::Open)?;
        sqlx::query(
            r#"
            INSERT INTO files (path, bytes, mime_type)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(path) DO UPDATE SET
                bytes = excluded.bytes,
                mime_type = excluded.mime_type
            "#,
        )
        .bind(&record.path)
        .bind(&record.bytes[..])
        .bind(&record.mime_type)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::Write)?;
        tx.commit().await.map_err(StoreError::Write)?;
        close(conn).await;

        Ok(())
    }

    /// Remove every record.
    pub async fn clear(&self) -> Result<()> {
        let mut conn = self.open().await?;

        let mut tx = conn.begin().await.map_err(StoreError::Open)?;
        let result = sqlx::query("DELETE FROM files")
            .execute(&mut *tx)
            .await
            .map_err(StoreError::Write)?;
        tx.commit().await.map_err(StoreError::Write)?;
        close(conn).await;

        debug!(removed = result.rows_affected(), "cleared persisted files");
        Ok(())
    }

    /// Get the number of persisted records.
    pub async fn count(&self) -> Result<i64> {
        let mut conn = self.open().await?;
        let row = sqlx::query("SELECT COUNT(*) as count FROM files")
            .fetch_one(&mut conn)
            .await
            .map_err(StoreError::Read)?;
        close(conn).await;
        Ok(row.get("count"))
    }
}

#[async_trait]
impl DurableStore for Database {
    type Error = StoreError;

    async fn get_all(&self) -> Result<Vec<FileRecord>> {
        Database::get_all(self).await
    }

    async fn put(&self, record: FileRecord) -> Result<()> {
        Database::put(self, record).await
    }

    async fn clear(&self) -> Result<()> {
        Database::clear(self).await
    }
}

async fn close(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        debug!(error = %e, "error closing store connection");
    }
}

fn row_to_record(row: &SqliteRow) -> std::result::Result<FileRecord, sqlx::Error> {
    let bytes: Vec<u8> = row.try_get("bytes")?;
    Ok(FileRecord {
        path: row.try_get("path")?,
        bytes: Bytes::from(bytes),
        mime_type: row.try_get("mime_type")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path().join("drop.sqlite"))
            .await
            .unwrap();
        (db, temp_dir)
    }

    fn record(path: &str, body: &[u8], mime_type: &str) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            bytes: Bytes::copy_from_slice(body),
            mime_type: mime_type.to_string(),
        }
    }

    #[tokio::test]
    async fn test_new_database_is_empty() {
        let (db, _dir) = setup_test_db().await;
        assert_eq!(db.count().await.unwrap(), 0);
        assert!(db.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_and_get_all() {
        let (db, _dir) = setup_test_db().await;

        db.put(record("index.html", b"<h1>hi</h1>", "text/html"))
            .await
            .unwrap();
        db.put(record("img/a.png", &[0x89, b'P', b'N', b'G', 0, 255], "image/png"))
            .await
            .unwrap();

        let mut records = db.get_all().await.unwrap();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(
            records,
            vec![
                record("img/a.png", &[0x89, b'P', b'N', b'G', 0, 255], "image/png"),
                record("index.html", b"<h1>hi</h1>", "text/html"),
            ]
        );
    }

    #[tokio::test]
    async fn test_put_overwrites_by_path() {
        let (db, _dir) = setup_test_db().await;

        db.put(record("a.txt", b"old", "text/plain")).await.unwrap();
        db.put(record("a.txt", b"new", "text/markdown")).await.unwrap();

        let records = db.get_all().await.unwrap();
        assert_eq!(records, vec![record("a.txt", b"new", "text/markdown")]);
    }

    #[tokio::test]
    async fn test_clear() {
        let (db, _dir) = setup_test_db().await;

        db.put(record("a.txt", b"a", "text/plain")).await.unwrap();
        db.put(record("b.txt", b"b", "text/plain")).await.unwrap();
        assert_eq!(db.count().await.unwrap(), 2);

        db.clear().await.unwrap();
        assert_eq!(db.count().await.unwrap(), 0);

        // clearing an empty store is fine
        db.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_records_survive_new_handle() {
        let (db, dir) = setup_test_db().await;
        db.put(record("a.txt", b"persisted", "text/plain"))
            .await
            .unwrap();
        drop(db);

        let reopened = Database::new(dir.path().join("drop.sqlite")).await.unwrap();
        assert_eq!(
            reopened.get_all().await.unwrap(),
            vec![record("a.txt", b"persisted", "text/plain")]
        );
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("drop.sqlite");

        let db = Database::new(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_unopenable_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("is-a-directory");
        std::fs::create_dir_all(&path).unwrap();

        let result = Database::new(&path).await;
        assert!(matches!(result, Err(StoreError::Open(_))));
    }

    #[tokio::test]
    async fn test_lazy_handle_reports_errors_per_operation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("is-a-directory");
        std::fs::create_dir_all(&path).unwrap();

        let db = Database::new_lazy(&path);
        assert!(matches!(db.get_all().await, Err(StoreError::Open(_))));
        assert!(matches!(
            db.put(record("a.txt", b"a", "text/plain")).await,
            Err(StoreError::Open(_))
        ));
        assert!(matches!(db.clear().await, Err(StoreError::Open(_))));
    }

    #[tokio::test]
    async fn test_durable_store_trait_round_trip() {
        let (db, _dir) = setup_test_db().await;
        let mut state = common::CacheState::new();
        state.insert(
            "a.html",
            common::ContentEntry::new(b"<p>a</p>".to_vec(), Some("text/html".to_string())),
        );
        state.insert("b.bin", common::ContentEntry::new(vec![1u8, 2, 3], None));

        let report = common::persist_all(&db, &state).await;
        assert!(report.is_success());

        let restored = common::rehydrate(&db).await;
        assert_eq!(restored, state);
    }
}
