//! Saved searches: named filter sets kept in local persistent storage.
//!
//! The whole collection lives as one JSON array under `SAVED_SEARCHES_KEY`.
//! Reads fail soft: a missing or corrupt collection loads as empty and the
//! next save overwrites it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

use crate::models::SavedSearch;

pub const SAVED_SEARCHES_KEY: &str = "career_explorer.saved_searches";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Raw key-value backend holding the serialized collection.
#[async_trait]
pub trait SearchStorage: Send + Sync {
    async fn read(&self) -> Result<Option<String>, StoreError>;
    async fn write(&self, raw: String) -> Result<(), StoreError>;
    fn describe(&self) -> String;
}

/// One JSON file per storage key, replaced atomically on every write.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{SAVED_SEARCHES_KEY}.json")),
        }
    }
}

#[async_trait]
impl SearchStorage for FileStorage {
    async fn read(&self) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, raw: String) -> Result<(), StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            use std::io::Write;

            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)?;
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(raw.as_bytes())?;
            tmp.flush()?;
            tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Single Redis string key holding the JSON array. The multiplexed
/// connection is opened on first use and shared by every later call.
pub struct RedisStorage {
    client: redis::Client,
    conn: OnceCell<MultiplexedConnection>,
}

impl RedisStorage {
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            conn: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| self.client.get_multiplexed_async_connection())
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl SearchStorage for RedisStorage {
    async fn read(&self) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(SAVED_SEARCHES_KEY).await?;
        Ok(raw)
    }

    async fn write(&self, raw: String) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(SAVED_SEARCHES_KEY, raw).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("redis key {SAVED_SEARCHES_KEY}")
    }
}

/// Owner of the saved-search collection. All writes go through one lock, so
/// concurrent saves from different sessions never lose each other's entries.
pub struct SavedSearchBook {
    storage: Box<dyn SearchStorage>,
    write_lock: Mutex<()>,
}

impl SavedSearchBook {
    pub fn new(storage: Box<dyn SearchStorage>) -> Self {
        info!("Saved searches stored in {}", storage.describe());
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Reads the collection, degrading to empty on any storage or parse fault.
    pub async fn load(&self) -> Vec<SavedSearch> {
        match self.storage.read().await {
            Ok(Some(raw)) => decode_collection(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read saved searches, starting empty: {e}");
                Vec::new()
            }
        }
    }

    pub async fn save(
        &self,
        name: &str,
        filters: Map<String, Value>,
    ) -> Result<SavedSearch, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut searches = self.load_for_write().await?;

        // Ids are creation millis; bump past the newest on a same-millisecond save.
        let now = Utc::now();
        let newest = searches.iter().map(|s| s.id).max().unwrap_or(i64::MIN);
        let id = now.timestamp_millis().max(newest.saturating_add(1));

        let search = SavedSearch {
            id,
            name: name.to_string(),
            filters,
            timestamp: now.to_rfc3339(),
        };
        searches.push(search.clone());
        self.storage.write(serde_json::to_string(&searches)?).await?;

        info!("Saved search '{}' ({} total)", search.name, searches.len());
        Ok(search)
    }

    /// Removes a search by id. Returns false when no such search exists.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut searches = self.load_for_write().await?;
        let before = searches.len();
        searches.retain(|s| s.id != id);
        if searches.len() == before {
            return Ok(false);
        }
        self.storage.write(serde_json::to_string(&searches)?).await?;
        Ok(true)
    }

    /// Like `load`, but a failed storage read is an error. Writing back after
    /// a read that never happened would replace the stored collection.
    async fn load_for_write(&self) -> Result<Vec<SavedSearch>, StoreError> {
        Ok(self
            .storage
            .read()
            .await?
            .map(|raw| decode_collection(&raw))
            .unwrap_or_default())
    }
}

/// Decodes the stored array, keeping every entry that still parses.
fn decode_collection(raw: &str) -> Vec<SavedSearch> {
    let items = match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(items) => items,
        Err(e) => {
            warn!("Saved searches are corrupt, ignoring stored data: {e}");
            return Vec::new();
        }
    };
    let total = items.len();
    let searches: Vec<SavedSearch> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if searches.len() < total {
        warn!(
            "Dropped {} unreadable saved search entries",
            total - searches.len()
        );
    }
    searches
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn book(dir: &Path) -> SavedSearchBook {
        SavedSearchBook::new(Box::new(FileStorage::new(dir)))
    }

    /// File storage whose next `failures` reads error out.
    struct FlakyStorage {
        inner: FileStorage,
        failures: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SearchStorage for FlakyStorage {
        async fn read(&self) -> Result<Option<String>, StoreError> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk unavailable")));
            }
            self.inner.read().await
        }

        async fn write(&self, raw: String) -> Result<(), StoreError> {
            self.inner.write(raw).await
        }

        fn describe(&self) -> String {
            "flaky file".to_string()
        }
    }

    fn filters(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("filters must be an object"),
        }
    }

    #[tokio::test]
    async fn test_saved_search_survives_new_session() {
        let dir = tempfile::tempdir().unwrap();
        book(dir.path())
            .save("Stanford grads", filters(json!({"university": "Stanford"})))
            .await
            .unwrap();

        let reloaded = book(dir.path()).load().await;
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0].name, "Stanford grads");
        assert_eq!(reloaded[0].filters["university"], "Stanford");
    }

    #[tokio::test]
    async fn test_missing_storage_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(book(dir.path()).load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_storage_loads_empty_and_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(format!("{SAVED_SEARCHES_KEY}.json"));
        std::fs::write(&file, "{{{ not json").unwrap();

        let book = book(dir.path());
        assert!(book.load().await.is_empty());

        book.save("fresh", Map::new()).await.unwrap();
        let loaded = book.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "fresh");
    }

    #[tokio::test]
    async fn test_unreadable_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(format!("{SAVED_SEARCHES_KEY}.json"));
        let raw = json!([
            {"id": 1, "name": "ok", "filters": {}, "timestamp": "2024-01-01T00:00:00Z"},
            {"name": "missing id"}
        ]);
        std::fs::write(&file, raw.to_string()).unwrap();

        let loaded = book(dir.path()).load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "ok");
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_increasing() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let a = book.save("a", Map::new()).await.unwrap();
        let b = book.save("b", Map::new()).await.unwrap();
        assert!(b.id > a.id);
        assert!(chrono::DateTime::parse_from_rfc3339(&a.timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_delete_removes_only_matching_entry() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let a = book.save("a", Map::new()).await.unwrap();
        book.save("b", Map::new()).await.unwrap();

        assert!(book.delete(a.id).await.unwrap());
        assert!(!book.delete(a.id).await.unwrap());
        let names: Vec<_> = book.load().await.into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b"]);
    }

    #[tokio::test]
    async fn test_failed_read_does_not_clobber_collection_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let failures = Arc::new(AtomicUsize::new(0));
        let book = SavedSearchBook::new(Box::new(FlakyStorage {
            inner: FileStorage::new(dir.path()),
            failures: failures.clone(),
        }));
        book.save("a", Map::new()).await.unwrap();
        book.save("b", Map::new()).await.unwrap();

        failures.store(1, Ordering::SeqCst);
        assert!(matches!(
            book.save("c", Map::new()).await,
            Err(StoreError::Io(_))
        ));
        book.save("c", Map::new()).await.unwrap();

        let names: Vec<_> = book.load().await.into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_failed_read_does_not_clobber_collection_on_delete() {
        let dir = tempfile::tempdir().unwrap();
        let failures = Arc::new(AtomicUsize::new(0));
        let book = SavedSearchBook::new(Box::new(FlakyStorage {
            inner: FileStorage::new(dir.path()),
            failures: failures.clone(),
        }));
        let a = book.save("a", Map::new()).await.unwrap();
        book.save("b", Map::new()).await.unwrap();

        failures.store(1, Ordering::SeqCst);
        assert!(book.delete(a.id).await.is_err());
        assert_eq!(book.load().await.len(), 2);
    }

    #[tokio::test]
    async fn test_redis_connection_is_not_cached_after_failure() {
        let storage = RedisStorage::new(redis::Client::open("redis://127.0.0.1:1/").unwrap());
        assert!(matches!(storage.read().await, Err(StoreError::Redis(_))));
        assert!(!storage.conn.initialized());
        assert!(storage.write("[]".to_string()).await.is_err());
        assert!(!storage.conn.initialized());
    }
}
