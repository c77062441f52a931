use std::{io::ErrorKind, path::{Path, PathBuf}, sync::Arc};

use once_cell::sync::Lazy;
use prometheus::{register_int_counter, IntCounter};
use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, sync::RwLock};
use tracing::{error, info};

use crate::errors::ServiceError;

pub static STORE_WRITE_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "hero_registry_store_write_errors_total",
        "Total failed rewrites of the backing store file"
    )
    .expect("register store_write_errors_total")
});

/// Generic JSON file-backed ordered list store.
///
/// Persists a `Vec<T>` to a pretty-printed JSON array and keeps the in-memory
/// collection authoritative: load errors degrade to an empty collection and
/// save errors are logged without failing the operation that triggered them.
/// Intended for small datasets where a database is overkill.
pub struct JsonListStore<T> {
    inner: RwLock<Vec<T>>,
    file_path: PathBuf,
}

impl<T> JsonListStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Open the store at a path. An absent file is initialized with `seed`
    /// (persisted immediately); a corrupt or unreadable file yields an empty
    /// collection. Only a missing parent directory that cannot be created is
    /// treated as fatal.
    pub async fn open<P: Into<PathBuf>>(path: P, seed: Vec<T>) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ServiceError::Storage(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let items = match fs::read(&file_path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<T>>(&bytes) {
                Ok(items) => {
                    info!(file = %file_path.display(), count = items.len(), "loaded records from file");
                    items
                }
                Err(e) => {
                    error!(file = %file_path.display(), error = %e, "store file is corrupt; starting with an empty collection");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(file = %file_path.display(), count = seed.len(), "store file not found; initializing with default data");
                persist(&file_path, &seed).await;
                seed
            }
            Err(e) => {
                error!(file = %file_path.display(), error = %e, "store file unreadable; starting with an empty collection");
                Vec::new()
            }
        };

        Ok(Arc::new(Self { inner: RwLock::new(items), file_path }))
    }

    /// Clone of the full collection, in insertion order.
    pub async fn snapshot(&self) -> Vec<T> {
        let items = self.inner.read().await;
        items.clone()
    }

    /// First element matching the predicate.
    pub async fn find<P>(&self, pred: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        let items = self.inner.read().await;
        items.iter().find(|t| pred(t)).cloned()
    }

    /// Build a new element from the current collection, append it, and
    /// rewrite the file. The write guard is held across the whole sequence so
    /// concurrent appends cannot interleave derived values or file contents.
    pub async fn append_with<F>(&self, make: F) -> T
    where
        F: FnOnce(&[T]) -> T,
    {
        let mut items = self.inner.write().await;
        let item = make(&items);
        items.push(item.clone());
        persist(&self.file_path, &items).await;
        item
    }
}

/// Full-file rewrite. Failures are logged and counted; the in-memory
/// collection stays the source of truth for the rest of the process lifetime.
async fn persist<T: Serialize>(file_path: &Path, items: &[T]) {
    let data = match serde_json::to_vec_pretty(items) {
        Ok(data) => data,
        Err(e) => {
            STORE_WRITE_ERRORS_TOTAL.inc();
            error!(file = %file_path.display(), error = %e, "failed to serialize records");
            return;
        }
    };
    match fs::write(file_path, data).await {
        Ok(()) => info!(file = %file_path.display(), count = items.len(), "saved records to file"),
        Err(e) => {
            STORE_WRITE_ERRORS_TOTAL.inc();
            error!(file = %file_path.display(), error = %e, "failed to save records; in-memory state remains authoritative");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("json_list_store_{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn absent_file_is_seeded_and_persisted() -> Result<(), anyhow::Error> {
        let tmp = temp_path();
        let store = JsonListStore::open(&tmp, vec!["a".to_string(), "b".to_string()]).await?;
        assert_eq!(store.snapshot().await, vec!["a", "b"]);

        // the seed was written out, so a reopen with a different seed ignores it
        let reopened = JsonListStore::open(&tmp, vec!["z".to_string()]).await?;
        assert_eq!(reopened.snapshot().await, vec!["a", "b"]);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_degrades_to_empty() -> Result<(), anyhow::Error> {
        let tmp = temp_path();
        fs::write(&tmp, b"not json at all").await?;
        let store = JsonListStore::<String>::open(&tmp, vec!["seed".to_string()]).await?;
        assert!(store.snapshot().await.is_empty());

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn append_rewrites_file_in_order() -> Result<(), anyhow::Error> {
        let tmp = temp_path();
        let store = JsonListStore::open(&tmp, Vec::<String>::new()).await?;
        store.append_with(|_| "first".to_string()).await;
        store.append_with(|items| format!("after {}", items.len())).await;

        let reopened = JsonListStore::<String>::open(&tmp, Vec::new()).await?;
        assert_eq!(reopened.snapshot().await, vec!["first", "after 1"]);

        // pretty-printed for human inspection: one indented element per line
        let text = fs::read_to_string(&tmp).await?;
        assert!(text.starts_with("[\n"));
        assert!(text.contains("\n  \"first\""));

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn find_scans_in_order() -> Result<(), anyhow::Error> {
        let tmp = temp_path();
        let store = JsonListStore::open(&tmp, vec![1u64, 2, 3]).await?;
        assert_eq!(store.find(|n| *n > 1).await, Some(2));
        assert_eq!(store.find(|n| *n > 9).await, None);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }
}
