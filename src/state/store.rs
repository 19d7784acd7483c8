use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{BotError, Result};

/// A single JSON document on disk with scoped read/update access.
///
/// Every `update` rewrites the whole document atomically (temp file + rename)
/// before returning, so a mutation is never acknowledged without being
/// persisted. Documents auto-initialize to their `Default` on first run.
pub struct JsonStore<T> {
    path: String,
    doc: RwLock<T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Open a store, creating the file with an empty document if absent
    pub async fn open(path: &str) -> Result<Self> {
        let doc = match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| BotError::StoreParse {
                    path: path.to_string(),
                    source: e,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let doc = T::default();
                persist(path, &doc).await?;
                doc
            }
            Err(e) => {
                return Err(BotError::StoreLoad {
                    path: path.to_string(),
                    source: e,
                })
            }
        };

        Ok(Self {
            path: path.to_string(),
            doc: RwLock::new(doc),
        })
    }

    /// Run a closure against the current document
    pub async fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let doc = self.doc.read().await;
        f(&doc)
    }

    /// Mutate the document and persist it before returning.
    ///
    /// If the closure returns an error nothing is written; closures must
    /// only mutate on their success path.
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> Result<R>) -> Result<R> {
        let mut doc = self.doc.write().await;
        let out = f(&mut doc)?;
        persist(&self.path, &*doc).await?;
        Ok(out)
    }
}

/// Write a document atomically: temp file first, then rename
async fn persist<T: Serialize>(path: &str, doc: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(doc)?;

    let temp_path = format!("{}.tmp", path);
    tokio::fs::write(&temp_path, &content)
        .await
        .map_err(|e| BotError::StoreSave {
            path: path.to_string(),
            source: e,
        })?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| BotError::StoreSave {
            path: path.to_string(),
            source: e,
        })?;

    Ok(())
}
