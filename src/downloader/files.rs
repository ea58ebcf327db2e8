//! Storage root operations that publish lifecycle events.

use crate::error::{Error, Result, StoreError};
use crate::store::ServedFile;
use crate::types::{Event, StoredFile};

use super::MediaDownloader;

impl MediaDownloader {
    /// List stored files, newest first
    pub async fn list_files(&self) -> Result<Vec<StoredFile>> {
        self.store.list().await
    }

    /// Delete a stored file; absent files are a no-op
    pub async fn delete_file(&self, name: &str) -> Result<bool> {
        let removed = self.store.delete(name).await?;
        if removed {
            self.emit_event(Event::FileDeleted {
                name: name.to_string(),
            });
        }
        Ok(removed)
    }

    /// Remove every stored file
    ///
    /// A `FilesCleared` event is emitted whenever at least one file was removed,
    /// including partial clears.
    pub async fn clear_all(&self) -> Result<usize> {
        match self.store.clear_all().await {
            Ok(deleted) => {
                self.emit_event(Event::FilesCleared { deleted });
                Ok(deleted)
            }
            Err(Error::Store(StoreError::PartialClear { deleted, failures })) => {
                tracing::warn!(deleted, failed = failures.len(), "storage directory partially cleared");
                if deleted > 0 {
                    self.emit_event(Event::FilesCleared { deleted });
                }
                Err(Error::Store(StoreError::PartialClear { deleted, failures }))
            }
            Err(e) => Err(e),
        }
    }

    /// Open a stored file for streaming to a client
    pub async fn open_file(&self, name: &str) -> Result<ServedFile> {
        self.store.open(name).await
    }
}
