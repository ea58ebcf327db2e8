//! Storage root management: listing, deletion and serving of downloaded files
//!
//! Nothing is cached. Every call re-reads the directory, so the store picks up
//! files added or removed behind its back.

use crate::error::{Error, FileFailure, Result, StoreError};
use crate::types::StoredFile;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Fallback content type for unknown extensions
const OCTET_STREAM: &str = "application/octet-stream";

/// Handle to the flat storage directory
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

/// An opened stored file ready to be streamed to a client
#[derive(Debug)]
pub struct ServedFile {
    /// File name inside the storage root
    pub name: String,
    /// Canonical location, checked to lie inside the storage root
    pub path: PathBuf,
    /// Open handle positioned at the start of the file
    pub file: tokio::fs::File,
    /// Best-effort MIME type derived from the extension
    pub content_type: String,
    /// Size in bytes at open time
    pub len: u64,
}

impl FileStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage root if it does not exist yet
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create storage directory '{}': {}",
                    self.root.display(),
                    e
                ),
            ))
        })
    }

    /// Map an untrusted file name to a path directly inside the storage root
    ///
    /// Only a single plain path component is accepted. Separators, `.`/`..`,
    /// NUL bytes and empty names are rejected before the filesystem is touched.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let reject = |reason: &str| Error::InvalidFileName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(reject("empty name"));
        }
        if name == "." || name == ".." {
            return Err(reject("reserved name"));
        }
        if name.contains(['/', '\\', '\0']) {
            return Err(reject("contains a path separator or NUL byte"));
        }

        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(name)),
            _ => Err(reject("not a plain file name")),
        }
    }

    /// List regular files, newest first
    ///
    /// Symlinks are followed only while they stay inside the storage root, so
    /// the listing shows exactly what [`open`](Self::open) will serve.
    pub async fn list(&self) -> Result<Vec<StoredFile>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let root = tokio::fs::canonicalize(&self.root).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::debug!(path = ?entry.path(), "skipping non UTF-8 file name");
                continue;
            };

            let canonical = match tokio::fs::canonicalize(entry.path()).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!(file = %name, error = %e, "file vanished during listing");
                    continue;
                }
            };
            if !canonical.starts_with(&root) {
                tracing::debug!(file = %name, "skipping link that leaves the storage root");
                continue;
            }

            let metadata = match tokio::fs::metadata(&canonical).await {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(file = %name, error = %e, "file vanished during listing");
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            files.push(StoredFile {
                name,
                size_bytes: metadata.len(),
                created_at: created_at(&metadata),
            });
        }

        files.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(files)
    }

    /// Delete one file
    ///
    /// Returns `Ok(false)` when the file does not exist, so retried requests
    /// are harmless.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let path = self.resolve(name)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(file = %name, "deleted stored file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(file = %name, "delete of absent file ignored");
                Ok(false)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Remove every regular file currently in the storage root
    ///
    /// Works from a snapshot of the directory taken at call time. Individual
    /// failures do not stop the sweep; they are collected into
    /// [`StoreError::PartialClear`].
    pub async fn clear_all(&self) -> Result<usize> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut snapshot = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            snapshot.push(entry);
        }

        let mut deleted = 0;
        let mut failures = Vec::new();

        for entry in snapshot {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            match tokio::fs::metadata(&path).await {
                Ok(m) if m.is_file() => {}
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    failures.push(FileFailure {
                        name,
                        reason: e.to_string(),
                    });
                    continue;
                }
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => deleted += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "failed to delete stored file");
                    failures.push(FileFailure {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            tracing::info!(deleted, "cleared storage directory");
            Ok(deleted)
        } else {
            Err(Error::Store(StoreError::PartialClear { deleted, failures }))
        }
    }

    /// Open a stored file for streaming
    ///
    /// The resolved path is canonicalized and must still lie inside the
    /// canonical storage root, which also rules out symlinks pointing elsewhere.
    pub async fn open(&self, name: &str) -> Result<ServedFile> {
        let path = self.resolve(name)?;
        let not_found = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(name.to_string())
            } else {
                Error::Io(e)
            }
        };

        let root = tokio::fs::canonicalize(&self.root).await?;
        let canonical = tokio::fs::canonicalize(&path).await.map_err(not_found)?;
        if !canonical.starts_with(&root) {
            tracing::warn!(file = %name, "refusing to serve file outside storage root");
            return Err(Error::InvalidFileName {
                name: name.to_string(),
                reason: "resolves outside the storage root".to_string(),
            });
        }

        let file = tokio::fs::File::open(&canonical).await.map_err(not_found)?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(Error::NotFound(name.to_string()));
        }

        Ok(ServedFile {
            name: name.to_string(),
            path: canonical,
            file,
            content_type: content_type_for(name),
            len: metadata.len(),
        })
    }
}

/// Best-effort MIME type from the file extension
pub fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

fn created_at(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    let time = metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH);
    DateTime::<Utc>::from(time)
}
