//! On-disk copies of service responses.
//!
//! Each successful upload and extraction response is written as pretty JSON to
//! `<dir>/<prefix>_<kind>.json`. A later run started with cache reuse reads the stored
//! response back instead of calling the service again. Credentials are never stored.

use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or writing stored responses.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("Failed to access {}", .path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// A stored file did not contain valid JSON.
    #[error("Stored response {} is not valid JSON", .path.display())]
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Kinds of responses kept on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Response to a document upload.
    Upload,
    /// Response to an extraction query.
    Extract,
}

impl ResponseKind {
    const ALL: [Self; 2] = [Self::Upload, Self::Extract];

    fn file_suffix(self) -> &'static str {
        match self {
            Self::Upload => "upload_document.json",
            Self::Extract => "extract_information.json",
        }
    }
}

/// Directory-backed store for service responses, namespaced by a file prefix.
#[derive(Debug, Clone)]
pub struct ResponseStore {
    dir: PathBuf,
    prefix: String,
}

impl ResponseStore {
    /// Create a store rooted at `dir`; nothing is touched until the first write.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// File that holds responses of `kind`.
    pub fn path_for(&self, kind: ResponseKind) -> PathBuf {
        self.dir
            .join(format!("{}_{}", self.prefix, kind.file_suffix()))
    }

    /// Persist a response, replacing any earlier copy.
    pub fn save(&self, kind: ResponseKind, response: &Value) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(kind);
        let json = serde_json::to_string_pretty(response).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Stored response");
        Ok(path)
    }

    /// Read a stored response, returning `None` when nothing was stored.
    pub fn load(&self, kind: ResponseKind) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(kind);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }

    /// Remove every stored response for this prefix.
    pub fn clear(&self) -> Result<(), StoreError> {
        for kind in ResponseKind::ALL {
            remove_if_present(&self.path_for(kind))?;
        }
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed stored response");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn saved_responses_are_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResponseStore::new(dir.path().join("out"), "demo");

        let path = store
            .save(ResponseKind::Upload, &json!({ "success": true, "indexed": true }))
            .unwrap();
        assert!(path.ends_with("demo_upload_document.json"));

        let loaded = store.load(ResponseKind::Upload).unwrap().expect("stored");
        assert_eq!(loaded["indexed"], json!(true));
        assert!(store.load(ResponseKind::Extract).unwrap().is_none());
    }

    #[test]
    fn clear_removes_only_this_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mine = ResponseStore::new(dir.path(), "mine");
        let theirs = ResponseStore::new(dir.path(), "theirs");
        mine.save(ResponseKind::Extract, &json!({ "answer": "a" }))
            .unwrap();
        theirs
            .save(ResponseKind::Extract, &json!({ "answer": "b" }))
            .unwrap();

        mine.clear().unwrap();
        mine.clear().unwrap();

        assert!(mine.load(ResponseKind::Extract).unwrap().is_none());
        assert!(theirs.load(ResponseKind::Extract).unwrap().is_some());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResponseStore::new(dir.path(), "demo");
        std::fs::write(store.path_for(ResponseKind::Upload), "{not json").unwrap();

        let err = store.load(ResponseKind::Upload).unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }
}
