use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::domain::{error::RepositoryError, repositories::handoff_store::HandoffStore};

/// One file per key under a directory; a write replaces the whole file.
#[derive(Clone)]
pub struct FileHandoffStore {
    dir: PathBuf,
}

impl FileHandoffStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, RepositoryError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !valid {
            return Err(RepositoryError::StorageError(format!("invalid key: {key}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl HandoffStore for FileHandoffStore {
    async fn put(&self, key: &str, value: String) -> Result<(), RepositoryError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RepositoryError::StorageError(e.to_string()))?;
        fs::write(&tmp, value)
            .await
            .map_err(|e| RepositoryError::StorageError(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| RepositoryError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepositoryError::StorageError(e.to_string())),
        }
    }
}
