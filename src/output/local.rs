//! Local backup directory for batches that could not be uploaded

use crate::output::traits::OutputResult;
use std::path::{Path, PathBuf};

/// Writes batches under one directory, creating it on first use
#[derive(Debug, Clone)]
pub struct LocalBackup {
    dir: PathBuf,
}

impl LocalBackup {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `bytes` to `<dir>/<name>` and returns the path
    pub async fn save(&self, name: &str, bytes: &[u8]) -> OutputResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}
