//! File access used by templates and targets.
//!
//! All recipe I/O goes through [`FileSystem`] so a run can be observed or faked in tests.

use std::path::Path;

use async_trait::async_trait;

#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// Creates or truncates `path` and writes `contents`.
    async fn write(&self, path: &Path, contents: &str) -> std::io::Result<()>;

    /// Creates `path` and all missing parents. Succeeds when the directory already exists.
    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()>;
}

/// [`FileSystem`] over the local disk via `tokio::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFileSystem;

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }
}
