// src/core/fs_ops.rs
//! File system helpers shared by the storage, export and config layers

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub struct FsOps;

impl FsOps {
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            debug!("Created directory: {}", path.display());
        }
        Ok(())
    }

    pub async fn write_bytes_safe(path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            Self::ensure_dir_exists(parent).await?;
        }

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        debug!("Written file: {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    /// Synchronous write through a sibling temp file, so readers never observe a torn file
    pub fn replace_file_sync(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write file: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to replace file: {}", path.display()))?;
        Ok(())
    }

    pub fn normalize_path(base: &Path, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            base.join(relative)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        let base = Path::new("/srv");
        assert_eq!(
            FsOps::normalize_path(base, Path::new("data")),
            PathBuf::from("/srv/data")
        );
        assert_eq!(
            FsOps::normalize_path(base, Path::new("/abs/data")),
            PathBuf::from("/abs/data")
        );
    }

    #[tokio::test]
    async fn test_write_bytes_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("file.bin");
        FsOps::write_bytes_safe(&target, b"abc").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"abc");
    }

    #[test]
    fn test_replace_file_sync_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("store.json");
        FsOps::replace_file_sync(&target, "{\"a\":1}").unwrap();
        FsOps::replace_file_sync(&target, "{\"a\":2}").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{\"a\":2}");
        assert!(!target.with_extension("tmp").exists());
    }
}
