//! Directory-backed vault

use super::traits::{FileHandle, Vault, VaultError, VaultResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Vault rooted at a directory on disk
///
/// Paths are vault-relative; absolute paths and `..` components are rejected.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Open a vault, creating the root directory if needed
    pub fn open(root: impl AsRef<Path>) -> VaultResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> VaultResult<PathBuf> {
        let relative = Path::new(path);
        let valid = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !valid {
            return Err(VaultError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn create(&self, path: &str, content: &str) -> VaultResult<FileHandle> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(VaultError::AlreadyExists(path.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(FileHandle::new(path))
    }

    async fn modify(&self, file: &FileHandle, content: &str) -> VaultResult<()> {
        let full = self.resolve(file.path())?;
        if !tokio::fs::try_exists(&full).await? {
            return Err(VaultError::NotFound(file.path().to_string()));
        }
        tokio::fs::write(&full, content).await?;
        Ok(())
    }

    async fn get_abstract_file_by_path(&self, path: &str) -> Option<FileHandle> {
        let full = self.resolve(path).ok()?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) if meta.is_file() => Some(FileHandle::new(path)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{write_or_update, WriteOutcome};

    #[tokio::test]
    async fn create_then_create_reports_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FsVault::open(dir.path()).unwrap();

        vault.create("note.md", "one").await.unwrap();
        let second = vault.create("note.md", "two").await;

        assert!(matches!(second, Err(VaultError::AlreadyExists(ref p)) if p == "note.md"));
        assert_eq!(std::fs::read_to_string(dir.path().join("note.md")).unwrap(), "one");
    }

    #[tokio::test]
    async fn write_or_update_falls_back_to_modify() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FsVault::open(dir.path()).unwrap();

        let first = write_or_update(&vault, "a_b.md", "v1").await.unwrap();
        let second = write_or_update(&vault, "a_b.md", "v2").await.unwrap();

        assert_eq!(first, WriteOutcome::Created);
        assert_eq!(second, WriteOutcome::Modified);
        assert_eq!(std::fs::read_to_string(dir.path().join("a_b.md")).unwrap(), "v2");
    }

    #[tokio::test]
    async fn escaping_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FsVault::open(dir.path().join("vault")).unwrap();

        for path in ["../outside.md", "/etc/passwd", ""] {
            let result = vault.create(path, "x").await;
            assert!(matches!(result, Err(VaultError::InvalidPath(_))), "{path} should be rejected");
        }
    }

    #[tokio::test]
    async fn missing_file_lookup_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FsVault::open(dir.path()).unwrap();

        assert!(vault.get_abstract_file_by_path("nope.md").await.is_none());
        let modify = vault.modify(&FileHandle::new("nope.md"), "x").await;
        assert!(matches!(modify, Err(VaultError::NotFound(_))));
    }
}
