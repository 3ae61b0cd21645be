//! In-memory vault

use super::traits::{FileHandle, Vault, VaultError, VaultResult};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::io;

/// Vault that keeps file contents in memory
///
/// Paths registered with `fail_writes_to` reject every write with an IO
/// error, which lets callers exercise partial-failure handling.
#[derive(Debug, Default)]
pub struct MemoryVault {
    files: DashMap<String, String>,
    failing: DashSet<String>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject all writes to `path`
    pub fn fail_writes_to(self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    pub fn read(&self, path: &str) -> Option<String> {
        self.files.get(path).map(|r| r.value().clone())
    }

    /// Sorted list of stored paths
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.iter().map(|r| r.key().clone()).collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn check_writable(&self, path: &str) -> VaultResult<()> {
        if self.failing.contains(path) {
            return Err(VaultError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("writes to {} are disabled", path),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Vault for MemoryVault {
    async fn create(&self, path: &str, content: &str) -> VaultResult<FileHandle> {
        self.check_writable(path)?;
        match self.files.entry(path.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(VaultError::AlreadyExists(path.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(content.to_string());
                Ok(FileHandle::new(path))
            }
        }
    }

    async fn modify(&self, file: &FileHandle, content: &str) -> VaultResult<()> {
        self.check_writable(file.path())?;
        match self.files.get_mut(file.path()) {
            Some(mut existing) => {
                *existing = content.to_string();
                Ok(())
            }
            None => Err(VaultError::NotFound(file.path().to_string())),
        }
    }

    async fn get_abstract_file_by_path(&self, path: &str) -> Option<FileHandle> {
        self.files
            .contains_key(path)
            .then(|| FileHandle::new(path))
    }
}
