//! Vault trait definitions

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during vault operations
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid vault path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

/// Handle to an existing file in a vault
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle {
    path: String,
}

impl FileHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Vault-relative path
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// How a document reached the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Modified,
}

/// Trait for vault backends
///
/// Implementations serialize their own file operations and must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait Vault: Send + Sync {
    /// Create a new file. Fails with `AlreadyExists` if the path is occupied.
    async fn create(&self, path: &str, content: &str) -> VaultResult<FileHandle>;

    /// Overwrite an existing file
    async fn modify(&self, file: &FileHandle, content: &str) -> VaultResult<()>;

    /// Look up an existing file by vault-relative path
    async fn get_abstract_file_by_path(&self, path: &str) -> Option<FileHandle>;
}

/// Create `path`, or overwrite it if it already exists.
///
/// Any failure other than `AlreadyExists` on create is returned unchanged.
pub async fn write_or_update(
    vault: &dyn Vault,
    path: &str,
    content: &str,
) -> VaultResult<WriteOutcome> {
    match vault.create(path, content).await {
        Ok(_) => Ok(WriteOutcome::Created),
        Err(VaultError::AlreadyExists(_)) => {
            let file = vault
                .get_abstract_file_by_path(path)
                .await
                .ok_or_else(|| VaultError::NotFound(path.to_string()))?;
            vault.modify(&file, content).await?;
            Ok(WriteOutcome::Modified)
        }
        Err(e) => Err(e),
    }
}
