//! File vaults that receive rendered documents
//!
//! Writers go through the `Vault` trait. `FsVault` writes into a directory
//! on disk; `MemoryVault` keeps files in memory for tests and dry runs.

mod fs;
mod memory;
mod traits;

pub use fs::FsVault;
pub use memory::MemoryVault;
pub use traits::{write_or_update, FileHandle, Vault, VaultError, VaultResult, WriteOutcome};
