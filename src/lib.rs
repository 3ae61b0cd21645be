//! unisync: Unigraph-to-Markdown vault sync
//!
//! Listens for change notifications from a Unigraph backend, flattens each
//! changed note entity into Markdown pages and writes them into a vault.
//!
//! # Core Concepts
//!
//! - **Entities**: read-only snapshots of backend graph nodes
//! - **Pages**: one flattened document per page root; semantic references
//!   split an entity into several pages
//! - **Vaults**: file stores the rendered pages are created in or updated in
//!
//! # Example
//!
//! ```
//! use unisync::{translate, ChildRef, GraphEntity};
//!
//! let note = GraphEntity::note("0x1", "Groceries")
//!     .with_child(ChildRef::subentity(0.0, GraphEntity::note("0x2", "milk")));
//! let docs = translate(&[note]);
//! assert_eq!(docs[0].path, "Groceries.md");
//! assert_eq!(docs[0].content, "\n  - milk");
//! ```

pub mod config;
pub mod embed;
mod graph;
pub mod sync;
pub mod translate;
pub mod vault;

pub use config::{ConfigError, SyncConfig};
pub use embed::{container_id, embed_fence, find_embeds, EmbedDirective};
pub use graph::{schema, ChildKind, ChildRef, EntityError, EntityResult, GraphEntity};
pub use sync::{
    BatchReport, CancellationToken, ClientError, SyncClient, SyncError, SyncOptions,
    SyncOrchestrator, SyncState, UnigraphClient,
};
pub use translate::{translate, Document, Page, RenameMapping, TextNode};
pub use vault::{write_or_update, FileHandle, FsVault, MemoryVault, Vault, VaultError, WriteOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
