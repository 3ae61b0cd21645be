//! Incremental sync between the backend and a vault
//!
//! The orchestrator subscribes to a sync topic, and for each change batch
//! fetches the entities, translates them, writes the pages and acknowledges
//! the batch.

mod cancel;
mod client;
mod message;
mod orchestrator;
mod unigraph;

pub use cancel::CancellationToken;
pub use client::{ClientError, ClientResult, SyncClient};
pub use message::{SyncNotification, SYNC_UPDATED};
pub use orchestrator::{
    BatchReport, PageFailure, SyncError, SyncOptions, SyncOrchestrator, SyncResult, SyncState,
    DEFAULT_CLIENT_ID, DEFAULT_TOPIC,
};
pub use unigraph::{ConnectionState, UnigraphClient};
