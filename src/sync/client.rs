//! SyncClient trait: the backend connection the orchestrator drives

use crate::graph::{EntityError, GraphEntity};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors from the backend connection
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection closed: {0}")]
    Closed(String),

    #[error("backend rejected {event}: {message}")]
    Backend { event: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("entity error: {0}")]
    Entity(#[from] EntityError),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// The backend operations the sync cycle needs.
///
/// Implementations own the connection lifecycle; the orchestrator only
/// awaits readiness and then issues requests.
#[async_trait]
pub trait SyncClient: Send + Sync {
    /// Resolve once the connection is established.
    async fn ready(&self) -> ClientResult<()>;

    /// Subscribe to change notifications for `topic` under `client_id`.
    async fn start_sync_listen(&self, topic: &str, client_id: &str) -> ClientResult<()>;

    /// Raw inbound messages. The channel is shared with other traffic;
    /// consumers filter for the messages they understand.
    fn subscribe(&self) -> broadcast::Receiver<String>;

    /// Fetch full entity graphs for `uids`.
    async fn get_object(&self, uids: &[String]) -> ClientResult<Vec<GraphEntity>>;

    /// Tell the backend that `uids` were consumed for `topic`.
    async fn acknowledge_sync(&self, topic: &str, client_id: &str, uids: &[String]) -> ClientResult<()>;
}
