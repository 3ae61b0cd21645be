//! SyncOrchestrator: drives the listen → fetch → translate → write → ack cycle

use super::cancel::CancellationToken;
use super::client::{ClientError, SyncClient};
use super::message::SyncNotification;
use crate::translate::{translate, Document};
use crate::vault::{write_or_update, Vault, WriteOutcome};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;

/// Sync topic the vault subscribes to
pub const DEFAULT_TOPIC: &str = "$/entity/obsidian_sync_resource";

/// Client identifier registered with the backend
pub const DEFAULT_CLIENT_ID: &str = "UnigraphTest";

/// Errors that stop the sync loop
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Backend not ready after {0:?}")]
    NotReady(Duration),

    #[error("Backend client error: {0}")]
    Client(#[from] ClientError),
}

/// Result type for orchestrator operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Where the orchestrator is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Listening,
    FetchPending,
    Translating,
    Persisting,
    AckPending,
    Terminal,
}

/// Subscription settings
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub topic: String,
    pub client_id: String,
    /// Upper bound on waiting for the backend; `None` waits indefinitely
    pub ready_timeout: Option<Duration>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            ready_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// A page write that was abandoned for this cycle
#[derive(Debug, Clone)]
pub struct PageFailure {
    pub path: String,
    pub error: String,
}

/// What happened to one batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// The identifiers announced by the backend
    pub uids: Vec<String>,
    pub started_at: DateTime<Utc>,
    /// Number of pages partitioned from the fetched entities
    pub pages: usize,
    pub created: Vec<String>,
    pub modified: Vec<String>,
    pub failed: Vec<PageFailure>,
    /// Set when the fetch failed; no pages were written
    pub fetch_error: Option<String>,
    pub acknowledged: bool,
}

impl BatchReport {
    fn new(uids: Vec<String>) -> Self {
        Self {
            uids,
            started_at: Utc::now(),
            pages: 0,
            created: Vec::new(),
            modified: Vec::new(),
            failed: Vec::new(),
            fetch_error: None,
            acknowledged: false,
        }
    }

    /// Number of pages that reached the vault
    pub fn written(&self) -> usize {
        self.created.len() + self.modified.len()
    }
}

/// The incremental sync loop
///
/// Batches are processed one at a time: a notification arriving while a
/// batch is in flight waits until that batch has been acknowledged.
pub struct SyncOrchestrator {
    client: Arc<dyn SyncClient>,
    vault: Arc<dyn Vault>,
    options: SyncOptions,
    state: Mutex<SyncState>,
    cancel: CancellationToken,
}

impl SyncOrchestrator {
    pub fn new(client: Arc<dyn SyncClient>, vault: Arc<dyn Vault>, options: SyncOptions) -> Self {
        Self {
            client,
            vault,
            options,
            state: Mutex::new(SyncState::Idle),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops `run()` after the current batch
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, next: SyncState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        tracing::trace!(from = ?*state, to = ?next, "sync state");
        *state = next;
    }

    /// Wait for the backend, subscribe, and process notifications until the
    /// message stream closes or the token is cancelled.
    pub async fn run(&self) -> SyncResult<()> {
        self.wait_ready().await?;

        let messages = self.client.subscribe();
        self.client
            .start_sync_listen(&self.options.topic, &self.options.client_id)
            .await?;
        self.transition(SyncState::Listening);
        tracing::info!(
            topic = %self.options.topic,
            client_id = %self.options.client_id,
            "listening for sync updates"
        );

        let (queue, mut notifications) = mpsc::unbounded_channel();
        let pump = tokio::spawn(queue_notifications(messages, queue));

        loop {
            let notification = tokio::select! {
                _ = self.cancel.cancelled() => break,
                next = notifications.recv() => match next {
                    Some(notification) => notification,
                    None => break,
                },
            };
            self.process_batch(notification.result).await;
        }

        pump.abort();
        self.transition(SyncState::Terminal);
        tracing::info!("sync loop stopped");
        Ok(())
    }

    async fn wait_ready(&self) -> SyncResult<()> {
        match self.options.ready_timeout {
            Some(limit) => tokio::time::timeout(limit, self.client.ready())
                .await
                .map_err(|_| SyncError::NotReady(limit))??,
            None => self.client.ready().await?,
        }
        Ok(())
    }

    /// Process one raw channel message.
    ///
    /// Returns `None` when the message is not a sync update.
    pub async fn handle_message(&self, raw: &str) -> Option<BatchReport> {
        let notification = SyncNotification::parse(raw)?;
        Some(self.process_batch(notification.result).await)
    }

    /// Fetch, translate, persist and acknowledge one batch.
    ///
    /// Page write failures are logged and do not block the acknowledgement.
    /// A failed fetch skips the acknowledgement so the backend can re-announce
    /// the batch.
    pub async fn process_batch(&self, uids: Vec<String>) -> BatchReport {
        let mut report = BatchReport::new(uids);
        tracing::debug!(batch_size = report.uids.len(), "sync batch received");

        self.transition(SyncState::FetchPending);
        let entities = match self.client.get_object(&report.uids).await {
            Ok(entities) => entities,
            Err(e) => {
                tracing::warn!(error = %e, uids = ?report.uids, "failed to fetch entities");
                report.fetch_error = Some(e.to_string());
                self.transition(SyncState::Listening);
                return report;
            }
        };

        self.transition(SyncState::Translating);
        let documents = translate(&entities);
        report.pages = documents.len();

        self.transition(SyncState::Persisting);
        self.persist(&documents, &mut report).await;

        self.transition(SyncState::AckPending);
        match self
            .client
            .acknowledge_sync(&self.options.topic, &self.options.client_id, &report.uids)
            .await
        {
            Ok(()) => report.acknowledged = true,
            Err(e) => tracing::warn!(error = %e, "failed to acknowledge sync batch"),
        }

        self.transition(SyncState::Listening);
        tracing::info!(
            pages = report.pages,
            created = report.created.len(),
            modified = report.modified.len(),
            failed = report.failed.len(),
            "sync batch complete"
        );
        report
    }

    /// Write every document concurrently and wait for all writes to settle.
    async fn persist(&self, documents: &[Document], report: &mut BatchReport) {
        let vault = self.vault.as_ref();
        let outcomes = join_all(
            documents
                .iter()
                .map(|doc| write_or_update(vault, &doc.path, &doc.content)),
        )
        .await;

        for (doc, outcome) in documents.iter().zip(outcomes) {
            match outcome {
                Ok(WriteOutcome::Created) => report.created.push(doc.path.clone()),
                Ok(WriteOutcome::Modified) => report.modified.push(doc.path.clone()),
                Err(e) => {
                    tracing::warn!(path = %doc.path, error = %e, "failed to write page");
                    report.failed.push(PageFailure {
                        path: doc.path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}

/// Drain the shared inbound channel into the orchestrator's own queue.
///
/// Runs independently of batch processing so the bounded broadcast channel
/// is read while a batch is in flight.
async fn queue_notifications(
    mut messages: broadcast::Receiver<String>,
    queue: mpsc::UnboundedSender<SyncNotification>,
) {
    loop {
        match messages.recv().await {
            Ok(raw) => {
                if let Some(notification) = SyncNotification::parse(&raw) {
                    if queue.send(notification).is_err() {
                        break;
                    }
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "dropped inbound messages");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
