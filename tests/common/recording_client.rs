//! Recording backend client
//!
//! Serves entities from a fixed map and records every call, so tests can
//! assert on exactly what the orchestrator asked for.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use unisync::sync::ClientResult;
use unisync::{ClientError, GraphEntity, SyncClient};

/// Capacity of the inbound broadcast channel
pub const INBOUND_CAPACITY: usize = 16;

/// One call made against the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    StartSyncListen { topic: String, client_id: String },
    GetObject(Vec<String>),
    AcknowledgeSync { topic: String, client_id: String, uids: Vec<String> },
}

pub struct RecordingClient {
    entities: HashMap<String, GraphEntity>,
    calls: Mutex<Vec<Call>>,
    inbound: Mutex<Option<broadcast::Sender<String>>>,
    fail_fetch: bool,
    fetch_delay: Option<Duration>,
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingClient {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            inbound: Mutex::new(Some(broadcast::channel(INBOUND_CAPACITY).0)),
            fail_fetch: false,
            fetch_delay: None,
        }
    }

    /// Serve `entity` for its uid
    pub fn with_entity(mut self, entity: GraphEntity) -> Self {
        self.entities.insert(entity.uid.clone(), entity);
        self
    }

    /// Make every `get_object` fail
    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Hold every `get_object` for `delay` before answering
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::GetObject(uids) => Some(uids),
                _ => None,
            })
            .collect()
    }

    pub fn acks(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::AcknowledgeSync { uids, .. } => Some(uids),
                _ => None,
            })
            .collect()
    }

    /// Deliver a raw message to subscribers
    pub fn push(&self, raw: &str) {
        if let Some(sender) = self.inbound.lock().unwrap().as_ref() {
            let _ = sender.send(raw.to_string());
        }
    }

    /// Close the message stream
    pub fn disconnect(&self) {
        self.inbound.lock().unwrap().take();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SyncClient for RecordingClient {
    async fn ready(&self) -> ClientResult<()> {
        Ok(())
    }

    async fn start_sync_listen(&self, topic: &str, client_id: &str) -> ClientResult<()> {
        self.record(Call::StartSyncListen {
            topic: topic.to_string(),
            client_id: client_id.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        match self.inbound.lock().unwrap().as_ref() {
            Some(sender) => sender.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    async fn get_object(&self, uids: &[String]) -> ClientResult<Vec<GraphEntity>> {
        self.record(Call::GetObject(uids.to_vec()));
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch {
            return Err(ClientError::Backend {
                event: "get_object".to_string(),
                message: "unavailable".to_string(),
            });
        }
        Ok(uids
            .iter()
            .filter_map(|uid| self.entities.get(uid).cloned())
            .collect())
    }

    async fn acknowledge_sync(&self, topic: &str, client_id: &str, uids: &[String]) -> ClientResult<()> {
        self.record(Call::AcknowledgeSync {
            topic: topic.to_string(),
            client_id: client_id.to_string(),
            uids: uids.to_vec(),
        });
        Ok(())
    }
}
