//! WebSocket client for the Unigraph backend
//!
//! Requests are JSON events `{"type":"event","event":<name>,"id":<n>,...}`;
//! the backend answers with `{"type":"response","id":<n>,"success":bool,...}`.
//! Every other inbound text frame is broadcast to subscribers, since change
//! notifications arrive on the same socket.

use super::client::{ClientError, ClientResult, SyncClient};
use crate::graph::GraphEntity;
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Capacity of the inbound broadcast channel
const INBOUND_CAPACITY: usize = 256;

/// Connection lifecycle as seen by callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed(String),
}

#[derive(Debug, Deserialize)]
struct Response {
    id: u64,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    body: Value,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Value,
}

impl Response {
    fn payload(self) -> Value {
        if self.body.is_null() {
            self.result
        } else {
            self.body
        }
    }
}

type Pending = Arc<DashMap<u64, oneshot::Sender<Response>>>;

/// Subscription handle shared with the connection task, which takes it on
/// close so subscribers observe the end of the stream.
type Inbound = Arc<Mutex<Option<broadcast::Sender<String>>>>;

/// Unigraph backend connection
///
/// `spawn` returns immediately; the socket is opened by a background task
/// and `ready()` resolves once it is established.
pub struct UnigraphClient {
    outbound: mpsc::UnboundedSender<Message>,
    pending: Pending,
    next_id: AtomicU64,
    inbound: Inbound,
    state: watch::Receiver<ConnectionState>,
}

impl UnigraphClient {
    /// Start connecting to `url` (e.g. `ws://localhost:3001`).
    pub fn spawn(url: impl Into<String>) -> Self {
        let url = url.into();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (sender, _) = broadcast::channel(INBOUND_CAPACITY);
        let inbound: Inbound = Arc::new(Mutex::new(Some(sender.clone())));
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);
        let pending: Pending = Arc::new(DashMap::new());

        tokio::spawn(drive(
            url,
            outbound_rx,
            pending.clone(),
            sender,
            inbound.clone(),
            state_tx,
        ));

        Self {
            outbound,
            pending,
            next_id: AtomicU64::new(1),
            inbound,
            state,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    fn envelope(&self, event: &str, params: Value) -> (u64, Value) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut payload = json!({ "type": "event", "event": event, "id": id });
        if let (Value::Object(fields), Value::Object(extra)) = (&mut payload, params) {
            fields.extend(extra);
        }
        (id, payload)
    }

    fn send(&self, payload: &Value) -> ClientResult<()> {
        self.outbound
            .send(Message::Text(payload.to_string()))
            .map_err(|_| ClientError::Closed("connection task stopped".to_string()))
    }

    /// Send an event without waiting for its response.
    fn notify(&self, event: &str, params: Value) -> ClientResult<()> {
        let (_, payload) = self.envelope(event, params);
        tracing::debug!(event, "sending event");
        self.send(&payload)
    }

    /// Send an event and wait for the matching response.
    async fn request(&self, event: &str, params: Value) -> ClientResult<Value> {
        let (id, payload) = self.envelope(event, params);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        tracing::debug!(event, id, "sending request");
        if let Err(e) = self.send(&payload) {
            self.pending.remove(&id);
            return Err(e);
        }

        let response = rx
            .await
            .map_err(|_| ClientError::Closed(format!("no response to {}", event)))?;
        if !response.success {
            return Err(ClientError::Backend {
                event: event.to_string(),
                message: response.error.to_string(),
            });
        }
        Ok(response.payload())
    }
}

#[async_trait]
impl SyncClient for UnigraphClient {
    async fn ready(&self) -> ClientResult<()> {
        let mut state = self.state.clone();
        loop {
            let current = state.borrow_and_update().clone();
            match current {
                ConnectionState::Open => return Ok(()),
                ConnectionState::Closed(reason) => return Err(ClientError::Closed(reason)),
                ConnectionState::Connecting => {}
            }
            state
                .changed()
                .await
                .map_err(|_| ClientError::Closed("connection task stopped".to_string()))?;
        }
    }

    async fn start_sync_listen(&self, topic: &str, client_id: &str) -> ClientResult<()> {
        self.notify("start_sync_listen", json!({ "resource": topic, "key": client_id }))
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        let inbound = self.inbound.lock().unwrap_or_else(|e| e.into_inner());
        match inbound.as_ref() {
            Some(sender) => sender.subscribe(),
            None => {
                // Already disconnected: hand out a receiver that is closed.
                let (_, rx) = broadcast::channel(1);
                rx
            }
        }
    }

    async fn get_object(&self, uids: &[String]) -> ClientResult<Vec<GraphEntity>> {
        let body = self.request("get_object", json!({ "uidOrQuery": uids })).await?;
        Ok(GraphEntity::from_batch(&body)?)
    }

    async fn acknowledge_sync(&self, topic: &str, client_id: &str, uids: &[String]) -> ClientResult<()> {
        self.notify(
            "acknowledge_sync",
            json!({ "resource": topic, "key": client_id, "uids": uids }),
        )
    }
}

/// Connection task: owns the socket until either side closes.
async fn drive(
    url: String,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
    pending: Pending,
    sender: broadcast::Sender<String>,
    inbound: Inbound,
    state: watch::Sender<ConnectionState>,
) {
    let close = |reason: String, outbound_rx: mpsc::UnboundedReceiver<Message>| {
        state.send_replace(ConnectionState::Closed(reason));
        inbound.lock().unwrap_or_else(|e| e.into_inner()).take();
        // Close the queue first so no request can slip in after the clear;
        // dropping the senders fails every in-flight request.
        drop(outbound_rx);
        pending.clear();
    };

    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "failed to connect to backend");
            close(e.to_string(), outbound_rx);
            return;
        }
    };
    tracing::info!(url = %url, "connected to backend");
    state.send_replace(ConnectionState::Open);

    let (mut sink, mut stream) = ws.split();
    let reason = loop {
        tokio::select! {
            Some(msg) = outbound_rx.recv() => {
                if let Err(e) = sink.send(msg).await {
                    break e.to_string();
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => dispatch(text, &pending, &sender),
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => break "closed by backend".to_string(),
                Some(Err(e)) => break e.to_string(),
                Some(Ok(_)) => {}
            },
        }
    };

    tracing::warn!(url = %url, reason = %reason, "backend connection closed");
    drop(sender);
    close(reason, outbound_rx);
}

/// Parse a frame without serde_json's nesting limit; entity graphs nest
/// six levels per note.
fn parse_frame(text: &str) -> serde_json::Result<Value> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = Value::deserialize(&mut de)?;
    de.end()?;
    Ok(value)
}

/// Route one text frame: responses resolve their pending request, anything
/// else goes to subscribers.
fn dispatch(text: String, pending: &Pending, inbound: &broadcast::Sender<String>) {
    if let Ok(value) = parse_frame(&text) {
        if value.get("type").and_then(Value::as_str) == Some("response") {
            match serde_json::from_value::<Response>(value) {
                Ok(response) => match pending.remove(&response.id) {
                    Some((_, tx)) => {
                        let _ = tx.send(response);
                    }
                    None => tracing::debug!(id = response.id, "response for unknown request"),
                },
                Err(e) => tracing::warn!(error = %e, "malformed response frame"),
            }
            return;
        }
    }
    // No subscribers is not an error.
    let _ = inbound.send(text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Raw note in the backend's wrapped shape, children as subentities
    fn raw_note(uid: &str, text: &str, children: Vec<Value>) -> Value {
        let items: Vec<Value> = children
            .into_iter()
            .enumerate()
            .map(|(i, child)| {
                json!({
                    "_index": { "_value.#i": i },
                    "_value": { "type": { "unigraph.id": "$/schema/subentity" }, "_value": child }
                })
            })
            .collect();
        json!({
            "uid": uid,
            "type": { "unigraph.id": "$/schema/note_block" },
            "_value": { "text": { "_value.%": text }, "children": { "_value[": items } }
        })
    }

    fn deep_note(depth: usize) -> Value {
        (0..depth).rev().fold(raw_note("leaf", "leaf", Vec::new()), |child, i| {
            raw_note(&format!("0x{:x}", i), &format!("level {}", i), vec![child])
        })
    }

    /// Accept one connection and answer each request with `handler`;
    /// `None` hangs up.
    async fn serve(handler: fn(&Value) -> Option<Vec<Value>>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws_stream = accept_async(stream).await.unwrap();
            let (mut ws_sender, mut ws_receiver) = ws_stream.split();

            while let Some(Ok(Message::Text(text))) = ws_receiver.next().await {
                let request: Value = serde_json::from_str(&text).unwrap();
                let Some(replies) = handler(&request) else {
                    break;
                };
                for reply in replies {
                    ws_sender.send(Message::Text(reply.to_string())).await.unwrap();
                }
            }
        });

        format!("ws://{}", addr)
    }

    fn backend(request: &Value) -> Option<Vec<Value>> {
        let id = request["id"].clone();
        let replies = match request["event"].as_str()? {
            "start_sync_listen" => vec![json!({ "type": "sync_updated", "result": ["0x1"] })],
            "get_object" if request["uidOrQuery"] == json!(["0x1"]) => vec![json!({
                "type": "response", "id": id, "success": true,
                "body": [raw_note("0x1", "Project", vec![deep_note(25)])]
            })],
            "get_object" => vec![json!({
                "type": "response", "id": id, "success": false, "error": "not found"
            })],
            _ => Vec::new(),
        };
        Some(replies)
    }

    fn hang_up(_: &Value) -> Option<Vec<Value>> {
        None
    }

    #[test]
    fn response_payload_prefers_body() {
        let r: Response = serde_json::from_value(json!({
            "type": "response", "id": 1, "success": true, "body": [1], "result": [2]
        }))
        .unwrap();
        assert_eq!(r.payload(), json!([1]));

        let r: Response = serde_json::from_value(json!({
            "type": "response", "id": 2, "success": true, "result": [2]
        }))
        .unwrap();
        assert_eq!(r.payload(), json!([2]));
    }

    #[tokio::test]
    async fn dispatch_resolves_pending_and_broadcasts_the_rest() {
        let pending: Pending = Arc::new(DashMap::new());
        let (inbound, mut rx) = broadcast::channel(4);
        let (tx, response_rx) = oneshot::channel();
        pending.insert(7, tx);

        dispatch(r#"{"type":"response","id":7,"success":true,"body":"ok"}"#.to_string(), &pending, &inbound);
        dispatch(r#"{"type":"sync_updated","result":["a"]}"#.to_string(), &pending, &inbound);

        let response = response_rx.await.unwrap();
        assert!(response.success);
        assert!(pending.is_empty());
        assert!(rx.recv().await.unwrap().contains("sync_updated"));
        // Responses never occupy subscriber slots
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn deeply_nested_response_reaches_its_request() {
        let pending: Pending = Arc::new(DashMap::new());
        let (inbound, _rx) = broadcast::channel(4);
        let (tx, response_rx) = oneshot::channel();
        pending.insert(7, tx);

        let frame = json!({ "type": "response", "id": 7, "success": true, "body": [deep_note(30)] });
        dispatch(frame.to_string(), &pending, &inbound);

        let response = response_rx.await.unwrap();
        let entities = GraphEntity::from_batch(&response.payload()).unwrap();
        let mut depth = 0;
        let mut node = &entities[0];
        while let Some(child) = node.children().first() {
            depth += 1;
            node = &child.target;
        }
        assert_eq!(depth, 30);
        assert_eq!(node.text(), "leaf");
    }

    #[tokio::test]
    async fn requests_are_correlated_with_responses() {
        let client = UnigraphClient::spawn(serve(backend).await);
        client.ready().await.unwrap();
        assert_eq!(client.state(), ConnectionState::Open);

        let mut notifications = client.subscribe();
        client.start_sync_listen("topic", "key").await.unwrap();
        assert!(notifications.recv().await.unwrap().contains("sync_updated"));

        let entities = client.get_object(&["0x1".to_string()]).await.unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text(), "Project");
        assert_eq!(entities[0].children()[0].target.text(), "level 0");

        let err = client.get_object(&["0x404".to_string()]).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Backend { ref event, ref message }
                if event == "get_object" && message.contains("not found")
        ));

        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn connection_close_fails_pending_request() {
        let client = UnigraphClient::spawn(serve(hang_up).await);
        client.ready().await.unwrap();
        let mut notifications = client.subscribe();

        let err = client.get_object(&["0x1".to_string()]).await.unwrap_err();
        assert!(matches!(err, ClientError::Closed(_)));
        assert!(matches!(
            notifications.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert!(matches!(client.state(), ConnectionState::Closed(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_fails_readiness() {
        // Port 9 (discard) on localhost is not a WebSocket server.
        let client = UnigraphClient::spawn("ws://127.0.0.1:9");
        assert!(matches!(client.ready().await, Err(ClientError::Closed(_))));
    }
}
