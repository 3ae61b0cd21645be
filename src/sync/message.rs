//! Inbound sync notifications

use serde::Deserialize;

/// Message type announcing changed entities
pub const SYNC_UPDATED: &str = "sync_updated";

/// `{"type": "sync_updated", "result": [uid, ...]}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub result: Vec<String>,
}

impl SyncNotification {
    /// Parse a raw channel message.
    ///
    /// Returns `None` for anything that is not a well-formed sync update;
    /// other traffic shares the channel, so this is not an error.
    pub fn parse(raw: &str) -> Option<Self> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(rename = "type")]
            kind: Option<String>,
        }

        let envelope: Envelope = serde_json::from_str(raw).ok()?;
        if envelope.kind.as_deref() != Some(SYNC_UPDATED) {
            return None;
        }
        serde_json::from_str(raw).ok()
    }
}
