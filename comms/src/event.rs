use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event type of plain chat messages
pub const MESSAGE_EVENT_TYPE: &str = "m.room.message";

/// Delivery status of an event that originated from this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
    /// The local echo is in flight
    Sending,
    /// The last attempt to send the local echo failed
    NotSent,
    /// The server acknowledged the event
    Sent,
}

/// A single entry of a room timeline.
///
/// Deserializes from the client-server wire format of a room event. The fields that only exist
/// on the client side (`sender_name`, `transaction_id`, `status`) are filled in by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Server assigned id, absent until a local echo is acknowledged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Type of the event, e.g. `m.room.message` or `m.room.member`
    #[serde(rename = "type")]
    pub event_type: String,
    /// User id of the sender
    pub sender: String,
    /// Milliseconds since the unix epoch, as stamped by the origin server
    #[serde(default)]
    pub origin_server_ts: i64,
    #[serde(default)]
    pub content: Value,
    /// Present on state events only, may be the empty string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
    /// Profile display name of the sender, when the backend knows it
    #[serde(skip)]
    pub sender_name: Option<String>,
    /// Client side id of a local echo
    #[serde(skip)]
    pub transaction_id: Option<String>,
    /// Delivery status, only set for events sent by this client
    #[serde(skip)]
    pub status: Option<SendStatus>,
}

impl TimelineEvent {
    /// Builds the optimistic local echo of a text message
    pub fn local_text(sender: &str, body: &str, transaction_id: String) -> Self {
        Self {
            event_id: None,
            event_type: MESSAGE_EVENT_TYPE.to_string(),
            sender: sender.to_string(),
            origin_server_ts: Utc::now().timestamp_millis(),
            content: serde_json::json!({ "msgtype": "m.text", "body": body }),
            state_key: None,
            sender_name: None,
            transaction_id: Some(transaction_id),
            status: Some(SendStatus::Sending),
        }
    }

    pub fn is_state(&self) -> bool {
        self.state_key.is_some()
    }

    pub fn is_message(&self) -> bool {
        self.event_type == MESSAGE_EVENT_TYPE
    }

    /// The `body` of the content, if it carries one
    pub fn body(&self) -> Option<&str> {
        self.content.get("body").and_then(Value::as_str)
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.origin_server_ts)
    }

    pub fn is_not_sent(&self) -> bool {
        self.status == Some(SendStatus::NotSent)
    }
}

/// Notifications a client publishes to its subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The first sync after start has completed and the room list is available
    SyncComplete,
    /// A room was discovered or its summary changed
    RoomUpdated { room_id: String },
    /// The sync loop stopped for good, no more events will be published
    SyncFailed { error: String },
    /// An event was added to a room timeline.
    /// `to_start_of_timeline` is set for events loaded by paginating backwards.
    Timeline {
        room_id: String,
        event: TimelineEvent,
        to_start_of_timeline: bool,
    },
}
