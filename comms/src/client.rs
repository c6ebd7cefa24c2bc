use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{
    error::ClientError,
    event::{ClientEvent, TimelineEvent},
    room::Room,
};

/// Everything needed to create a logged-in client session
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the homeserver, e.g. `http://localhost:8008`
    pub base_url: String,
    pub user_id: String,
    pub access_token: String,
    /// Device the access token was issued for
    pub device_id: String,
}

/// [ChatClient] is the chat backend the command loop drives.
///
/// The backend owns synchronisation, event ordering, room state and retries. Callers only read
/// snapshots from it, issue requests, and react to the [ClientEvent]s published on [ChatClient::subscribe].
///
/// # Cancel Safety
///
/// None of the request methods are cancel-safe: dropping the future of a request may leave the
/// request in flight on the server. Callers are expected to spawn requests and wait for them.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// User id of the logged-in user
    fn user_id(&self) -> &str;

    /// Returns a receiver for the notifications published from now on
    fn subscribe(&self) -> broadcast::Receiver<ClientEvent>;

    /// Starts the background synchronisation, requesting up to `initial_timeline_limit` events
    /// per room on the first sync. [ClientEvent::SyncComplete] is published once it is done, or
    /// [ClientEvent::SyncFailed] if synchronisation has to be abandoned.
    async fn start(&self, initial_timeline_limit: u32) -> Result<(), ClientError>;

    /// Snapshot of every room the client knows about, in a stable order
    async fn rooms(&self) -> Vec<Room>;

    async fn room(&self, room_id: &str) -> Option<Room>;

    /// Joins the room and returns its snapshot after the join
    async fn join_room(&self, room_id: &str) -> Result<Room, ClientError>;

    /// Appends the local echo of a text message to the room timeline with
    /// [crate::SendStatus::Sending] and returns its transaction id. Nothing is sent yet.
    async fn enqueue_text(&self, room_id: &str, body: &str) -> Result<String, ClientError>;

    /// Sends the local echo identified by `transaction_id`, updating its status once settled
    async fn send_event(&self, room_id: &str, transaction_id: &str) -> Result<(), ClientError>;

    /// Sends a local echo which failed to send before
    async fn resend_event(&self, room_id: &str, event: &TimelineEvent) -> Result<(), ClientError> {
        let transaction_id =
            event
                .transaction_id
                .as_deref()
                .ok_or_else(|| ClientError::UnknownEvent {
                    room_id: room_id.to_string(),
                    transaction_id: event.event_id.clone().unwrap_or_default(),
                })?;

        self.send_event(room_id, transaction_id).await
    }

    /// Loads up to `limit` events preceding the oldest event of the room timeline.
    /// The loaded events are published with `to_start_of_timeline` set.
    async fn scrollback(&self, room_id: &str, limit: u32) -> Result<(), ClientError>;
}
