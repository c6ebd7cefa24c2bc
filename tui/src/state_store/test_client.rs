use std::sync::Mutex;

use async_trait::async_trait;
use comms::{ChatClient, ClientError, ClientEvent, Membership, Room, SendStatus, TimelineEvent};
use tokio::sync::broadcast;

pub const ME: &str = "@me:localhost";

/// Requests the state store made, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start(u32),
    Join(String),
    Enqueue(String, String),
    Send(String, String),
    Scrollback(String, u32),
}

/// In-memory [ChatClient] keeping its rooms in a vector and recording every request
pub struct TestClient {
    rooms: Mutex<Vec<Room>>,
    calls: Mutex<Vec<Call>>,
    fail_requests: bool,
    event_tx: broadcast::Sender<ClientEvent>,
}

impl TestClient {
    pub fn new(rooms: Vec<Room>) -> Self {
        let (event_tx, _) = broadcast::channel(16);

        Self {
            rooms: Mutex::new(rooms),
            calls: Mutex::new(Vec::new()),
            fail_requests: false,
            event_tx,
        }
    }

    /// Every network request fails, local echoes end up not sent
    pub fn failing(rooms: Vec<Room>) -> Self {
        Self {
            fail_requests: true,
            ..Self::new(rooms)
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_timeline(&self, room_id: &str, timeline: Vec<TimelineEvent>) {
        self.find_mut(room_id, |room| room.timeline = timeline);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn find_mut<T>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> T) -> Option<T> {
        let mut rooms = self.rooms.lock().unwrap();
        rooms.iter_mut().find(|room| room.room_id == room_id).map(f)
    }

    fn failure(&self) -> Result<(), ClientError> {
        if self.fail_requests {
            Err(ClientError::Sdk("M_FORBIDDEN: request refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChatClient for TestClient {
    fn user_id(&self) -> &str {
        ME
    }

    fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.event_tx.subscribe()
    }

    async fn start(&self, initial_timeline_limit: u32) -> Result<(), ClientError> {
        self.record(Call::Start(initial_timeline_limit));
        Ok(())
    }

    async fn rooms(&self) -> Vec<Room> {
        self.rooms.lock().unwrap().clone()
    }

    async fn room(&self, room_id: &str) -> Option<Room> {
        self.find_mut(room_id, |room| room.clone())
    }

    async fn join_room(&self, room_id: &str) -> Result<Room, ClientError> {
        self.record(Call::Join(room_id.to_string()));
        self.failure()?;

        self.find_mut(room_id, |room| {
            for member in room.members.iter_mut().filter(|member| member.user_id == ME) {
                member.membership = Some(Membership::Join);
            }
            room.clone()
        })
        .ok_or_else(|| ClientError::UnknownRoom(room_id.to_string()))
    }

    async fn enqueue_text(&self, room_id: &str, body: &str) -> Result<String, ClientError> {
        self.record(Call::Enqueue(room_id.to_string(), body.to_string()));

        self.find_mut(room_id, |room| {
            let transaction_id = format!("txn-{}", room.timeline.len());
            room.timeline
                .push(TimelineEvent::local_text(ME, body, transaction_id.clone()));
            transaction_id
        })
        .ok_or_else(|| ClientError::UnknownRoom(room_id.to_string()))
    }

    async fn send_event(&self, room_id: &str, transaction_id: &str) -> Result<(), ClientError> {
        self.record(Call::Send(room_id.to_string(), transaction_id.to_string()));
        let result = self.failure();
        let status = if result.is_ok() {
            SendStatus::Sent
        } else {
            SendStatus::NotSent
        };

        self.find_mut(room_id, |room| {
            for event in room
                .timeline
                .iter_mut()
                .filter(|event| event.transaction_id.as_deref() == Some(transaction_id))
            {
                event.status = Some(status);
            }
        });

        result
    }

    async fn scrollback(&self, room_id: &str, limit: u32) -> Result<(), ClientError> {
        self.record(Call::Scrollback(room_id.to_string(), limit));
        self.failure()
    }
}
