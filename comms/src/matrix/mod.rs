use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use matrix_sdk::{
    config::SyncSettings,
    matrix_auth::{MatrixSession, MatrixSessionTokens},
    room::MessagesOptions,
    ruma::{
        api::client::{error::ErrorKind, filter::FilterDefinition},
        events::room::message::RoomMessageEventContent,
        RoomId, UInt, UserId,
    },
    sync::SyncResponse,
    Client, RoomMemberships, SessionMeta,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinSet,
};

use crate::{
    client::{ChatClient, ClientConfig},
    error::ClientError,
    event::{ClientEvent, SendStatus, TimelineEvent},
    room::{Membership, Room, RoomMember},
};

use self::{
    sync::{JoinedRoomUpdate, SyncBackoff, SyncUpdate},
    timeline::RoomTimeline,
};

mod sync;
mod timeline;

const EVENT_CHANNEL_CAPACITY: usize = 100;
/// Long polling timeout of the syncs following the initial one
const SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// [MatrixClient] drives a `matrix-sdk` session for a single user authenticated with an access token.
///
/// The sync loop runs on a background task spawned by [ChatClient::start]; the task is aborted
/// when the client is dropped. Failed syncs are retried with a backoff, and
/// [ClientEvent::SyncFailed] is published when the loop gives up.
pub struct MatrixClient {
    shared: Arc<Shared>,
    sync_tasks: Mutex<JoinSet<()>>,
}

struct Shared {
    client: Client,
    user_id: String,
    timelines: Mutex<HashMap<String, RoomTimeline>>,
    event_tx: broadcast::Sender<ClientEvent>,
    initial_sync_done: AtomicBool,
    next_transaction: AtomicU64,
}

impl MatrixClient {
    /// Creates a client for the homeserver and restores the session described by `config`.
    /// No request is made until [ChatClient::start] is called.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let user_id = UserId::parse(config.user_id.as_str())
            .map_err(|err| ClientError::InvalidConfig(format!("user id: {err}")))?;

        let client = Client::builder()
            .homeserver_url(&config.base_url)
            .build()
            .await
            .map_err(|err| ClientError::InvalidConfig(format!("homeserver: {err}")))?;

        client
            .restore_session(MatrixSession {
                meta: SessionMeta {
                    user_id: user_id.clone(),
                    device_id: config.device_id.as_str().into(),
                },
                tokens: MatrixSessionTokens {
                    access_token: config.access_token.clone(),
                    refresh_token: None,
                },
            })
            .await
            .map_err(ClientError::sdk)?;

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            shared: Arc::new(Shared {
                client,
                user_id: user_id.to_string(),
                timelines: Mutex::new(HashMap::new()),
                event_tx,
                initial_sync_done: AtomicBool::new(false),
                next_transaction: AtomicU64::new(0),
            }),
            sync_tasks: Mutex::new(JoinSet::new()),
        })
    }
}

#[async_trait]
impl ChatClient for MatrixClient {
    fn user_id(&self) -> &str {
        &self.shared.user_id
    }

    fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.shared.event_tx.subscribe()
    }

    async fn start(&self, initial_timeline_limit: u32) -> Result<(), ClientError> {
        let mut filter = FilterDefinition::default();
        filter.room.timeline.limit = Some(UInt::from(initial_timeline_limit));
        let settings = SyncSettings::default().filter(filter.into());

        let shared = self.shared.clone();
        self.sync_tasks
            .lock()
            .await
            .spawn(async move { shared.sync_loop(settings).await });

        Ok(())
    }

    async fn rooms(&self) -> Vec<Room> {
        let mut joined = self.shared.client.rooms();
        joined.sort_by(|a, b| a.room_id().cmp(b.room_id()));

        let mut rooms = Vec::with_capacity(joined.len());
        for room in joined.iter() {
            rooms.push(self.shared.snapshot(room).await);
        }

        rooms
    }

    async fn room(&self, room_id: &str) -> Option<Room> {
        let room = self.shared.sdk_room(room_id).ok()?;

        Some(self.shared.snapshot(&room).await)
    }

    async fn join_room(&self, room_id: &str) -> Result<Room, ClientError> {
        let parsed = RoomId::parse(room_id).map_err(|_| ClientError::UnknownRoom(room_id.into()))?;
        let room = self
            .shared
            .client
            .join_room_by_id(&parsed)
            .await
            .map_err(ClientError::sdk)?;

        Ok(self.shared.snapshot(&room).await)
    }

    async fn enqueue_text(&self, room_id: &str, body: &str) -> Result<String, ClientError> {
        self.shared.sdk_room(room_id)?;

        let transaction_id = format!(
            "roomcli.{}.{}",
            chrono::Utc::now().timestamp_millis(),
            self.shared.next_transaction.fetch_add(1, Ordering::Relaxed)
        );
        let echo = TimelineEvent::local_text(&self.shared.user_id, body, transaction_id.clone());

        self.shared
            .timelines
            .lock()
            .await
            .entry(room_id.to_string())
            .or_default()
            .push_local(echo);

        Ok(transaction_id)
    }

    async fn send_event(&self, room_id: &str, transaction_id: &str) -> Result<(), ClientError> {
        let room = self.shared.sdk_room(room_id)?;
        let unknown_event = || ClientError::UnknownEvent {
            room_id: room_id.to_string(),
            transaction_id: transaction_id.to_string(),
        };

        let body = {
            let mut timelines = self.shared.timelines.lock().await;
            let echo = timelines
                .get_mut(room_id)
                .and_then(|timeline| timeline.set_status(transaction_id, SendStatus::Sending))
                .ok_or_else(unknown_event)?;

            echo.body().unwrap_or_default().to_string()
        };

        let result = room.send(RoomMessageEventContent::text_plain(body)).await;

        let mut timelines = self.shared.timelines.lock().await;
        let timeline = timelines.get_mut(room_id).ok_or_else(unknown_event)?;
        match result {
            Ok(response) => {
                timeline.confirm(transaction_id, response.event_id.as_str());
                Ok(())
            }
            Err(err) => {
                tracing::warn!(room_id, transaction_id, error = %err, "failed to send message");
                timeline.set_status(transaction_id, SendStatus::NotSent);
                Err(ClientError::sdk(err))
            }
        }
    }

    async fn scrollback(&self, room_id: &str, limit: u32) -> Result<(), ClientError> {
        let room = self.shared.sdk_room(room_id)?;
        let from = {
            let timelines = self.shared.timelines.lock().await;
            match timelines.get(room_id) {
                Some(timeline) if timeline.prev_batch().is_none() && !timeline.events().is_empty() => {
                    // reached the start of the room
                    return Ok(());
                }
                Some(timeline) => timeline.prev_batch().map(ToOwned::to_owned),
                None => None,
            }
        };

        let mut options = MessagesOptions::backward();
        options.from = from;
        options.limit = UInt::from(limit);

        let messages = room.messages(options).await.map_err(ClientError::sdk)?;

        // backwards pagination yields the newest event first
        let mut older = Vec::with_capacity(messages.chunk.len());
        for item in messages.chunk.iter().rev() {
            match item.event.deserialize_as::<TimelineEvent>() {
                Ok(event) => older.push(event),
                Err(err) => tracing::debug!(room_id, error = %err, "skipping undecodable event"),
            }
        }
        self.shared.resolve_sender_names(&room, &mut older).await;

        {
            let mut timelines = self.shared.timelines.lock().await;
            let timeline = timelines.entry(room_id.to_string()).or_default();
            timeline.prepend(older.clone());
            timeline.set_prev_batch(messages.end);
        }

        for event in older.into_iter().rev() {
            self.shared.publish(ClientEvent::Timeline {
                room_id: room_id.to_string(),
                event,
                to_start_of_timeline: true,
            });
        }

        Ok(())
    }
}

impl Shared {
    fn publish(&self, event: ClientEvent) {
        // no subscribers is not an error, the events are only notifications
        let _ = self.event_tx.send(event);
    }

    fn sdk_room(&self, room_id: &str) -> Result<matrix_sdk::Room, ClientError> {
        RoomId::parse(room_id)
            .ok()
            .and_then(|parsed| self.client.get_room(&parsed))
            .ok_or_else(|| ClientError::UnknownRoom(room_id.to_string()))
    }

    async fn snapshot(&self, room: &matrix_sdk::Room) -> Room {
        let room_id = room.room_id().to_string();
        let name = match room.display_name().await {
            Ok(name) => name.to_string(),
            Err(_) => room_id.clone(),
        };

        let members = match room.members_no_sync(RoomMemberships::empty()).await {
            Ok(members) => members
                .iter()
                .map(|member| {
                    RoomMember::new(
                        member.user_id().as_str(),
                        // the SDK's `name()` falls back to the localpart, the full user id is wanted
                        member.display_name(),
                        Some(Membership::from(member.membership().as_str())),
                    )
                })
                .collect(),
            Err(err) => {
                tracing::warn!(%room_id, error = %err, "could not load room members");
                Vec::new()
            }
        };

        let timeline = self
            .timelines
            .lock()
            .await
            .get(&room_id)
            .map(|timeline| timeline.events().to_vec())
            .unwrap_or_default();

        Room {
            room_id,
            name,
            members,
            timeline,
        }
    }

    async fn resolve_sender_names(&self, room: &matrix_sdk::Room, events: &mut [TimelineEvent]) {
        let mut names: HashMap<String, Option<String>> = HashMap::new();

        for event in events.iter_mut() {
            if !names.contains_key(&event.sender) {
                let name = match UserId::parse(event.sender.as_str()) {
                    Ok(user_id) => room
                        .get_member_no_sync(&user_id)
                        .await
                        .ok()
                        .flatten()
                        .and_then(|member| member.display_name().map(ToOwned::to_owned)),
                    Err(_) => None,
                };
                names.insert(event.sender.clone(), name);
            }

            event.sender_name = names.get(&event.sender).cloned().flatten();
        }
    }

    async fn sync_loop(&self, mut settings: SyncSettings) {
        let mut backoff = SyncBackoff::default();

        loop {
            match self.client.sync_once(settings.clone()).await {
                Ok(response) => {
                    backoff.reset();
                    settings = settings
                        .token(response.next_batch.clone())
                        .timeout(SYNC_TIMEOUT);
                    self.apply_sync_response(response).await;
                }
                Err(err) => {
                    let retry_in = if is_fatal(&err) {
                        None
                    } else {
                        backoff.next_delay()
                    };

                    match retry_in {
                        Some(delay) => {
                            tracing::warn!(error = %err, ?delay, "sync failed, retrying");
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            tracing::error!(error = %err, "sync loop stopped");
                            self.publish(ClientEvent::SyncFailed {
                                error: err.to_string(),
                            });
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn apply_sync_response(&self, response: SyncResponse) {
        let mut update = SyncUpdate::default();

        for (room_id, joined) in response.rooms.join {
            let mut events: Vec<TimelineEvent> = joined
                .timeline
                .events
                .iter()
                .filter_map(|item| item.event.deserialize_as::<TimelineEvent>().ok())
                .collect();
            if let Ok(room) = self.sdk_room(room_id.as_str()) {
                self.resolve_sender_names(&room, &mut events).await;
            }

            update.joined.push(JoinedRoomUpdate {
                room_id: room_id.to_string(),
                prev_batch: joined.timeline.prev_batch,
                events,
            });
        }
        update.invited = response
            .rooms
            .invite
            .keys()
            .map(ToString::to_string)
            .collect();

        let initial_sync = !self.initial_sync_done.swap(true, Ordering::SeqCst);
        let notifications = {
            let mut timelines = self.timelines.lock().await;
            sync::apply_update(&mut timelines, update, initial_sync)
        };

        if initial_sync {
            tracing::info!("initial sync complete");
        }
        for notification in notifications {
            if let ClientEvent::RoomUpdated { room_id } = &notification {
                tracing::debug!(%room_id, "room discovered");
            }
            self.publish(notification);
        }
    }
}

/// Errors retrying can not fix, such as a revoked access token
fn is_fatal(err: &matrix_sdk::Error) -> bool {
    matches!(
        err.client_api_error_kind(),
        Some(ErrorKind::UnknownToken { .. } | ErrorKind::Forbidden { .. })
    )
}
