use std::{collections::HashMap, time::Duration};

use crate::event::{ClientEvent, TimelineEvent};

use super::timeline::RoomTimeline;

/// Consecutive failed syncs after which the sync loop gives up
const MAX_SYNC_ATTEMPTS: u32 = 5;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Timeline part of a joined room in one sync response, already decoded
#[derive(Debug, Default)]
pub(super) struct JoinedRoomUpdate {
    pub room_id: String,
    /// Token to paginate backwards from the first event of `events`
    pub prev_batch: Option<String>,
    pub events: Vec<TimelineEvent>,
}

/// The rooms of one sync response
#[derive(Debug, Default)]
pub(super) struct SyncUpdate {
    pub joined: Vec<JoinedRoomUpdate>,
    pub invited: Vec<String>,
}

/// Folds a sync response into the buffered timelines and returns the notifications it causes, in
/// publishing order.
///
/// The initial sync is announced by a single [ClientEvent::SyncComplete]; later syncs announce
/// the rooms they discovered with [ClientEvent::RoomUpdated].
pub(super) fn apply_update(
    timelines: &mut HashMap<String, RoomTimeline>,
    update: SyncUpdate,
    initial_sync: bool,
) -> Vec<ClientEvent> {
    let mut discovered = Vec::new();
    let mut notifications = Vec::new();

    for joined in update.joined {
        let timeline = timelines.entry(joined.room_id.clone()).or_insert_with(|| {
            discovered.push(joined.room_id.clone());
            RoomTimeline::default()
        });
        // a gappy sync must not move the token of a timeline that already holds events
        if timeline.events().is_empty() {
            timeline.set_prev_batch(joined.prev_batch);
        }

        for event in joined.events {
            if timeline.push_remote(event.clone()) {
                notifications.push(ClientEvent::Timeline {
                    room_id: joined.room_id.clone(),
                    event,
                    to_start_of_timeline: false,
                });
            }
        }
    }

    for room_id in update.invited {
        if !timelines.contains_key(&room_id) {
            timelines.insert(room_id.clone(), RoomTimeline::default());
            discovered.push(room_id);
        }
    }

    if initial_sync {
        notifications.push(ClientEvent::SyncComplete);
    } else {
        notifications.extend(
            discovered
                .into_iter()
                .map(|room_id| ClientEvent::RoomUpdated { room_id }),
        );
    }

    notifications
}

/// Exponential delays between retries of a failing sync
#[derive(Debug, Default)]
pub(super) struct SyncBackoff {
    failures: u32,
}

impl SyncBackoff {
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Records a failure and returns how long to wait before the next attempt, or `None` once
    /// the attempts are used up
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.failures += 1;
        if self.failures >= MAX_SYNC_ATTEMPTS {
            return None;
        }

        let delay = INITIAL_RETRY_DELAY.saturating_mul(2u32.saturating_pow(self.failures - 1));
        Some(delay.min(MAX_RETRY_DELAY))
    }
}
