use crate::event::{SendStatus, TimelineEvent};

/// Events of a single room the sync loop and the requests of this client have seen so far.
///
/// The SDK hands out timeline events only once, as part of a sync response or a `/messages`
/// page, so the adapter keeps them here together with the local echoes of outgoing messages.
#[derive(Debug, Default)]
pub(super) struct RoomTimeline {
    events: Vec<TimelineEvent>,
    /// Pagination token pointing before the oldest event in `events`
    prev_batch: Option<String>,
}

impl RoomTimeline {
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn prev_batch(&self) -> Option<&str> {
        self.prev_batch.as_deref()
    }

    pub fn set_prev_batch(&mut self, prev_batch: Option<String>) {
        self.prev_batch = prev_batch;
    }

    /// Appends an event received from the server.
    ///
    /// When the event is the remote echo of an acknowledged local echo, it takes the place of the
    /// local echo instead. Returns whether a new entry was added.
    pub fn push_remote(&mut self, event: TimelineEvent) -> bool {
        let existing = event.event_id.as_deref().and_then(|event_id| {
            self.events
                .iter_mut()
                .find(|known| known.event_id.as_deref() == Some(event_id))
        });

        match existing {
            Some(known) => {
                let transaction_id = known.transaction_id.take();
                *known = TimelineEvent {
                    transaction_id,
                    ..event
                };
                false
            }
            None => {
                self.events.push(event);
                true
            }
        }
    }

    /// Inserts older events, given in chronological order, before the oldest known event
    pub fn prepend(&mut self, older: Vec<TimelineEvent>) {
        self.events.splice(0..0, older);
    }

    pub fn push_local(&mut self, event: TimelineEvent) {
        self.events.push(event);
    }

    #[cfg(test)]
    pub fn local_echo(&self, transaction_id: &str) -> Option<&TimelineEvent> {
        self.events
            .iter()
            .find(|event| event.transaction_id.as_deref() == Some(transaction_id))
    }

    pub fn set_status(&mut self, transaction_id: &str, status: SendStatus) -> Option<&TimelineEvent> {
        let event = self
            .events
            .iter_mut()
            .find(|event| event.transaction_id.as_deref() == Some(transaction_id))?;
        event.status = Some(status);

        Some(&*event)
    }

    /// Marks a local echo as acknowledged under `event_id`.
    /// Drops the local echo if the sync loop already delivered its remote echo.
    pub fn confirm(&mut self, transaction_id: &str, event_id: &str) {
        let remote_echo_seen = self
            .events
            .iter()
            .any(|event| event.event_id.as_deref() == Some(event_id));

        if remote_echo_seen {
            self.events
                .retain(|event| event.transaction_id.as_deref() != Some(transaction_id));
        } else if let Some(event) = self
            .events
            .iter_mut()
            .find(|event| event.transaction_id.as_deref() == Some(transaction_id))
        {
            event.event_id = Some(event_id.to_string());
            event.status = Some(SendStatus::Sent);
        }
    }
}
