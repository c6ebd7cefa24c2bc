use comms::Room;

/// State holds the session state of the command loop
#[derive(Debug, Clone, Default)]
pub struct State {
    /// Rooms as of the last room list fetch; the index into it is what `/join` takes
    pub room_list: Vec<Room>,
    /// Id of the room being viewed, if any
    pub viewing_room: Option<String>,
}

impl State {
    pub fn is_viewing_room(&self) -> bool {
        self.viewing_room.is_some()
    }

    pub fn is_viewing(&self, room_id: &str) -> bool {
        self.viewing_room.as_deref() == Some(room_id)
    }

    /// Looks up the room list entry for a `/join` index token
    pub fn room_at(&self, index: &str) -> Option<&Room> {
        index
            .parse::<usize>()
            .ok()
            .and_then(|index| self.room_list.get(index))
    }
}
