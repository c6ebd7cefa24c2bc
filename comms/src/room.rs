use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::TimelineEvent;

/// Membership of a user in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Membership {
    Invite,
    Join,
    Knock,
    Leave,
    Ban,
    /// Any membership value this client does not know about
    Other(String),
}

impl Membership {
    pub fn as_str(&self) -> &str {
        match self {
            Membership::Invite => "invite",
            Membership::Join => "join",
            Membership::Knock => "knock",
            Membership::Leave => "leave",
            Membership::Ban => "ban",
            Membership::Other(other) => other,
        }
    }
}

impl From<&str> for Membership {
    fn from(value: &str) -> Self {
        match value {
            "invite" => Membership::Invite,
            "join" => Membership::Join,
            "knock" => Membership::Knock,
            "leave" => Membership::Leave,
            "ban" => Membership::Ban,
            other => Membership::Other(other.to_string()),
        }
    }
}

impl From<String> for Membership {
    fn from(value: String) -> Self {
        Membership::from(value.as_str())
    }
}

impl From<Membership> for String {
    fn from(value: Membership) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member of a room, as known from the room state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMember {
    pub user_id: String,
    /// Display name of the member, falls back to the user id when no profile name is set
    pub name: String,
    pub membership: Option<Membership>,
}

impl RoomMember {
    pub fn new(user_id: &str, name: Option<&str>, membership: Option<Membership>) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: name.unwrap_or(user_id).to_string(),
            membership,
        }
    }
}

/// Snapshot of a room held by the client.
///
/// Snapshots are cheap to rebuild and are never updated in place; ask the client again to observe
/// new timeline events or membership changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub room_id: String,
    /// Human readable name computed by the backend
    pub name: String,
    pub members: Vec<RoomMember>,
    /// Events in chronological order, oldest first
    pub timeline: Vec<TimelineEvent>,
}

impl Room {
    pub fn new(room_id: &str, name: &str) -> Self {
        Self {
            room_id: room_id.to_string(),
            name: name.to_string(),
            members: Vec::new(),
            timeline: Vec::new(),
        }
    }

    pub fn members(&self) -> &[RoomMember] {
        &self.members
    }

    pub fn joined_members(&self) -> impl Iterator<Item = &RoomMember> {
        self.members
            .iter()
            .filter(|member| member.membership == Some(Membership::Join))
    }

    pub fn get_member(&self, user_id: &str) -> Option<&RoomMember> {
        self.members.iter().find(|member| member.user_id == user_id)
    }

    /// The earliest event in timeline order which failed to send
    pub fn first_not_sent(&self) -> Option<&TimelineEvent> {
        self.timeline.iter().find(|event| event.is_not_sent())
    }
}
