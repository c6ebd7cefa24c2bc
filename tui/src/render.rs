//! Plain text renderings of rooms, members and timeline events.

use comms::{Room, SendStatus, TimelineEvent};

const MAX_NAME_WIDTH: usize = 15;
const MEMBERSHIP_WIDTH: usize = 9;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn room_list(rooms: &[Room]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rooms.len() + 1);
    lines.push("Room List:".to_string());
    lines.extend(rooms.iter().enumerate().map(|(index, room)| {
        format!(
            "[{}] {} ({} members)",
            index,
            room.name,
            room.joined_members().count()
        )
    }));

    lines
}

pub fn help() -> Vec<String> {
    [
        "Global commands:",
        "  '/help' : Show this help.",
        "Room list index commands:",
        "  '/join <index>' Join a room, e.g. '/join 5'",
        "Room commands:",
        "  '/exit' Return to the room list index.",
        "  '/members' Show the room member list.",
        "  '/more 15' Scrollback 15 events",
        "  '/resend' Resend the oldest event which failed to send.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Every event of the room timeline, oldest first
pub fn messages(room: &Room, my_user_id: &str) -> Vec<String> {
    room.timeline
        .iter()
        .map(|event| line(event, my_user_id))
        .collect()
}

/// Members with a membership, sorted by name in descending order
pub fn member_list(room: &Room, my_user_id: &str) -> Vec<String> {
    let mut members: Vec<_> = room
        .members()
        .iter()
        .filter_map(|member| member.membership.as_ref().map(|membership| (membership, member)))
        .collect();
    members.sort_by(|(_, a), (_, b)| b.name.cmp(&a.name));

    let mut lines = Vec::with_capacity(members.len() + 2);
    lines.push(format!("Membership list for room \"{}\"", room.name));
    lines.push("-".repeat(room.name.chars().count() + 27));
    lines.extend(members.into_iter().map(|(membership, member)| {
        let who = if member.user_id == my_user_id {
            "Me"
        } else {
            member.user_id.as_str()
        };

        format!(
            "{:<width$} :: {} ({})",
            membership.as_str(),
            member.name,
            who,
            width = MEMBERSHIP_WIDTH
        )
    }));

    lines
}

/// `[<time>] <name> <separator> <body>` for a single event
pub fn line(event: &TimelineEvent, my_user_id: &str) -> String {
    let own_event = event.sender == my_user_id;

    let name = if own_event {
        "Me"
    } else {
        event.sender_name.as_deref().unwrap_or(&event.sender)
    };

    let mut separator = match (own_event, event.status) {
        (true, Some(SendStatus::Sending)) => "...",
        (true, Some(SendStatus::NotSent)) => " x ",
        (true, _) => ">>>",
        (false, _) => "<<<",
    };

    let body = if event.is_message() {
        event.body().unwrap_or_default().to_string()
    } else if let Some(state_key) = event.state_key.as_deref() {
        separator = "---";
        let state_name = if state_key.is_empty() {
            event.event_type.clone()
        } else {
            format!("{} ({})", event.event_type, state_key)
        };
        format!("[State: {} updated to: {}]", state_name, event.content)
    } else {
        separator = "---";
        format!(
            "[Message: {} Content: {}]",
            event.event_type, event.content
        )
    };

    format!(
        "[{}] {} {} {}",
        timestamp(event),
        truncate_name(name),
        separator,
        body
    )
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > MAX_NAME_WIDTH {
        let mut truncated: String = name.chars().take(MAX_NAME_WIDTH - 1).collect();
        truncated.push('\u{2026}');
        truncated
    } else {
        name.to_string()
    }
}

fn timestamp(event: &TimelineEvent) -> String {
    event
        .timestamp()
        .map(|time| time.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| event.origin_server_ts.to_string())
}

#[cfg(test)]
mod tests {
    use comms::{Membership, RoomMember};
    use serde_json::json;

    use super::*;

    const ME: &str = "@me:localhost";

    fn event(value: serde_json::Value) -> TimelineEvent {
        serde_json::from_value(value).unwrap()
    }

    fn text_from(sender: &str, body: &str) -> TimelineEvent {
        event(json!({
            "type": "m.room.message",
            "sender": sender,
            "origin_server_ts": 1432735824653i64,
            "content": { "msgtype": "m.text", "body": body },
        }))
    }

    #[test]
    fn test_text_from_other_sender() {
        let mut message = text_from("@alice:localhost", "hello <world>");
        message.sender_name = Some("Alice".into());

        assert_eq!(
            line(&message, ME),
            "[2015-05-27 14:10:24] Alice <<< hello <world>"
        );
    }

    #[test]
    fn test_sender_without_profile_name_uses_user_id() {
        let message = text_from("@bob:localhost", "hi");

        assert_eq!(
            line(&message, ME),
            "[2015-05-27 14:10:24] @bob:localhost <<< hi"
        );
    }

    #[test]
    fn test_long_names_are_truncated() {
        let mut message = text_from("@alice:localhost", "hi");
        message.sender_name = Some("Alexandra Wilhelmina".into());

        assert_eq!(
            line(&message, ME),
            "[2015-05-27 14:10:24] Alexandra Wilh\u{2026} <<< hi"
        );
        assert_eq!(truncate_name("exactly15chars!"), "exactly15chars!");
    }

    #[test]
    fn test_own_message_separators() {
        let mut message = text_from(ME, "hi");
        assert!(line(&message, ME).contains(" Me >>> hi"));

        message.status = Some(SendStatus::Sending);
        assert!(line(&message, ME).contains(" Me ... hi"));

        message.status = Some(SendStatus::NotSent);
        assert!(line(&message, ME).contains(" Me  x  hi"));

        message.status = Some(SendStatus::Sent);
        assert!(line(&message, ME).contains(" Me >>> hi"));
    }

    #[test]
    fn test_state_event_with_empty_state_key() {
        let rename = event(json!({
            "type": "m.room.name",
            "sender": "@al:localhost",
            "state_key": "",
            "origin_server_ts": 0,
            "content": { "name": "Lobby" },
        }));

        assert_eq!(
            line(&rename, ME),
            r#"[1970-01-01 00:00:00] @al:localhost --- [State: m.room.name updated to: {"name":"Lobby"}]"#
        );
    }

    #[test]
    fn test_state_event_with_state_key() {
        let membership = event(json!({
            "type": "m.room.member",
            "sender": ME,
            "state_key": ME,
            "origin_server_ts": 0,
            "content": { "membership": "join", "displayname": "me" },
        }));

        assert!(line(&membership, ME).ends_with(
            r#"Me --- [State: m.room.member (@me:localhost) updated to: {"membership":"join","displayname":"me"}]"#
        ));
    }

    #[test]
    fn test_other_message_event() {
        let reaction = event(json!({
            "type": "m.reaction",
            "sender": "@alice:localhost",
            "origin_server_ts": 0,
            "content": { "m.relates_to": { "key": "+1" } },
        }));

        assert!(line(&reaction, ME).ends_with(
            r#"--- [Message: m.reaction Content: {"m.relates_to":{"key":"+1"}}]"#
        ));
    }

    #[test]
    fn test_room_list_counts_joined_members() {
        let mut lobby = Room::new("!a:localhost", "Lobby");
        lobby.members = vec![
            RoomMember::new("@a:localhost", None, Some(Membership::Join)),
            RoomMember::new("@b:localhost", None, Some(Membership::Invite)),
            RoomMember::new("@c:localhost", None, Some(Membership::Join)),
        ];
        let empty = Room::new("!b:localhost", "Empty");

        assert_eq!(
            room_list(&[lobby, empty]),
            vec!["Room List:", "[0] Lobby (2 members)", "[1] Empty (0 members)"]
        );
    }

    #[test]
    fn test_member_list_sorted_descending() {
        let mut room = Room::new("!a:localhost", "Lobby");
        room.members = vec![
            RoomMember::new("@b:localhost", Some("bob"), Some(Membership::Join)),
            RoomMember::new(ME, Some("me"), Some(Membership::Join)),
            RoomMember::new("@ghost:localhost", Some("zed"), None),
            RoomMember::new("@a:localhost", Some("alice"), Some(Membership::Invite)),
            RoomMember::new("@c:localhost", Some("carol"), Some(Membership::Leave)),
        ];

        assert_eq!(
            member_list(&room, ME),
            vec![
                "Membership list for room \"Lobby\"",
                "--------------------------------",
                "join      :: me (Me)",
                "leave     :: carol (@c:localhost)",
                "join      :: bob (@b:localhost)",
                "invite    :: alice (@a:localhost)",
            ]
        );
    }

    #[test]
    fn test_members_without_profile_name_listed_by_user_id() {
        let mut room = Room::new("!a:localhost", "Lobby");
        room.members = vec![
            RoomMember::new("@alf:localhost", None, Some(Membership::Join)),
            RoomMember::new("@zoe:localhost", Some("Adam"), Some(Membership::Join)),
            RoomMember::new("@bob:localhost", None, Some(Membership::Join)),
        ];

        assert_eq!(
            member_list(&room, ME)[2..],
            [
                "join      :: Adam (@zoe:localhost)",
                "join      :: @bob:localhost (@bob:localhost)",
                "join      :: @alf:localhost (@alf:localhost)",
            ]
        );
    }

    #[test]
    fn test_member_list_ordering_independent_of_join_order() {
        let names = ["delta", "alpha", "charlie", "bravo"];
        let mut forward = Room::new("!a:localhost", "R");
        let mut backward = Room::new("!a:localhost", "R");
        for name in names {
            let member = RoomMember::new(&format!("@{name}:x"), Some(name), Some(Membership::Join));
            forward.members.push(member.clone());
            backward.members.insert(0, member);
        }

        let listed = member_list(&forward, ME);
        assert_eq!(listed, member_list(&backward, ME));
        assert!(listed[2].contains("delta"));
        assert!(listed[5].contains("alpha"));
    }

    #[test]
    fn test_messages_in_timeline_order() {
        let mut room = Room::new("!a:localhost", "Lobby");
        room.timeline = vec![text_from("@a:x", "first"), text_from("@a:x", "second")];

        let lines = messages(&room, ME);
        assert!(lines[0].ends_with("first"));
        assert!(lines[1].ends_with("second"));
    }
}
