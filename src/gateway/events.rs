use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Extra client fields (conversation ids, timestamps, avatar urls) that the
/// relay forwards untouched.
pub type Passthrough = Map<String, Value>;

/// A sender-to-receiver event body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addressed {
    pub sender: String,
    pub receiver: String,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// A direct chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub sender: String,
    pub receiver: String,
    pub message: String,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// A message posted to a group or room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    #[serde(rename = "groupId")]
    pub channel_id: String,
    pub sender: String,
    pub message: String,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// Announcement that someone entered a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomJoin {
    #[serde(rename = "roomid")]
    pub room_id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// Frames a client may send. Wire names follow the established chat client
/// protocol: `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum InboundEvent {
    #[serde(rename = "userjoined")]
    Identify(String),
    #[serde(rename = "useronlineornot")]
    PresenceQuery(Addressed),
    #[serde(rename = "sendprivatemsg")]
    DirectMessage(PrivateMessage),
    #[serde(rename = "sender-typing")]
    TypingNotice(Addressed),
    #[serde(rename = "sendfriendrequest")]
    FriendRequest(Addressed),
    #[serde(rename = "joinGroup")]
    JoinGroup(String),
    #[serde(rename = "joinroom")]
    JoinRoom(RoomJoin),
    #[serde(rename = "sendMessage")]
    ChannelMessage(ChannelMessage),
    #[serde(rename = "heartbeat")]
    Heartbeat,
}

/// Frames the server emits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum OutboundEvent {
    #[serde(rename = "hello")]
    Hello { heartbeat_interval: u64 },
    #[serde(rename = "heartbeat_ack")]
    HeartbeatAck,
    /// Presence result: the queried receiver is online.
    #[serde(rename = "yesonline")]
    Online(Addressed),
    /// Presence result: the queried receiver is offline.
    #[serde(rename = "notonline")]
    NotOnline(Addressed),
    #[serde(rename = "receivermsg")]
    ReceivedMessage(PrivateMessage),
    #[serde(rename = "receiver-typing")]
    TypingRelayed(Addressed),
    #[serde(rename = "friendreqfromsender")]
    FriendRequestRelayed(Addressed),
    #[serde(rename = "receiveMessage")]
    ChannelMessageRelayed(ChannelMessage),
    #[serde(rename = "informothersaboutuser")]
    MemberJoinedRoom(RoomJoin),
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::Hello { .. } => "hello",
            OutboundEvent::HeartbeatAck => "heartbeat_ack",
            OutboundEvent::Online(_) => "yesonline",
            OutboundEvent::NotOnline(_) => "notonline",
            OutboundEvent::ReceivedMessage(_) => "receivermsg",
            OutboundEvent::TypingRelayed(_) => "receiver-typing",
            OutboundEvent::FriendRequestRelayed(_) => "friendreqfromsender",
            OutboundEvent::ChannelMessageRelayed(_) => "receiveMessage",
            OutboundEvent::MemberJoinedRoom(_) => "informothersaboutuser",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identify_takes_bare_name() {
        let ev: InboundEvent =
            serde_json::from_value(json!({ "event": "userjoined", "data": "alice" })).unwrap();
        assert_eq!(ev, InboundEvent::Identify("alice".to_string()));
    }

    #[test]
    fn test_private_message_keeps_extra_fields() {
        let ev: InboundEvent = serde_json::from_value(json!({
            "event": "sendprivatemsg",
            "data": {
                "sender": "alice",
                "receiver": "bob",
                "message": "hi",
                "convid": "alice-bob",
                "time": 1700000000000u64
            }
        }))
        .unwrap();
        let InboundEvent::DirectMessage(msg) = ev else {
            panic!("expected direct message, got {ev:?}");
        };
        assert_eq!(msg.message, "hi");
        assert_eq!(msg.extra["convid"], "alice-bob");

        let out = serde_json::to_value(OutboundEvent::ReceivedMessage(msg)).unwrap();
        assert_eq!(out["event"], "receivermsg");
        assert_eq!(out["data"]["sender"], "alice");
        assert_eq!(out["data"]["time"], 1700000000000u64);
    }

    #[test]
    fn test_channel_events_use_client_field_names() {
        let ev: InboundEvent = serde_json::from_value(json!({
            "event": "joinroom",
            "data": { "roomid": "r1", "name": "alice" }
        }))
        .unwrap();
        assert!(matches!(ev, InboundEvent::JoinRoom(ref j) if j.room_id == "r1"));

        let ev: InboundEvent = serde_json::from_value(json!({
            "event": "sendMessage",
            "data": { "groupId": "g1", "sender": "bob", "message": "yo" }
        }))
        .unwrap();
        assert!(matches!(ev, InboundEvent::ChannelMessage(ref m) if m.channel_id == "g1"));
    }

    #[test]
    fn test_heartbeat_needs_no_data() {
        let ev: InboundEvent = serde_json::from_str(r#"{"event":"heartbeat"}"#).unwrap();
        assert_eq!(ev, InboundEvent::Heartbeat);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let res = serde_json::from_str::<InboundEvent>(r#"{"event":"disconnect","data":{}}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_outbound_names_match_wire_tags() {
        let events = [
            OutboundEvent::Hello { heartbeat_interval: 1 },
            OutboundEvent::HeartbeatAck,
            OutboundEvent::Online(Addressed {
                sender: "a".into(),
                receiver: "b".into(),
                extra: Passthrough::new(),
            }),
        ];
        for ev in events {
            let value = serde_json::to_value(&ev).unwrap();
            assert_eq!(value["event"], ev.name());
        }
    }
}
