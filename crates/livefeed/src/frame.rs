//! Wire frames exchanged with the feed endpoint.
//!
//! All frames are JSON text messages. Client frames are tagged by `op`,
//! server frames by the `topic` they were published on. Deliveries carry an
//! explicit [`DeliveryKind`] discriminator so the client never has to infer
//! replay-vs-delta from batch size.

use serde::{Deserialize, Deserializer, Serialize};

use crate::record::Notification;

/// Topics a session subscribes to after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    /// Per-user notification queue
    Notifications,
    /// Per-user unread badge counter
    UnreadCount,
    /// Per-user command acknowledgements
    Responses,
    /// Global announcements
    Broadcast,
}

impl Topic {
    /// Every topic a session subscribes to, in registration order.
    pub const ALL: [Topic; 4] = [
        Topic::Notifications,
        Topic::UnreadCount,
        Topic::Responses,
        Topic::Broadcast,
    ];
}

/// How a delivery batch applies to local state: a replay replaces the whole
/// list, a delta merges into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryKind {
    Replay,
    Delta,
}

/// Frames sent client → server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ClientFrame {
    Subscribe {
        topic: Topic,
    },
    Unsubscribe {
        topic: Topic,
    },
    /// Empty-bodied request for a full history replay on the
    /// notifications topic.
    Replay,
    MarkRead {
        #[serde(rename = "notificationId")]
        notification_id: String,
    },
    MarkAllRead,
}

/// Frames received server → client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "topic", rename_all = "kebab-case")]
pub enum ServerFrame {
    /// Per-user queue: replay batches and incremental deltas. `items` may be
    /// a single record or an array; decoding normalizes to a vector.
    Notifications {
        kind: DeliveryKind,
        #[serde(deserialize_with = "one_or_many")]
        items: Vec<Notification>,
    },
    /// Global announcements, always single records.
    Broadcast { item: Notification },
    /// Unread badge counter. Frames without a defined count are dropped.
    UnreadCount { count: Option<u64> },
    /// Command acknowledgements. Logged, not consumed.
    Responses {
        #[serde(default)]
        body: serde_json::Value,
    },
}

/// Accept both a bare record and an array of records.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Notification>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Batch {
        Many(Vec<Notification>),
        One(Box<Notification>),
    }

    Ok(match Batch::deserialize(deserializer)? {
        Batch::Many(items) => items,
        Batch::One(item) => vec![*item],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_json(id: &str, ts: &str) -> String {
        format!(
            r#"{{"id": "{id}", "title": "t-{id}", "message": "m", "type": "INFO", "createdAt": "{ts}"}}"#
        )
    }

    #[test]
    fn test_client_frame_wire_shape() {
        let frame = ClientFrame::MarkRead {
            notification_id: "n-9".to_string(),
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"op":"mark_read","notificationId":"n-9"}"#);

        let frame = ClientFrame::Subscribe {
            topic: Topic::UnreadCount,
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"op":"subscribe","topic":"unread-count"}"#);

        let frame = ClientFrame::Replay;
        assert_eq!(serde_json::to_string(&frame).unwrap(), r#"{"op":"replay"}"#);
    }

    #[test]
    fn test_decode_delta_with_array() {
        let json = format!(
            r#"{{"topic": "notifications", "kind": "delta", "items": [{}, {}]}}"#,
            record_json("1", "2026-03-01T12:00:00Z"),
            record_json("2", "2026-03-01T12:05:00Z"),
        );

        match serde_json::from_str::<ServerFrame>(&json).unwrap() {
            ServerFrame::Notifications { kind, items } => {
                assert_eq!(kind, DeliveryKind::Delta);
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_decode_single_record_normalizes_to_vec() {
        let json = format!(
            r#"{{"topic": "notifications", "kind": "delta", "items": {}}}"#,
            record_json("1", "2026-03-01T12:00:00Z"),
        );

        match serde_json::from_str::<ServerFrame>(&json).unwrap() {
            ServerFrame::Notifications { items, .. } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].id, "1");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_decode_replay_kind() {
        let json = format!(
            r#"{{"topic": "notifications", "kind": "replay", "items": [{}]}}"#,
            record_json("1", "2026-03-01T12:00:00Z"),
        );

        match serde_json::from_str::<ServerFrame>(&json).unwrap() {
            ServerFrame::Notifications { kind, .. } => assert_eq!(kind, DeliveryKind::Replay),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_decode_unread_count_with_and_without_count() {
        let json = r#"{"topic": "unread-count", "count": 4}"#;
        match serde_json::from_str::<ServerFrame>(json).unwrap() {
            ServerFrame::UnreadCount { count } => assert_eq!(count, Some(4)),
            other => panic!("unexpected frame: {other:?}"),
        }

        let json = r#"{"topic": "unread-count"}"#;
        match serde_json::from_str::<ServerFrame>(json).unwrap() {
            ServerFrame::UnreadCount { count } => assert_eq!(count, None),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_decode_broadcast_record() {
        let json = format!(
            r#"{{"topic": "broadcast", "item": {}}}"#,
            record_json("b-1", "2026-03-01T12:00:00Z"),
        );

        match serde_json::from_str::<ServerFrame>(&json).unwrap() {
            ServerFrame::Broadcast { item } => assert_eq!(item.id, "b-1"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
