//! Entity types shared between events and command responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The conversation a message belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageScene {
    /// One-to-one chat with a friend.
    #[default]
    Friend,
    /// Group chat.
    Group,
    /// Temporary session started from a group.
    Temp,
}

/// One message segment in its wire form.
///
/// The payload is kept as JSON; composing rich content is left to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment kind, e.g. `text`, `mention`, `image`.
    #[serde(rename = "type")]
    pub segment_type: String,
    /// Kind-specific payload.
    #[serde(default)]
    pub data: Value,
}

impl Segment {
    /// Creates a plain text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            segment_type: "text".to_string(),
            data: serde_json::json!({ "text": text.into() }),
        }
    }

    /// Returns the text of a `text` segment.
    pub fn as_text(&self) -> Option<&str> {
        if self.segment_type != "text" {
            return None;
        }
        self.data.get("text").and_then(Value::as_str)
    }
}

/// Concatenates the text of every `text` segment.
pub fn plain_text(segments: &[Segment]) -> String {
    segments.iter().filter_map(Segment::as_text).collect()
}

/// A received or fetched message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomingMessage {
    /// Conversation kind.
    pub message_scene: MessageScene,
    /// Friend or group identifier depending on the scene.
    pub peer_id: i64,
    /// Sequence number within the conversation.
    pub message_seq: i64,
    /// Sender account.
    pub sender_id: i64,
    /// Unix timestamp in seconds.
    pub time: i64,
    /// Message content.
    pub segments: Vec<Segment>,
    /// Friend details, present for friend messages.
    pub friend: Option<FriendEntity>,
    /// Group details, present for group messages.
    pub group: Option<GroupEntity>,
    /// Sender's membership, present for group messages.
    pub group_member: Option<GroupMemberEntity>,
}

impl IncomingMessage {
    /// Returns the concatenated text content.
    pub fn plain_text(&self) -> String {
        plain_text(&self.segments)
    }
}

/// A friend of the bot account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendEntity {
    pub user_id: i64,
    pub nickname: String,
    pub sex: String,
    pub qid: String,
    pub remark: String,
    pub category: Option<FriendCategory>,
}

/// A friend list category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendCategory {
    pub category_id: i64,
    pub category_name: String,
}

/// A group the bot account belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupEntity {
    pub group_id: i64,
    pub group_name: String,
    pub member_count: i32,
    pub max_member_count: i32,
}

/// A member of a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMemberEntity {
    pub group_id: i64,
    pub user_id: i64,
    pub nickname: String,
    pub sex: String,
    pub card: String,
    pub title: String,
    pub level: i32,
    pub role: String,
    pub join_time: i64,
    pub last_sent_time: i64,
    pub shut_up_end_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_skips_non_text() {
        let segments = vec![
            Segment::text("hello "),
            Segment {
                segment_type: "mention".into(),
                data: serde_json::json!({ "user_id": 42 }),
            },
            Segment::text("world"),
        ];
        assert_eq!(plain_text(&segments), "hello world");
    }

    #[test]
    fn test_incoming_message_lenient_decode() {
        let msg: IncomingMessage = serde_json::from_str(
            r#"{"message_scene":"group","peer_id":10,"sender_id":3,
                "segments":[{"type":"text","data":{"text":"hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(msg.message_scene, MessageScene::Group);
        assert_eq!(msg.peer_id, 10);
        assert_eq!(msg.plain_text(), "hi");
        assert!(msg.friend.is_none());
    }
}
