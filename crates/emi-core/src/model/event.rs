//! Gateway event shapes and the default registry table.
//!
//! Every shape decodes leniently: missing fields fall back to their defaults
//! so that a gateway adding or omitting optional fields does not drop events.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::common::{IncomingMessage, MessageScene};
use crate::impl_event;
use crate::registry::{EventPrototype, EventRegistry};

/// The bot account went offline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotOfflineEvent {
    pub reason: String,
}

/// A message was received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageReceiveEvent(pub IncomingMessage);

impl Deref for MessageReceiveEvent {
    type Target = IncomingMessage;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A message was recalled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageRecallEvent {
    pub message_scene: MessageScene,
    pub peer_id: i64,
    pub message_seq: i64,
    pub sender_id: i64,
    pub operator_id: i64,
    pub display_suffix: String,
}

/// Someone asked to become a friend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendRequestEvent {
    pub initiator_id: i64,
    pub initiator_uid: String,
    pub comment: String,
    pub via: String,
}

/// Someone asked to join a group the bot administers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupJoinRequestEvent {
    pub group_id: i64,
    pub notification_seq: i64,
    pub is_filtered: bool,
    pub initiator_id: i64,
    pub comment: String,
}

/// A member invited someone else into a group the bot administers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupInvitedJoinRequestEvent {
    pub group_id: i64,
    pub notification_seq: i64,
    pub initiator_id: i64,
    pub target_user_id: i64,
}

/// The bot was invited into a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupInvitationEvent {
    pub group_id: i64,
    pub invitation_seq: i64,
    pub initiator_id: i64,
}

/// A friend nudge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendNudgeEvent {
    pub user_id: i64,
    pub is_self_send: bool,
    pub is_self_receive: bool,
    pub display_action: String,
    pub display_suffix: String,
    pub display_action_img_url: String,
}

/// A friend uploaded a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendFileUploadEvent {
    pub user_id: i64,
    pub file_id: String,
    pub file_name: String,
    pub file_size: i64,
    pub file_hash: String,
    pub is_self: bool,
}

/// A group administrator was set or unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupAdminChangeEvent {
    pub group_id: i64,
    pub user_id: i64,
    pub is_set: bool,
}

/// A group essence message was set or unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupEssenceMessageChangeEvent {
    pub group_id: i64,
    pub message_seq: i64,
    pub is_set: bool,
}

/// A member joined a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMemberIncreaseEvent {
    pub group_id: i64,
    pub user_id: i64,
    pub operator_id: Option<i64>,
    pub invitor_id: Option<i64>,
}

/// A member left or was removed from a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMemberDecreaseEvent {
    pub group_id: i64,
    pub user_id: i64,
    pub operator_id: Option<i64>,
}

/// A group was renamed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupNameChangeEvent {
    pub group_id: i64,
    pub new_group_name: String,
    pub operator_id: i64,
}

/// A reaction was added to or removed from a group message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMessageReactionEvent {
    pub group_id: i64,
    pub user_id: i64,
    pub message_seq: i64,
    pub face_id: String,
    pub is_add: bool,
}

/// A group member was muted or unmuted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMuteEvent {
    pub group_id: i64,
    pub user_id: i64,
    pub operator_id: i64,
    /// Mute duration in seconds; zero lifts the mute.
    pub duration: i32,
}

/// A whole group was muted or unmuted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupWholeMuteEvent {
    pub group_id: i64,
    pub operator_id: i64,
    pub is_mute: bool,
}

/// A group nudge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupNudgeEvent {
    pub group_id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub display_action: String,
    pub display_suffix: String,
    pub display_action_img_url: String,
}

/// A file was uploaded to a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupFileUploadEvent {
    pub group_id: i64,
    pub user_id: i64,
    pub file_id: String,
    pub file_name: String,
    pub file_size: i64,
}

impl_event!(BotOfflineEvent => "bot_offline");
impl_event!(MessageReceiveEvent => "message_receive");
impl_event!(MessageRecallEvent => "message_recall");
impl_event!(FriendRequestEvent => "friend_request");
impl_event!(GroupJoinRequestEvent => "group_join_request");
impl_event!(GroupInvitedJoinRequestEvent => "group_invited_join_request");
impl_event!(GroupInvitationEvent => "group_invitation");
impl_event!(FriendNudgeEvent => "friend_nudge");
impl_event!(FriendFileUploadEvent => "friend_file_upload");
impl_event!(GroupAdminChangeEvent => "group_admin_change");
impl_event!(GroupEssenceMessageChangeEvent => "group_essence_message_change");
impl_event!(GroupMemberIncreaseEvent => "group_member_increase");
impl_event!(GroupMemberDecreaseEvent => "group_member_decrease");
impl_event!(GroupNameChangeEvent => "group_name_change");
impl_event!(GroupMessageReactionEvent => "group_message_reaction");
impl_event!(GroupMuteEvent => "group_mute");
impl_event!(GroupWholeMuteEvent => "group_whole_mute");
impl_event!(GroupNudgeEvent => "group_nudge");
impl_event!(GroupFileUploadEvent => "group_file_upload");

/// Builds a registry holding every gateway event shape.
pub fn default_event_registry() -> EventRegistry {
    let prototypes = [
        EventPrototype::of::<BotOfflineEvent>(),
        EventPrototype::of::<MessageReceiveEvent>(),
        EventPrototype::of::<MessageRecallEvent>(),
        EventPrototype::of::<FriendRequestEvent>(),
        EventPrototype::of::<GroupJoinRequestEvent>(),
        EventPrototype::of::<GroupInvitedJoinRequestEvent>(),
        EventPrototype::of::<GroupInvitationEvent>(),
        EventPrototype::of::<FriendNudgeEvent>(),
        EventPrototype::of::<FriendFileUploadEvent>(),
        EventPrototype::of::<GroupAdminChangeEvent>(),
        EventPrototype::of::<GroupEssenceMessageChangeEvent>(),
        EventPrototype::of::<GroupMemberIncreaseEvent>(),
        EventPrototype::of::<GroupMemberDecreaseEvent>(),
        EventPrototype::of::<GroupNameChangeEvent>(),
        EventPrototype::of::<GroupMessageReactionEvent>(),
        EventPrototype::of::<GroupMuteEvent>(),
        EventPrototype::of::<GroupWholeMuteEvent>(),
        EventPrototype::of::<GroupNudgeEvent>(),
        EventPrototype::of::<GroupFileUploadEvent>(),
    ];

    let mut registry = EventRegistry::new();
    for prototype in prototypes {
        registry.replace(prototype.event_type(), prototype);
    }
    registry
}
