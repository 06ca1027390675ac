//! Command request and response types.
//!
//! Only the commands with typed wrappers on the command client are modelled
//! here; every other endpoint in [`Command`](super::command::Command) can be
//! reached through the generic `call` with caller-defined types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

use super::common::{
    FriendEntity, GroupEntity, GroupMemberEntity, IncomingMessage, MessageScene, Segment,
};

/// The response envelope wrapping every command result.
///
/// Wire form: `{"status": string, "retcode": int, "data": <opaque>}`.
#[derive(Debug, Deserialize)]
pub struct HttpResult {
    /// `"ok"` or `"failed"`.
    #[serde(default)]
    pub status: String,
    /// Result code, zero on success.
    #[serde(rename = "retcode", default)]
    pub code: i64,
    /// The operation's typed result, still encoded.
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
    /// Human readable failure description.
    #[serde(default)]
    pub message: Option<String>,
}

impl HttpResult {
    /// Returns true if the gateway reported success.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// A request or response with no fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

// =============================================================================
// System
// =============================================================================

/// Response of `get_login_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetLoginInfoResponse {
    pub uin: i64,
    pub nickname: String,
}

/// Response of `get_impl_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetImplInfoResponse {
    pub impl_name: String,
    pub impl_version: String,
    pub qq_protocol_version: String,
    pub qq_protocol_type: String,
    pub milky_version: String,
}

/// Request of `get_user_profile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetUserProfileRequest {
    pub user_id: i64,
}

/// Response of `get_user_profile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetUserProfileResponse {
    pub nickname: String,
    pub qid: String,
    pub age: i32,
    pub sex: String,
    pub remark: String,
    pub bio: String,
    pub level: i32,
    pub country: String,
    pub city: String,
    pub school: String,
}

/// Request shared by list queries that may bypass the gateway cache.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheControl {
    #[serde(default)]
    pub no_cache: bool,
}

/// Response of `get_friend_list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetFriendListResponse {
    pub friends: Vec<FriendEntity>,
}

/// Request of `get_friend_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetFriendInfoRequest {
    pub user_id: i64,
    #[serde(default)]
    pub no_cache: bool,
}

/// Response of `get_friend_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetFriendInfoResponse {
    pub friend: FriendEntity,
}

/// Response of `get_group_list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetGroupListResponse {
    pub groups: Vec<GroupEntity>,
}

/// Request of `get_group_info` and `get_group_member_list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupQuery {
    pub group_id: i64,
    #[serde(default)]
    pub no_cache: bool,
}

/// Response of `get_group_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetGroupInfoResponse {
    pub group: GroupEntity,
}

/// Response of `get_group_member_list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetGroupMemberListResponse {
    pub members: Vec<GroupMemberEntity>,
}

/// Request of `get_group_member_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetGroupMemberInfoRequest {
    pub group_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub no_cache: bool,
}

/// Response of `get_group_member_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetGroupMemberInfoResponse {
    pub member: GroupMemberEntity,
}

/// Request of `set_avatar`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetAvatarRequest {
    /// `file://`, `http(s)://` or `base64://` URI of the image.
    pub uri: String,
}

/// Request of `set_nickname`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetNicknameRequest {
    pub new_nickname: String,
}

/// Request of `set_bio`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetBioRequest {
    pub new_bio: String,
}

/// Response of `get_custom_face_url_list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetCustomFaceUrlListResponse {
    pub urls: Vec<String>,
}

/// Request of `get_cookies`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetCookiesRequest {
    pub domain: String,
}

/// Response of `get_cookies`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetCookiesResponse {
    pub cookies: String,
}

/// Response of `get_csrf_token`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetCsrfTokenResponse {
    pub csrf_token: String,
}

// =============================================================================
// Message
// =============================================================================

/// Request of `send_private_message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendPrivateMessageRequest {
    pub user_id: i64,
    pub message: Vec<Segment>,
}

/// Request of `send_group_message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendGroupMessageRequest {
    pub group_id: i64,
    pub message: Vec<Segment>,
}

/// Response of both message sending commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SendMessageResponse {
    pub message_seq: i64,
    pub time: i64,
}

/// Request of `recall_private_message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecallPrivateMessageRequest {
    pub user_id: i64,
    pub message_seq: i64,
}

/// Request of `recall_group_message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecallGroupMessageRequest {
    pub group_id: i64,
    pub message_seq: i64,
}

/// Request of `get_message` and `mark_message_as_read`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageLocator {
    pub message_scene: MessageScene,
    pub peer_id: i64,
    pub message_seq: i64,
}

/// Response of `get_message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetMessageResponse {
    pub message: IncomingMessage,
}

/// Request of `get_history_messages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetHistoryMessagesRequest {
    pub message_scene: MessageScene,
    pub peer_id: i64,
    /// Newest sequence to start from; `None` starts at the latest message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_message_seq: Option<i64>,
    pub limit: i32,
}

/// Response of `get_history_messages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetHistoryMessagesResponse {
    pub messages: Vec<IncomingMessage>,
    pub next_message_seq: Option<i64>,
}

/// Request of `get_resource_temp_url`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetResourceTempUrlRequest {
    pub resource_id: String,
}

/// Response of `get_resource_temp_url`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetResourceTempUrlResponse {
    pub url: String,
}

/// Request of `get_forwarded_messages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetForwardedMessagesRequest {
    pub forward_id: String,
}

/// Response of `get_forwarded_messages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetForwardedMessagesResponse {
    pub messages: Vec<Value>,
}

// =============================================================================
// Friend
// =============================================================================

/// Request of `send_friend_nudge`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendFriendNudgeRequest {
    pub user_id: i64,
    #[serde(default)]
    pub is_self: bool,
}

/// Request of `accept_friend_request`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcceptFriendRequestRequest {
    pub initiator_uid: String,
    #[serde(default)]
    pub is_filtered: bool,
}

/// Request of `reject_friend_request`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectFriendRequestRequest {
    pub initiator_uid: String,
    #[serde(default)]
    pub is_filtered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// =============================================================================
// Group
// =============================================================================

/// Request of `send_group_nudge`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendGroupNudgeRequest {
    pub group_id: i64,
    pub user_id: i64,
}

/// Request of `accept_group_request`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcceptGroupRequestRequest {
    pub notification_seq: i64,
    /// `join_request` or `invited_join_request`.
    pub notification_type: String,
    pub group_id: i64,
    #[serde(default)]
    pub is_filtered: bool,
}

/// Request of `reject_group_request`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectGroupRequestRequest {
    pub notification_seq: i64,
    pub notification_type: String,
    pub group_id: i64,
    #[serde(default)]
    pub is_filtered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Request of `accept_group_invitation` and `reject_group_invitation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupInvitationRequest {
    pub group_id: i64,
    pub invitation_seq: i64,
}
