//! Typed command wrappers.
//!
//! Each wrapper posts its request to a fixed [`Command`] endpoint through
//! [`CommandClient::call`]. Commands without a wrapper are still reachable
//! through [`CommandClient::call_command`].

use tokio_util::sync::CancellationToken;

use emi_core::CommandResult;
use emi_core::model::Command;
use emi_core::model::api::*;

use super::client::CommandClient;

macro_rules! typed_commands {
    (@method $(#[$meta:meta])* $name:ident, $command:ident, (), $resp:ty) => {
        $(#[$meta])*
        pub async fn $name(&self, cancel: &CancellationToken) -> CommandResult<$resp> {
            self.call(cancel, Command::$command.as_str(), None::<&Empty>).await
        }
    };

    (@method $(#[$meta:meta])* $name:ident, $command:ident, ($req:ty), $resp:ty) => {
        $(#[$meta])*
        pub async fn $name(
            &self,
            cancel: &CancellationToken,
            request: &$req,
        ) -> CommandResult<$resp> {
            self.call(cancel, Command::$command.as_str(), Some(request)).await
        }
    };

    (
        $(
            $(#[$meta:meta])*
            fn $name:ident($command:ident $(, $req:ty)?) -> $resp:ty;
        )*
    ) => {
        impl CommandClient {
            $(
                typed_commands!(@method $(#[$meta])* $name, $command, ($($req)?), $resp);
            )*
        }
    };
}

typed_commands! {
    // System
    /// Returns the logged-in account.
    fn get_login_info(GetLoginInfo) -> GetLoginInfoResponse;
    /// Returns gateway implementation details.
    fn get_impl_info(GetImplInfo) -> GetImplInfoResponse;
    fn get_user_profile(GetUserProfile, GetUserProfileRequest) -> GetUserProfileResponse;
    fn get_friend_list(GetFriendList, CacheControl) -> GetFriendListResponse;
    fn get_friend_info(GetFriendInfo, GetFriendInfoRequest) -> GetFriendInfoResponse;
    fn get_group_list(GetGroupList, CacheControl) -> GetGroupListResponse;
    fn get_group_info(GetGroupInfo, GroupQuery) -> GetGroupInfoResponse;
    fn get_group_member_list(GetGroupMemberList, GroupQuery) -> GetGroupMemberListResponse;
    fn get_group_member_info(GetGroupMemberInfo, GetGroupMemberInfoRequest) -> GetGroupMemberInfoResponse;
    fn set_avatar(SetAvatar, SetAvatarRequest) -> Empty;
    fn set_nickname(SetNickname, SetNicknameRequest) -> Empty;
    fn set_bio(SetBio, SetBioRequest) -> Empty;
    fn get_custom_face_url_list(GetCustomFaceUrlList) -> GetCustomFaceUrlListResponse;
    fn get_cookies(GetCookies, GetCookiesRequest) -> GetCookiesResponse;
    fn get_csrf_token(GetCsrfToken) -> GetCsrfTokenResponse;

    // Message
    /// Sends a message to a friend.
    fn send_private_message(SendPrivateMessage, SendPrivateMessageRequest) -> SendMessageResponse;
    /// Sends a message to a group.
    fn send_group_message(SendGroupMessage, SendGroupMessageRequest) -> SendMessageResponse;
    fn recall_private_message(RecallPrivateMessage, RecallPrivateMessageRequest) -> Empty;
    fn recall_group_message(RecallGroupMessage, RecallGroupMessageRequest) -> Empty;
    fn get_message(GetMessage, MessageLocator) -> GetMessageResponse;
    fn get_history_messages(GetHistoryMessages, GetHistoryMessagesRequest) -> GetHistoryMessagesResponse;
    fn get_resource_temp_url(GetResourceTempUrl, GetResourceTempUrlRequest) -> GetResourceTempUrlResponse;
    fn get_forwarded_messages(GetForwardedMessages, GetForwardedMessagesRequest) -> GetForwardedMessagesResponse;
    fn mark_message_as_read(MarkMessageAsRead, MessageLocator) -> Empty;

    // Friend
    fn send_friend_nudge(SendFriendNudge, SendFriendNudgeRequest) -> Empty;
    fn accept_friend_request(AcceptFriendRequest, AcceptFriendRequestRequest) -> Empty;
    fn reject_friend_request(RejectFriendRequest, RejectFriendRequestRequest) -> Empty;

    // Group
    fn send_group_nudge(SendGroupNudge, SendGroupNudgeRequest) -> Empty;
    fn accept_group_request(AcceptGroupRequest, AcceptGroupRequestRequest) -> Empty;
    fn reject_group_request(RejectGroupRequest, RejectGroupRequestRequest) -> Empty;
    fn accept_group_invitation(AcceptGroupInvitation, GroupInvitationRequest) -> Empty;
    fn reject_group_invitation(RejectGroupInvitation, GroupInvitationRequest) -> Empty;
}
