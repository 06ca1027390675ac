//! The table of remote command endpoints.
//!
//! Every gateway operation is a plain request/response pair posted to
//! `{api_url}/{endpoint}`. [`Command`] names them so callers never spell
//! endpoint paths by hand.

use std::fmt;

/// Functional group a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandGroup {
    /// Account and contact queries.
    System,
    /// Sending, recalling and fetching messages.
    Message,
    /// Friend management.
    Friend,
    /// Group management.
    Group,
    /// File transfer and group file storage.
    File,
}

macro_rules! commands {
    ($($group:ident { $($variant:ident => $endpoint:literal,)* })*) => {
        /// A remote command endpoint.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Command {
            $($($variant,)*)*
        }

        impl Command {
            /// Every command, grouped in declaration order.
            pub const ALL: &'static [Command] = &[$($(Command::$variant,)*)*];

            /// Returns the endpoint path segment.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($(Command::$variant => $endpoint,)*)*
                }
            }

            /// Returns the functional group.
            pub fn group(&self) -> CommandGroup {
                match self {
                    $($(Command::$variant => CommandGroup::$group,)*)*
                }
            }
        }
    };
}

commands! {
    System {
        GetLoginInfo => "get_login_info",
        GetImplInfo => "get_impl_info",
        GetUserProfile => "get_user_profile",
        GetFriendList => "get_friend_list",
        GetFriendInfo => "get_friend_info",
        GetGroupList => "get_group_list",
        GetGroupInfo => "get_group_info",
        GetGroupMemberList => "get_group_member_list",
        GetGroupMemberInfo => "get_group_member_info",
        SetAvatar => "set_avatar",
        SetNickname => "set_nickname",
        SetBio => "set_bio",
        GetCustomFaceUrlList => "get_custom_face_url_list",
        GetCookies => "get_cookies",
        GetCsrfToken => "get_csrf_token",
    }
    Message {
        SendPrivateMessage => "send_private_message",
        SendGroupMessage => "send_group_message",
        RecallPrivateMessage => "recall_private_message",
        RecallGroupMessage => "recall_group_message",
        GetMessage => "get_message",
        GetHistoryMessages => "get_history_messages",
        GetResourceTempUrl => "get_resource_temp_url",
        GetForwardedMessages => "get_forwarded_messages",
        MarkMessageAsRead => "mark_message_as_read",
    }
    Friend {
        SendFriendNudge => "send_friend_nudge",
        SendProfileLike => "send_profile_like",
        DeleteFriend => "delete_friend",
        GetFriendRequests => "get_friend_requests",
        AcceptFriendRequest => "accept_friend_request",
        RejectFriendRequest => "reject_friend_request",
    }
    Group {
        SetGroupName => "set_group_name",
        SetGroupAvatar => "set_group_avatar",
        SetGroupMemberCard => "set_group_member_card",
        SetGroupMemberSpecialTitle => "set_group_member_special_title",
        SetGroupMemberAdmin => "set_group_member_admin",
        SetGroupMemberMute => "set_group_member_mute",
        SetGroupMemberWholeMute => "set_group_member_whole_mute",
        KickGroupMember => "kick_group_member",
        GetGroupAnnouncements => "get_group_announcements",
        SendGroupAnnouncement => "send_group_announcement",
        DeleteGroupAnnouncement => "delete_group_announcement",
        GetGroupEssenceMessages => "get_group_essence_messages",
        SetGroupEssenceMessage => "set_group_essence_message",
        QuitGroup => "quit_group",
        SendGroupMessageReaction => "send_group_message_reaction",
        SendGroupNudge => "send_group_nudge",
        GetGroupNotifications => "get_group_notifications",
        AcceptGroupRequest => "accept_group_request",
        RejectGroupRequest => "reject_group_request",
        AcceptGroupInvitation => "accept_group_invitation",
        RejectGroupInvitation => "reject_group_invitation",
    }
    File {
        UploadPrivateFile => "upload_private_file",
        UploadGroupFile => "upload_group_file",
        GetPrivateFileDownloadUrl => "get_private_file_download_url",
        GetGroupFileDownloadUrl => "get_group_file_download_url",
        GetGroupFiles => "get_group_files",
        MoveGroupFile => "move_group_file",
        RenameGroupFile => "rename_group_file",
        DeleteGroupFile => "delete_group_file",
        CreateGroupFolder => "create_group_folder",
        RenameGroupFolder => "rename_group_folder",
        DeleteGroupFolder => "delete_group_folder",
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
