//! Group update categories.
//!
//! The platform tags every object-shaped update with a `type` string. The
//! known catalog is closed, but decoding never rejects a new tag: anything
//! outside the catalog is preserved verbatim in [`UpdateKind::Unknown`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category tag of an object-shaped group update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpdateKind {
    /// Incoming message.
    MessageNew,
    /// Outgoing message sent by the community.
    MessageReply,
    /// Message edited.
    MessageEdit,
    /// Callback button pressed.
    MessageEvent,
    /// Typing indicator.
    MessageTypingState,
    /// User allowed messages from the community.
    MessageAllow,
    /// User forbade messages from the community.
    MessageDeny,
    /// Photo uploaded.
    PhotoNew,
    /// Photo comment added.
    PhotoCommentNew,
    /// Photo comment edited.
    PhotoCommentEdit,
    /// Photo comment restored.
    PhotoCommentRestore,
    /// Photo comment deleted.
    PhotoCommentDelete,
    /// Audio uploaded.
    AudioNew,
    /// Video uploaded.
    VideoNew,
    /// Video comment added.
    VideoCommentNew,
    /// Video comment edited.
    VideoCommentEdit,
    /// Video comment restored.
    VideoCommentRestore,
    /// Video comment deleted.
    VideoCommentDelete,
    /// Wall post added.
    WallPostNew,
    /// Wall repost.
    WallRepost,
    /// Wall comment added.
    WallReplyNew,
    /// Wall comment edited.
    WallReplyEdit,
    /// Wall comment restored.
    WallReplyRestore,
    /// Wall comment deleted.
    WallReplyDelete,
    /// Board topic post added.
    BoardPostNew,
    /// Board topic post edited.
    BoardPostEdit,
    /// Board topic post restored.
    BoardPostRestore,
    /// Board topic post deleted.
    BoardPostDelete,
    /// Market comment added.
    MarketCommentNew,
    /// Market comment edited.
    MarketCommentEdit,
    /// Market comment restored.
    MarketCommentRestore,
    /// Market comment deleted.
    MarketCommentDelete,
    /// Member left the community.
    GroupLeave,
    /// Member joined the community.
    GroupJoin,
    /// User blocked in the community.
    UserBlock,
    /// User unblocked in the community.
    UserUnblock,
    /// New poll vote.
    PollVoteNew,
    /// Community officer list edited.
    GroupOfficersEdit,
    /// Community settings changed.
    GroupChangeSettings,
    /// Community main photo changed.
    GroupChangePhoto,
    /// VK Pay transaction.
    VkpayTransaction,
    /// Category tag outside the known catalog, preserved verbatim.
    Unknown(String),
}

impl UpdateKind {
    /// The wire representation of this category tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::MessageNew => "message_new",
            Self::MessageReply => "message_reply",
            Self::MessageEdit => "message_edit",
            Self::MessageEvent => "message_event",
            Self::MessageTypingState => "message_typing_state",
            Self::MessageAllow => "message_allow",
            Self::MessageDeny => "message_deny",
            Self::PhotoNew => "photo_new",
            Self::PhotoCommentNew => "photo_comment_new",
            Self::PhotoCommentEdit => "photo_comment_edit",
            Self::PhotoCommentRestore => "photo_comment_restore",
            Self::PhotoCommentDelete => "photo_comment_delete",
            Self::AudioNew => "audio_new",
            Self::VideoNew => "video_new",
            Self::VideoCommentNew => "video_comment_new",
            Self::VideoCommentEdit => "video_comment_edit",
            Self::VideoCommentRestore => "video_comment_restore",
            Self::VideoCommentDelete => "video_comment_delete",
            Self::WallPostNew => "wall_post_new",
            Self::WallRepost => "wall_repost",
            Self::WallReplyNew => "wall_reply_new",
            Self::WallReplyEdit => "wall_reply_edit",
            Self::WallReplyRestore => "wall_reply_restore",
            Self::WallReplyDelete => "wall_reply_delete",
            Self::BoardPostNew => "board_post_new",
            Self::BoardPostEdit => "board_post_edit",
            Self::BoardPostRestore => "board_post_restore",
            Self::BoardPostDelete => "board_post_delete",
            Self::MarketCommentNew => "market_comment_new",
            Self::MarketCommentEdit => "market_comment_edit",
            Self::MarketCommentRestore => "market_comment_restore",
            Self::MarketCommentDelete => "market_comment_delete",
            Self::GroupLeave => "group_leave",
            Self::GroupJoin => "group_join",
            Self::UserBlock => "user_block",
            Self::UserUnblock => "user_unblock",
            Self::PollVoteNew => "poll_vote_new",
            Self::GroupOfficersEdit => "group_officers_edit",
            Self::GroupChangeSettings => "group_change_settings",
            Self::GroupChangePhoto => "group_change_photo",
            Self::VkpayTransaction => "vkpay_transaction",
            Self::Unknown(tag) => tag,
        }
    }

    /// Whether events of this category carry a message body.
    ///
    /// These are the categories that receive eager audience classification
    /// and the `answer` helper.
    pub fn is_message(&self) -> bool {
        matches!(self, Self::MessageNew | Self::MessageReply | Self::MessageEdit)
    }
}

impl From<&str> for UpdateKind {
    fn from(tag: &str) -> Self {
        match tag {
            "message_new" => Self::MessageNew,
            "message_reply" => Self::MessageReply,
            "message_edit" => Self::MessageEdit,
            "message_event" => Self::MessageEvent,
            "message_typing_state" => Self::MessageTypingState,
            "message_allow" => Self::MessageAllow,
            "message_deny" => Self::MessageDeny,
            "photo_new" => Self::PhotoNew,
            "photo_comment_new" => Self::PhotoCommentNew,
            "photo_comment_edit" => Self::PhotoCommentEdit,
            "photo_comment_restore" => Self::PhotoCommentRestore,
            "photo_comment_delete" => Self::PhotoCommentDelete,
            "audio_new" => Self::AudioNew,
            "video_new" => Self::VideoNew,
            "video_comment_new" => Self::VideoCommentNew,
            "video_comment_edit" => Self::VideoCommentEdit,
            "video_comment_restore" => Self::VideoCommentRestore,
            "video_comment_delete" => Self::VideoCommentDelete,
            "wall_post_new" => Self::WallPostNew,
            "wall_repost" => Self::WallRepost,
            "wall_reply_new" => Self::WallReplyNew,
            "wall_reply_edit" => Self::WallReplyEdit,
            "wall_reply_restore" => Self::WallReplyRestore,
            "wall_reply_delete" => Self::WallReplyDelete,
            "board_post_new" => Self::BoardPostNew,
            "board_post_edit" => Self::BoardPostEdit,
            "board_post_restore" => Self::BoardPostRestore,
            "board_post_delete" => Self::BoardPostDelete,
            "market_comment_new" => Self::MarketCommentNew,
            "market_comment_edit" => Self::MarketCommentEdit,
            "market_comment_restore" => Self::MarketCommentRestore,
            "market_comment_delete" => Self::MarketCommentDelete,
            "group_leave" => Self::GroupLeave,
            "group_join" => Self::GroupJoin,
            "user_block" => Self::UserBlock,
            "user_unblock" => Self::UserUnblock,
            "poll_vote_new" => Self::PollVoteNew,
            "group_officers_edit" => Self::GroupOfficersEdit,
            "group_change_settings" => Self::GroupChangeSettings,
            "group_change_photo" => Self::GroupChangePhoto,
            "vkpay_transaction" => Self::VkpayTransaction,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for UpdateKind {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<UpdateKind> for String {
    fn from(kind: UpdateKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_round_trip() {
        for tag in ["message_new", "message_event", "wall_repost", "vkpay_transaction"] {
            let kind = UpdateKind::from(tag);
            assert!(!matches!(kind, UpdateKind::Unknown(_)), "{tag} should be known");
            assert_eq!(kind.as_str(), tag);
        }
    }

    #[test]
    fn unknown_tag_is_preserved_verbatim() {
        let kind = UpdateKind::from("donut_subscription_create");
        assert_eq!(kind, UpdateKind::Unknown("donut_subscription_create".into()));
        assert_eq!(kind.as_str(), "donut_subscription_create");
    }

    #[test]
    fn message_bearing_set() {
        assert!(UpdateKind::MessageNew.is_message());
        assert!(UpdateKind::MessageReply.is_message());
        assert!(UpdateKind::MessageEdit.is_message());
        assert!(!UpdateKind::MessageEvent.is_message());
        assert!(!UpdateKind::GroupJoin.is_message());
    }
}
