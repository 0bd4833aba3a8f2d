//! Typed long-poll events.
//!
//! Updates arrive in two wire shapes. Group (bot) endpoints send keyed
//! objects with a category string; user endpoints send positional arrays
//! with a leading integer code. Each shape has its own decoder and typed
//! family, and [`Event`] is the common currency the dispatch tree works
//! with.

mod group;
mod kind;
mod user;

pub use group::{
    CHAT_START_ID, ClientInfo, EventObject, GroupEvent, MessageBody, MessageSource,
    decode_group_update,
};
pub use kind::UpdateKind;
pub use user::{
    Call, ChatInfoChange, ChatParamsChange, FlagOp, MessageEdit, MessageFlags,
    MessageFlagsChange, NewMessage, NotificationSettings, PeerAction, PeerFlagsChange,
    ReadDirection, ReadMarker, SortIdChange, UserEvent, UserOffline, UserOnline, UserTyping,
    UserTypingInChat, UsersActivity, decode_user_update,
};

use serde_json::Value;

/// Any decoded update, from either long-poll variant.
#[derive(Debug, Clone)]
pub enum Event {
    /// Object-shaped group update.
    Group(GroupEvent),
    /// Array-shaped user update.
    User(UserEvent),
}

impl Event {
    /// The routing category, for updates that carry one.
    ///
    /// Array-shaped updates are tagged by numeric code instead of a
    /// category string and return `None`.
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Group(event) => Some(event.kind.as_str()),
            Self::User(_) => None,
        }
    }

    /// The update as received, for the shape that keeps its raw form.
    pub fn raw_json(&self) -> Option<&Value> {
        match self {
            Self::Group(event) => Some(event.raw()),
            Self::User(_) => None,
        }
    }

    /// The object-shaped view, when this is a group update.
    pub fn as_group(&self) -> Option<&GroupEvent> {
        match self {
            Self::Group(event) => Some(event),
            Self::User(_) => None,
        }
    }

    /// The array-shaped view, when this is a user update.
    pub fn as_user(&self) -> Option<&UserEvent> {
        match self {
            Self::Group(_) => None,
            Self::User(event) => Some(event),
        }
    }
}

impl From<GroupEvent> for Event {
    fn from(event: GroupEvent) -> Self {
        Self::Group(event)
    }
}

impl From<UserEvent> for Event {
    fn from(event: UserEvent) -> Self {
        Self::User(event)
    }
}
