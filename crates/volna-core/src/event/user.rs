//! Array-shaped user updates.
//!
//! The user long-poll endpoint delivers updates as positional arrays with
//! a leading integer code, e.g. `[4, message_id, flags, peer_id, ...]`.
//! A fixed dispatch table maps every known code to its field layout;
//! unknown codes decode into [`UserEvent::Unknown`] instead of failing so
//! new server-side codes never break a running session.

use bitflags::bitflags;
use serde_json::Value;

use crate::error::{DecodeError, DecodeResult};

bitflags! {
    /// Bit mask over a message's state flags, as used by codes 1–4.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MessageFlags: i64 {
        /// Message is unread.
        const UNREAD = 1;
        /// Outgoing message.
        const OUTBOX = 2;
        /// Message was answered.
        const REPLIED = 4;
        /// Message is marked important.
        const IMPORTANT = 8;
        /// Message was sent via chat.
        const CHAT = 16;
        /// Message was sent by a friend.
        const FRIENDS = 32;
        /// Message is marked as spam.
        const SPAM = 64;
        /// Message is deleted.
        const DELETED = 128;
        /// Message was checked for spam.
        const FIXED = 256;
        /// Message carries media attachments.
        const MEDIA = 512;
        /// Welcome message, not shown in the history.
        const HIDDEN = 65536;
    }
}

/// How a flag-change code applies its mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOp {
    /// Flags replaced with the mask.
    Replace,
    /// Flags in the mask set.
    Set,
    /// Flags in the mask cleared.
    Reset,
}

/// Which side of the dialog a read marker applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadDirection {
    /// Incoming messages were read (code 6).
    Incoming,
    /// Outgoing messages were read (code 7).
    Outgoing,
}

// =============================================================================
// Per-code field layouts
// =============================================================================

/// Codes 1–3: message flag change.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageFlagsChange {
    /// How the mask applies.
    pub op: FlagOp,
    /// Target message.
    pub message_id: i64,
    /// Flag mask.
    pub mask: i64,
    /// Trailing positional fields, layout varies by flag.
    pub extra: Vec<Value>,
}

impl MessageFlagsChange {
    /// The mask as typed flags; unknown bits are dropped.
    pub fn flags(&self) -> MessageFlags {
        MessageFlags::from_bits_truncate(self.mask)
    }
}

/// Code 4: new message.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    /// Message id.
    pub message_id: i64,
    /// Message flag mask.
    pub flags: i64,
    /// Conversation peer id.
    pub peer_id: i64,
    /// Trailing positional fields (timestamp, text, attachments...).
    pub extra: Vec<Value>,
    /// Full message body, filled in by message preload.
    pub message: Option<Value>,
}

impl NewMessage {
    /// The flag mask as typed flags; unknown bits are dropped.
    pub fn flags(&self) -> MessageFlags {
        MessageFlags::from_bits_truncate(self.flags)
    }
}

/// Code 5: message edited.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEdit {
    /// Message id.
    pub message_id: i64,
    /// Flag mask.
    pub mask: i64,
    /// Conversation peer id.
    pub peer_id: i64,
    /// Edit timestamp.
    pub timestamp: i64,
    /// New message text.
    pub new_text: String,
    /// Attachment descriptor, as received.
    pub attachments: Value,
    /// Full message body, filled in by message preload.
    pub message: Option<Value>,
}

/// Codes 6–7: read marker moved.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadMarker {
    /// Which side of the dialog was read.
    pub direction: ReadDirection,
    /// Conversation peer id.
    pub peer_id: i64,
    /// Id of the last read message.
    pub local_id: i64,
}

/// Code 8: user came online.
#[derive(Debug, Clone, PartialEq)]
pub struct UserOnline {
    /// User id with the wire-format sign stripped.
    pub user_id: i64,
    /// Platform descriptor.
    pub extra: i64,
    /// Unix timestamp.
    pub timestamp: i64,
}

impl UserOnline {
    /// Whether the user is actually online.
    pub fn is_online(&self) -> bool {
        self.extra != 0
    }

    /// Platform the user is online from.
    pub fn platform_id(&self) -> i64 {
        self.extra % 256
    }
}

/// Code 9: user went offline.
#[derive(Debug, Clone, PartialEq)]
pub struct UserOffline {
    /// User id with the wire-format sign stripped.
    pub user_id: i64,
    /// Offline reason flags.
    pub flags: i64,
    /// Unix timestamp.
    pub timestamp: i64,
}

impl UserOffline {
    /// Whether the user timed out rather than left explicitly.
    pub fn is_timeout(&self) -> bool {
        self.flags == 1
    }
}

/// Codes 10–12: peer flag change.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerFlagsChange {
    /// How the mask applies.
    pub op: FlagOp,
    /// Conversation peer id.
    pub peer_id: i64,
    /// Flag mask.
    pub mask: i64,
}

/// Codes 13–14: all messages of a peer deleted or restored.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerAction {
    /// Conversation peer id.
    pub peer_id: i64,
    /// Id of the last affected message.
    pub local_id: i64,
}

/// Codes 20–21: conversation sort key changed.
#[derive(Debug, Clone, PartialEq)]
pub struct SortIdChange {
    /// Conversation peer id.
    pub peer_id: i64,
    /// New major or minor sort id.
    pub id: i64,
}

/// Code 51: chat parameters changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatParamsChange {
    /// Chat number.
    pub chat_id: i64,
    /// `1` when the change was made by the current user.
    pub source: i64,
}

impl ChatParamsChange {
    /// Whether the current user made the change.
    pub fn is_self(&self) -> bool {
        self.source == 1
    }
}

/// Code 52: chat information changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatInfoChange {
    /// Kind of change.
    pub type_id: i64,
    /// Conversation peer id.
    pub peer_id: i64,
    /// Change-specific payload.
    pub info: Value,
}

/// Code 61: user types in a dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct UserTyping {
    /// Typing user.
    pub user_id: i64,
    /// Always `1` on the wire.
    pub flags: i64,
}

/// Code 62: user types in a chat.
#[derive(Debug, Clone, PartialEq)]
pub struct UserTypingInChat {
    /// Typing user.
    pub user_id: i64,
    /// Chat number.
    pub chat_id: i64,
}

/// Codes 63–64: several users type or record audio in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct UsersActivity {
    /// Users performing the activity.
    pub user_ids: Vec<i64>,
    /// Conversation peer id.
    pub peer_id: i64,
    /// Total number of active users.
    pub total_count: i64,
    /// Unix timestamp.
    pub timestamp: i64,
}

/// Code 70: user made a call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Calling user.
    pub user_id: i64,
    /// Call id.
    pub call_id: i64,
}

/// Code 114: per-peer notification settings changed.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSettings {
    /// Conversation peer id.
    pub peer_id: i64,
    /// Sound toggle, `1` = on.
    pub sound: i64,
    /// Tri-state mute marker: `-1` forever, `0` enabled, otherwise the
    /// unmute timestamp.
    pub disabled_until: i64,
}

impl NotificationSettings {
    /// Whether notification sounds are on.
    pub fn sound_enabled(&self) -> bool {
        self.sound == 1
    }

    /// Whether notifications are disabled with no end date.
    pub fn disabled_forever(&self) -> bool {
        self.disabled_until == -1
    }

    /// Whether notifications are fully enabled.
    pub fn enabled(&self) -> bool {
        self.disabled_until == 0
    }
}

// =============================================================================
// UserEvent
// =============================================================================

/// One decoded array-shaped update.
#[derive(Debug, Clone, PartialEq)]
pub enum UserEvent {
    /// Codes 1–3.
    MessageFlags(MessageFlagsChange),
    /// Code 4.
    NewMessage(NewMessage),
    /// Code 5.
    MessageEdit(MessageEdit),
    /// Codes 6–7.
    MessagesRead(ReadMarker),
    /// Code 8.
    UserOnline(UserOnline),
    /// Code 9.
    UserOffline(UserOffline),
    /// Codes 10–12.
    PeerFlags(PeerFlagsChange),
    /// Code 13.
    MessagesDeleted(PeerAction),
    /// Code 14.
    MessagesRestored(PeerAction),
    /// Code 20.
    MajorIdChanged(SortIdChange),
    /// Code 21.
    MinorIdChanged(SortIdChange),
    /// Code 51.
    ChatParamsChanged(ChatParamsChange),
    /// Code 52.
    ChatInfoChanged(ChatInfoChange),
    /// Code 61.
    UserTyping(UserTyping),
    /// Code 62.
    UserTypingInChat(UserTypingInChat),
    /// Code 63.
    UsersTyping(UsersActivity),
    /// Code 64.
    UsersRecordingAudio(UsersActivity),
    /// Code 70.
    Call(Call),
    /// Code 80.
    CounterUpdate {
        /// New unread counter value.
        count: i64,
    },
    /// Code 114.
    NotificationSettingsChanged(NotificationSettings),
    /// Any well-formed code outside the table.
    Unknown {
        /// The unrecognized code.
        code: i64,
        /// Synthesized human-readable description.
        description: String,
        /// Positional fields after the code, as received.
        fields: Vec<Value>,
    },
}

impl UserEvent {
    /// The wire code this event was decoded from.
    pub fn code(&self) -> i64 {
        match self {
            Self::MessageFlags(e) => match e.op {
                FlagOp::Replace => 1,
                FlagOp::Set => 2,
                FlagOp::Reset => 3,
            },
            Self::NewMessage(_) => 4,
            Self::MessageEdit(_) => 5,
            Self::MessagesRead(e) => match e.direction {
                ReadDirection::Incoming => 6,
                ReadDirection::Outgoing => 7,
            },
            Self::UserOnline(_) => 8,
            Self::UserOffline(_) => 9,
            Self::PeerFlags(e) => match e.op {
                FlagOp::Reset => 10,
                FlagOp::Replace => 11,
                FlagOp::Set => 12,
            },
            Self::MessagesDeleted(_) => 13,
            Self::MessagesRestored(_) => 14,
            Self::MajorIdChanged(_) => 20,
            Self::MinorIdChanged(_) => 21,
            Self::ChatParamsChanged(_) => 51,
            Self::ChatInfoChanged(_) => 52,
            Self::UserTyping(_) => 61,
            Self::UserTypingInChat(_) => 62,
            Self::UsersTyping(_) => 63,
            Self::UsersRecordingAudio(_) => 64,
            Self::Call(_) => 70,
            Self::CounterUpdate { .. } => 80,
            Self::NotificationSettingsChanged(_) => 114,
            Self::Unknown { code, .. } => *code,
        }
    }

    /// Human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            Self::MessageFlags(e) => match e.op {
                FlagOp::Replace => "message flags replaced",
                FlagOp::Set => "message flags set",
                FlagOp::Reset => "message flags reset",
            },
            Self::NewMessage(_) => "new message",
            Self::MessageEdit(_) => "message edited",
            Self::MessagesRead(e) => match e.direction {
                ReadDirection::Incoming => "incoming messages read",
                ReadDirection::Outgoing => "outgoing messages read",
            },
            Self::UserOnline(_) => "user came online",
            Self::UserOffline(_) => "user went offline",
            Self::PeerFlags(e) => match e.op {
                FlagOp::Replace => "peer flags replaced",
                FlagOp::Set => "peer flags set",
                FlagOp::Reset => "peer flags reset",
            },
            Self::MessagesDeleted(_) => "messages deleted for peer",
            Self::MessagesRestored(_) => "messages restored for peer",
            Self::MajorIdChanged(_) => "conversation major id changed",
            Self::MinorIdChanged(_) => "conversation minor id changed",
            Self::ChatParamsChanged(_) => "chat parameters changed",
            Self::ChatInfoChanged(_) => "chat information changed",
            Self::UserTyping(_) => "user is typing",
            Self::UserTypingInChat(_) => "user is typing in chat",
            Self::UsersTyping(_) => "users are typing",
            Self::UsersRecordingAudio(_) => "users are recording audio",
            Self::Call(_) => "user made a call",
            Self::CounterUpdate { .. } => "unread counter changed",
            Self::NotificationSettingsChanged(_) => "notification settings changed",
            Self::Unknown { description, .. } => description,
        }
    }

    /// Message id to preload, for the message-bearing codes.
    pub fn preload_message_id(&self) -> Option<i64> {
        match self {
            Self::NewMessage(e) => Some(e.message_id),
            Self::MessageEdit(e) => Some(e.message_id),
            _ => None,
        }
    }

    /// Attaches a preloaded message body.
    ///
    /// Only the message-bearing codes carry the slot; for every other
    /// variant this is a no-op.
    pub fn attach_message(&mut self, message: Value) {
        match self {
            Self::NewMessage(e) => e.message = Some(message),
            Self::MessageEdit(e) => e.message = Some(message),
            _ => {}
        }
    }

    /// The preloaded message body, if one was attached.
    pub fn message(&self) -> Option<&Value> {
        match self {
            Self::NewMessage(e) => e.message.as_ref(),
            Self::MessageEdit(e) => e.message.as_ref(),
            _ => None,
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

fn int_field(code: i64, fields: &[Value], idx: usize, name: &str) -> DecodeResult<i64> {
    fields.get(idx).and_then(Value::as_i64).ok_or_else(|| {
        DecodeError::invalid(format!("code {code}: field {idx} ({name}) missing or not an integer"))
    })
}

fn str_field(code: i64, fields: &[Value], idx: usize, name: &str) -> DecodeResult<String> {
    fields
        .get(idx)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| {
            DecodeError::invalid(format!("code {code}: field {idx} ({name}) missing or not a string"))
        })
}

fn id_list_field(code: i64, fields: &[Value], idx: usize, name: &str) -> DecodeResult<Vec<i64>> {
    let items = fields.get(idx).and_then(Value::as_array).ok_or_else(|| {
        DecodeError::invalid(format!("code {code}: field {idx} ({name}) missing or not a list"))
    })?;
    items
        .iter()
        .map(|v| {
            v.as_i64().ok_or_else(|| {
                DecodeError::invalid(format!("code {code}: field {idx} ({name}) holds a non-integer id"))
            })
        })
        .collect()
}

/// Decodes one array-shaped update.
pub fn decode_user_update(raw: &Value) -> DecodeResult<UserEvent> {
    let items = raw
        .as_array()
        .ok_or_else(|| DecodeError::invalid("user update is not an array"))?;
    if items.is_empty() {
        return Err(DecodeError::EmptyUpdate);
    }
    let code = items[0]
        .as_i64()
        .ok_or_else(|| DecodeError::invalid("user update code is not an integer"))?;
    let fields = &items[1..];

    let event = match code {
        1..=3 => {
            let op = match code {
                1 => FlagOp::Replace,
                2 => FlagOp::Set,
                _ => FlagOp::Reset,
            };
            UserEvent::MessageFlags(MessageFlagsChange {
                op,
                message_id: int_field(code, fields, 0, "message_id")?,
                mask: int_field(code, fields, 1, "mask")?,
                extra: fields.get(2..).unwrap_or_default().to_vec(),
            })
        }
        4 => UserEvent::NewMessage(NewMessage {
            message_id: int_field(code, fields, 0, "message_id")?,
            flags: int_field(code, fields, 1, "flags")?,
            peer_id: int_field(code, fields, 2, "peer_id")?,
            extra: fields.get(3..).unwrap_or_default().to_vec(),
            message: None,
        }),
        5 => UserEvent::MessageEdit(MessageEdit {
            message_id: int_field(code, fields, 0, "message_id")?,
            mask: int_field(code, fields, 1, "mask")?,
            peer_id: int_field(code, fields, 2, "peer_id")?,
            timestamp: int_field(code, fields, 3, "timestamp")?,
            new_text: str_field(code, fields, 4, "new_text")?,
            attachments: fields.get(5).cloned().unwrap_or(Value::Null),
            message: None,
        }),
        6 | 7 => UserEvent::MessagesRead(ReadMarker {
            direction: if code == 6 { ReadDirection::Incoming } else { ReadDirection::Outgoing },
            peer_id: int_field(code, fields, 0, "peer_id")?,
            local_id: int_field(code, fields, 1, "local_id")?,
        }),
        8 => UserEvent::UserOnline(UserOnline {
            user_id: int_field(code, fields, 0, "user_id")?.abs(),
            extra: int_field(code, fields, 1, "extra")?,
            timestamp: int_field(code, fields, 2, "timestamp")?,
        }),
        9 => UserEvent::UserOffline(UserOffline {
            user_id: int_field(code, fields, 0, "user_id")?.abs(),
            flags: int_field(code, fields, 1, "flags")?,
            timestamp: int_field(code, fields, 2, "timestamp")?,
        }),
        10..=12 => {
            let op = match code {
                10 => FlagOp::Reset,
                11 => FlagOp::Replace,
                _ => FlagOp::Set,
            };
            UserEvent::PeerFlags(PeerFlagsChange {
                op,
                peer_id: int_field(code, fields, 0, "peer_id")?,
                mask: int_field(code, fields, 1, "mask")?,
            })
        }
        13 | 14 => {
            let action = PeerAction {
                peer_id: int_field(code, fields, 0, "peer_id")?,
                local_id: int_field(code, fields, 1, "local_id")?,
            };
            if code == 13 {
                UserEvent::MessagesDeleted(action)
            } else {
                UserEvent::MessagesRestored(action)
            }
        }
        20 | 21 => {
            let change = SortIdChange {
                peer_id: int_field(code, fields, 0, "peer_id")?,
                id: int_field(code, fields, 1, "id")?,
            };
            if code == 20 {
                UserEvent::MajorIdChanged(change)
            } else {
                UserEvent::MinorIdChanged(change)
            }
        }
        51 => UserEvent::ChatParamsChanged(ChatParamsChange {
            chat_id: int_field(code, fields, 0, "chat_id")?,
            source: int_field(code, fields, 1, "source")?,
        }),
        52 => UserEvent::ChatInfoChanged(ChatInfoChange {
            type_id: int_field(code, fields, 0, "type_id")?,
            peer_id: int_field(code, fields, 1, "peer_id")?,
            info: fields.get(2).cloned().unwrap_or(Value::Null),
        }),
        61 => UserEvent::UserTyping(UserTyping {
            user_id: int_field(code, fields, 0, "user_id")?,
            flags: int_field(code, fields, 1, "flags")?,
        }),
        62 => UserEvent::UserTypingInChat(UserTypingInChat {
            user_id: int_field(code, fields, 0, "user_id")?,
            chat_id: int_field(code, fields, 1, "chat_id")?,
        }),
        63 | 64 => {
            let activity = UsersActivity {
                user_ids: id_list_field(code, fields, 0, "user_ids")?,
                peer_id: int_field(code, fields, 1, "peer_id")?,
                total_count: int_field(code, fields, 2, "total_count")?,
                timestamp: int_field(code, fields, 3, "timestamp")?,
            };
            if code == 63 {
                UserEvent::UsersTyping(activity)
            } else {
                UserEvent::UsersRecordingAudio(activity)
            }
        }
        70 => UserEvent::Call(Call {
            user_id: int_field(code, fields, 0, "user_id")?,
            call_id: int_field(code, fields, 1, "call_id")?,
        }),
        80 => UserEvent::CounterUpdate { count: int_field(code, fields, 0, "count")? },
        114 => UserEvent::NotificationSettingsChanged(NotificationSettings {
            peer_id: int_field(code, fields, 0, "peer_id")?,
            sound: int_field(code, fields, 1, "sound")?,
            disabled_until: int_field(code, fields, 2, "disabled_until")?,
        }),
        _ => UserEvent::Unknown {
            code,
            description: format!("unknown event (code {code})"),
            fields: fields.to_vec(),
        },
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presence_event_strips_sign_and_derives_online() {
        let event = decode_user_update(&json!([8, -123_456, 129, 1_700_000_000])).unwrap();
        let UserEvent::UserOnline(online) = &event else {
            panic!("expected UserOnline, got {event:?}");
        };
        assert_eq!(online.user_id, 123_456);
        assert!(online.is_online());
        assert_eq!(online.platform_id(), 129);
        assert_eq!(event.code(), 8);
    }

    #[test]
    fn offline_timeout_flag() {
        let event = decode_user_update(&json!([9, -7, 1, 1_700_000_000])).unwrap();
        let UserEvent::UserOffline(offline) = event else { panic!() };
        assert_eq!(offline.user_id, 7);
        assert!(offline.is_timeout());
    }

    #[test]
    fn unknown_code_never_fails() {
        let event = decode_user_update(&json!([999, "x"])).unwrap();
        let UserEvent::Unknown { code, description, fields } = &event else {
            panic!("expected Unknown, got {event:?}");
        };
        assert_eq!(*code, 999);
        assert!(description.contains("999"));
        assert_eq!(fields, &vec![json!("x")]);
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = decode_user_update(&json!([])).unwrap_err();
        assert!(matches!(err, DecodeError::EmptyUpdate));
    }

    #[test]
    fn malformed_shapes_are_invalid_payloads() {
        assert!(matches!(
            decode_user_update(&json!({"failed": 1})).unwrap_err(),
            DecodeError::InvalidPayload(_)
        ));
        assert!(matches!(
            decode_user_update(&json!(["4", 1, 2, 3])).unwrap_err(),
            DecodeError::InvalidPayload(_)
        ));
        let err = decode_user_update(&json!([4, 100])).unwrap_err();
        let DecodeError::InvalidPayload(msg) = err else { panic!() };
        assert!(msg.contains("flags"), "got: {msg}");
    }

    #[test]
    fn new_message_layout() {
        let event =
            decode_user_update(&json!([4, 100, 1, 2_000_000_001i64, 1_700_000_000, "hi"])).unwrap();
        let UserEvent::NewMessage(msg) = &event else { panic!() };
        assert_eq!(msg.message_id, 100);
        assert_eq!(msg.peer_id, 2_000_000_001);
        assert_eq!(msg.extra.len(), 2);
        assert!(msg.flags().contains(MessageFlags::UNREAD));
        assert_eq!(event.preload_message_id(), Some(100));
    }

    #[test]
    fn message_edit_layout() {
        let event =
            decode_user_update(&json!([5, 10, 0, 123, 1_700_000_000, "edited", {}])).unwrap();
        let UserEvent::MessageEdit(edit) = &event else { panic!() };
        assert_eq!(edit.new_text, "edited");
        assert_eq!(edit.attachments, json!({}));
        assert_eq!(event.preload_message_id(), Some(10));
    }

    #[test]
    fn flag_op_mapping_differs_between_message_and_peer_codes() {
        let UserEvent::MessageFlags(m) = decode_user_update(&json!([2, 99, 8])).unwrap() else {
            panic!()
        };
        assert_eq!(m.op, FlagOp::Set);
        assert!(m.flags().contains(MessageFlags::IMPORTANT));

        let UserEvent::PeerFlags(p) = decode_user_update(&json!([10, 7, 1])).unwrap() else {
            panic!()
        };
        assert_eq!(p.op, FlagOp::Reset);
        assert_eq!(p.peer_id, 7);
    }

    #[test]
    fn read_marker_direction() {
        let UserEvent::MessagesRead(marker) = decode_user_update(&json!([6, 123, 50])).unwrap()
        else {
            panic!()
        };
        assert_eq!(marker.direction, ReadDirection::Incoming);
        assert_eq!(marker.local_id, 50);
    }

    #[test]
    fn users_activity_list() {
        let event =
            decode_user_update(&json!([63, [1, 2], 2_000_000_001i64, 2, 1_700_000_000])).unwrap();
        let UserEvent::UsersTyping(activity) = event else { panic!() };
        assert_eq!(activity.user_ids, vec![1, 2]);
        assert_eq!(activity.total_count, 2);
    }

    #[test]
    fn notification_settings_tri_state() {
        let UserEvent::NotificationSettingsChanged(muted) =
            decode_user_update(&json!([114, 5, 1, -1])).unwrap()
        else {
            panic!()
        };
        assert!(muted.sound_enabled());
        assert!(muted.disabled_forever());
        assert!(!muted.enabled());

        let UserEvent::NotificationSettingsChanged(open) =
            decode_user_update(&json!([114, 5, 0, 0])).unwrap()
        else {
            panic!()
        };
        assert!(!open.sound_enabled());
        assert!(open.enabled());
    }

    #[test]
    fn preload_attachment_targets_message_codes_only() {
        let mut msg = decode_user_update(&json!([4, 1, 0, 5])).unwrap();
        msg.attach_message(json!({"id": 1, "text": "full"}));
        assert_eq!(msg.message().unwrap()["text"], "full");

        let mut marker = decode_user_update(&json!([6, 5, 1])).unwrap();
        marker.attach_message(json!({"id": 1}));
        assert!(marker.message().is_none());
    }
}
