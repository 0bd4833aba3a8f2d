//! Object-shaped group updates.
//!
//! The group long-poll endpoint delivers updates as
//! `{type, object, group_id}`. Decoding resolves the category tag against
//! [`UpdateKind`], maps the payload onto a structural type (unrecognized
//! keys are retained in a residual map, never rejected) and, for
//! message-bearing categories, classifies the audience from the peer id
//! right away.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::{DecodeError, DecodeResult, TransportResult};
use crate::event::kind::UpdateKind;
use crate::transport::BoxedTransport;

/// First peer id of the multi-user chat range.
///
/// Peer ids below zero address communities, ids in `0..CHAT_START_ID`
/// address single users, and everything from here up addresses a chat
/// whose number is `peer_id - CHAT_START_ID`.
pub const CHAT_START_ID: i64 = 2_000_000_000;

// =============================================================================
// Audience classification
// =============================================================================

/// Where a message-bearing update originated, derived from its peer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    /// Dialog with a community (negative peer id).
    Community,
    /// Dialog with a single user.
    User,
    /// Multi-user chat; `chat_id` is the in-range chat number.
    Chat {
        /// Chat number, `peer_id - CHAT_START_ID`.
        chat_id: i64,
    },
}

impl MessageSource {
    /// Classifies a numeric peer id into its audience range.
    pub fn classify(peer_id: i64) -> Self {
        if peer_id < 0 {
            Self::Community
        } else if peer_id < CHAT_START_ID {
            Self::User
        } else {
            Self::Chat { chat_id: peer_id - CHAT_START_ID }
        }
    }
}

// =============================================================================
// Payload structure
// =============================================================================

/// Message body as delivered inside message-bearing updates.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageBody {
    /// Message id.
    #[serde(default)]
    pub id: Option<i64>,
    /// Conversation peer id.
    #[serde(default)]
    pub peer_id: Option<i64>,
    /// Author id.
    #[serde(default)]
    pub from_id: Option<i64>,
    /// Unix timestamp of the message.
    #[serde(default)]
    pub date: Option<i64>,
    /// Id of the message within its conversation.
    #[serde(default)]
    pub conversation_message_id: Option<i64>,
    /// Client-chosen deduplication id.
    #[serde(default)]
    pub random_id: Option<i64>,
    /// Message text.
    #[serde(default)]
    pub text: Option<String>,
    /// Bot payload attached to the message, if any.
    #[serde(default)]
    pub payload: Option<String>,
    /// Keys this structure does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Capabilities of the client the update originated from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientInfo {
    /// Button action types the client supports.
    #[serde(default)]
    pub button_actions: Vec<String>,
    /// Whether the client renders keyboards.
    #[serde(default)]
    pub keyboard: bool,
    /// Whether the client renders inline keyboards.
    #[serde(default)]
    pub inline_keyboard: bool,
    /// Whether the client renders carousels.
    #[serde(default)]
    pub carousel: bool,
    /// Client language id.
    #[serde(default)]
    pub lang_id: Option<i64>,
    /// Keys this structure does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `object` payload of a group update.
///
/// New-message updates nest the body under `message` next to
/// `client_info`; reply and edit updates deliver the body fields at the
/// top level. Both shapes are modeled here, and anything else lands in
/// `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventObject {
    /// Nested message body (new-message shape).
    #[serde(default)]
    pub message: Option<MessageBody>,
    /// Client capabilities (new-message shape).
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
    /// Conversation peer id (reply/edit shape, callback events).
    #[serde(default)]
    pub peer_id: Option<i64>,
    /// Author id (reply/edit shape).
    #[serde(default)]
    pub from_id: Option<i64>,
    /// Acting user id (callback and membership events).
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Message text (reply/edit shape).
    #[serde(default)]
    pub text: Option<String>,
    /// Callback event id (`message_event` updates).
    #[serde(default)]
    pub event_id: Option<String>,
    /// Callback payload (`message_event` updates).
    #[serde(default)]
    pub payload: Option<Value>,
    /// Keys this structure does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// GroupEvent
// =============================================================================

/// One decoded object-shaped update.
#[derive(Clone)]
pub struct GroupEvent {
    /// Category tag.
    pub kind: UpdateKind,
    /// Structural payload.
    pub object: EventObject,
    /// Community the update belongs to.
    pub group_id: i64,
    /// Conversation peer id, resolved across both payload shapes.
    pub peer_id: Option<i64>,
    /// Audience classification, present for message-bearing categories.
    pub source: Option<MessageSource>,
    raw: Value,
    transport: Option<BoxedTransport>,
}

impl GroupEvent {
    /// The update as received, before decoding.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The message body, regardless of which payload shape carried it.
    pub fn message(&self) -> Option<&MessageBody> {
        self.object.message.as_ref()
    }

    /// Message text across both payload shapes.
    pub fn text(&self) -> Option<&str> {
        self.object
            .text
            .as_deref()
            .or_else(|| self.object.message.as_ref().and_then(|m| m.text.as_deref()))
    }

    /// Whether the message came from a single user.
    pub fn from_user(&self) -> bool {
        matches!(self.source, Some(MessageSource::User))
    }

    /// Whether the message came from a multi-user chat.
    pub fn from_chat(&self) -> bool {
        matches!(self.source, Some(MessageSource::Chat { .. }))
    }

    /// Whether the message came from a community.
    pub fn from_group(&self) -> bool {
        matches!(self.source, Some(MessageSource::Community))
    }

    /// Chat number for multi-user chat messages.
    pub fn chat_id(&self) -> Option<i64> {
        match self.source {
            Some(MessageSource::Chat { chat_id }) => Some(chat_id),
            _ => None,
        }
    }

    /// Injects the transport handle used by [`GroupEvent::answer`].
    ///
    /// The dispatch loop calls this for every event before propagation.
    pub fn attach_transport(&mut self, transport: BoxedTransport) {
        self.transport = Some(transport);
    }

    /// Whether a transport handle has been attached.
    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Sends a plain-text reply into the conversation this event came from.
    pub async fn answer(&self, text: &str) -> TransportResult<Value> {
        let transport = self.transport.as_ref().ok_or_else(|| {
            crate::error::TransportError::InvalidConfig(
                "event has no transport handle attached".into(),
            )
        })?;
        let peer_id = self.peer_id.ok_or_else(|| {
            crate::error::TransportError::InvalidConfig(
                "event carries no conversation peer id".into(),
            )
        })?;
        transport
            .call(
                "messages.send",
                json!({
                    "group_id": self.group_id,
                    "peer_id": peer_id,
                    "message": text,
                    "random_id": 0,
                }),
            )
            .await
    }
}

impl fmt::Debug for GroupEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupEvent")
            .field("kind", &self.kind)
            .field("group_id", &self.group_id)
            .field("peer_id", &self.peer_id)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decodes one object-shaped update.
///
/// `group_scope` is the session's community id, used when the update does
/// not carry its own `group_id`.
pub fn decode_group_update(raw: &Value, group_scope: i64) -> DecodeResult<GroupEvent> {
    let kind = raw
        .get("type")
        .and_then(Value::as_str)
        .map(UpdateKind::from)
        .ok_or_else(|| DecodeError::invalid("group update has no `type` tag"))?;

    let object_value = raw
        .get("object")
        .ok_or_else(|| DecodeError::invalid(format!("`{kind}` update has no `object` payload")))?;
    let object: EventObject = serde_json::from_value(object_value.clone())
        .map_err(|err| DecodeError::invalid(format!("`{kind}` payload: {err}")))?;

    let group_id = raw.get("group_id").and_then(Value::as_i64).unwrap_or(group_scope);

    let peer_id = object
        .peer_id
        .or_else(|| object.message.as_ref().and_then(|m| m.peer_id));
    let source = if kind.is_message() { peer_id.map(MessageSource::classify) } else { None };

    Ok(GroupEvent {
        kind,
        object,
        group_id,
        peer_id,
        source,
        raw: raw.clone(),
        transport: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_chat_peer_under_group_scope() {
        let raw = json!({
            "type": "message_new",
            "object": { "message": { "peer_id": 2_000_000_005i64, "text": "hi" } },
        });
        let event = decode_group_update(&raw, 1).unwrap();

        assert_eq!(event.kind, UpdateKind::MessageNew);
        assert_eq!(event.group_id, 1);
        assert!(event.from_chat());
        assert!(!event.from_user());
        assert_eq!(event.chat_id(), Some(5));
        assert_eq!(event.text(), Some("hi"));
    }

    #[test]
    fn classifies_user_and_community_peers() {
        assert_eq!(MessageSource::classify(53_083_705), MessageSource::User);
        assert_eq!(MessageSource::classify(-184_575), MessageSource::Community);
        assert_eq!(
            MessageSource::classify(CHAT_START_ID),
            MessageSource::Chat { chat_id: 0 }
        );
    }

    #[test]
    fn reply_shape_carries_fields_at_top_level() {
        let raw = json!({
            "type": "message_reply",
            "object": { "id": 77, "peer_id": 42, "from_id": -1, "text": "done" },
            "group_id": 9,
        });
        let event = decode_group_update(&raw, 1).unwrap();

        assert_eq!(event.group_id, 9);
        assert_eq!(event.peer_id, Some(42));
        assert!(event.from_user());
        assert!(event.message().is_none());
        assert_eq!(event.text(), Some("done"));
    }

    #[test]
    fn unknown_category_is_kept_with_residual_payload() {
        let raw = json!({
            "type": "donut_subscription_create",
            "object": { "amount": 50, "user_id": 7 },
        });
        let event = decode_group_update(&raw, 3).unwrap();

        assert_eq!(event.kind, UpdateKind::Unknown("donut_subscription_create".into()));
        assert!(event.source.is_none());
        assert_eq!(event.object.user_id, Some(7));
        assert_eq!(event.object.extra.get("amount"), Some(&json!(50)));
    }

    #[test]
    fn missing_object_is_an_invalid_payload() {
        let raw = json!({ "type": "message_new" });
        let err = decode_group_update(&raw, 1).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidPayload(_)));
    }

    #[test]
    fn callback_event_is_not_classified() {
        let raw = json!({
            "type": "message_event",
            "object": { "user_id": 5, "peer_id": 5, "event_id": "ab12", "payload": {"cmd": "ok"} },
        });
        let event = decode_group_update(&raw, 1).unwrap();
        assert_eq!(event.kind, UpdateKind::MessageEvent);
        assert_eq!(event.peer_id, Some(5));
        assert!(event.source.is_none());
        assert_eq!(event.object.event_id.as_deref(), Some("ab12"));
    }
}
