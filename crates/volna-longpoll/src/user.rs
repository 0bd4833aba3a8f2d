//! User-account long-poll sessions.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use bitflags::bitflags;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use volna_core::event::{UserEvent, decode_user_update};
use volna_core::transport::BoxedTransport;

use crate::error::{PollError, PollResult};
use crate::state::{
    DEFAULT_WAIT_SECS, LongPollFailure, POLL_TIMEOUT_MARGIN_SECS, PollOutcome, PollState,
    interpret_poll_response, parse_acquire_response,
};

bitflags! {
    /// Options of the user long-poll `mode` request parameter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LongPollMode: u32 {
        /// Deliver attachments with new messages.
        const ATTACHMENTS = 2;
        /// Deliver the extended event set.
        const EXTENDED_EVENTS = 8;
        /// Return `pts` for history catch-up.
        const PTS = 32;
        /// Deliver extra presence data with online events.
        const EXTRA_ONLINE = 64;
        /// Deliver `random_id` with new messages.
        const RANDOM_ID = 128;
    }
}

impl Default for LongPollMode {
    fn default() -> Self {
        Self::all()
    }
}

/// A long-poll session against a user account's event stream.
///
/// The array-shaped counterpart of [`BotPollSession`](crate::BotPollSession):
/// same state machine and failure recovery, but a different acquisition
/// method, an extra `mode` bitmask on the wire and optional enrichment of
/// message events with full bodies.
///
/// ```rust,ignore
/// let mut session = UserPollSession::new(transport)
///     .mode(LongPollMode::ATTACHMENTS | LongPollMode::PTS)
///     .preload_messages(true);
/// session.acquire_server(false).await?;
/// let events = session.poll_once().await?;
/// ```
pub struct UserPollSession {
    transport: BoxedTransport,
    mode: LongPollMode,
    wait: u64,
    preload_messages: bool,
    group_id: Option<i64>,
    state: Option<PollState>,
}

impl UserPollSession {
    /// Creates a session with the full default `mode` mask.
    pub fn new(transport: BoxedTransport) -> Self {
        Self {
            transport,
            mode: LongPollMode::default(),
            wait: DEFAULT_WAIT_SECS,
            preload_messages: false,
            group_id: None,
            state: None,
        }
    }

    /// Replaces the `mode` bitmask sent with acquisition and every poll.
    pub fn mode(mut self, mode: LongPollMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets how long the server holds each poll open, in seconds.
    pub fn wait(mut self, seconds: u64) -> Self {
        self.wait = seconds;
        self
    }

    /// Enables fetching full message bodies for each batch.
    pub fn preload_messages(mut self, enabled: bool) -> Self {
        self.preload_messages = enabled;
        self
    }

    /// Scopes the session to a community the user manages.
    pub fn group_id(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Current server/key/cursor state, once acquired.
    pub fn state(&self) -> Option<&PollState> {
        self.state.as_ref()
    }

    /// Acquires (or refreshes) the poll server and access key.
    pub async fn acquire_server(&mut self, preserve_cursor: bool) -> PollResult<()> {
        let mut params = json!({
            "lp_version": 3,
            "need_pts": 1,
            "mode": self.mode.bits(),
        });
        if let Some(group_id) = self.group_id
            && let Some(map) = params.as_object_mut()
        {
            map.insert("group_id".into(), json!(group_id));
        }
        let body = self.transport.call("messages.getLongPollServer", params).await?;
        let acquired = parse_acquire_response(&body)?;

        let (ts, pts) = match self.state.take() {
            Some(previous) if preserve_cursor => (previous.ts, previous.pts),
            _ => (acquired.ts, acquired.pts),
        };
        self.state = Some(PollState { server: acquired.server, key: acquired.key, ts, pts });
        info!("user long-poll server acquired");
        Ok(())
    }

    /// Runs one poll cycle and returns the decoded batch.
    ///
    /// The user endpoint hands out its server without a scheme, so the
    /// poll URL is `https://{server}`. Failure codes 1–3 are repaired in
    /// place and yield an empty batch.
    pub async fn poll_once(&mut self) -> PollResult<Vec<UserEvent>> {
        let (url, params) = {
            let state = self.state.as_ref().ok_or(PollError::NotInitialized)?;
            let params = json!({
                "act": "a_check",
                "key": state.key,
                "ts": state.ts,
                "wait": self.wait,
                "mode": self.mode.bits(),
                "version": 3,
            });
            (format!("https://{}", state.server), params)
        };
        let timeout = Duration::from_secs(self.wait + POLL_TIMEOUT_MARGIN_SECS);
        let body = self.transport.poll(&url, params, timeout).await?;

        match interpret_poll_response(&body)? {
            PollOutcome::Batch { ts, pts, updates } => {
                if let Some(state) = self.state.as_mut() {
                    state.ts = ts;
                    if pts.is_some() {
                        state.pts = pts;
                    }
                }
                let mut events = self.decode_batch(&updates);
                if self.preload_messages {
                    self.preload(&mut events).await;
                }
                Ok(events)
            }
            PollOutcome::Failure(LongPollFailure::HistoryOutdated(ts)) => {
                debug!("cursor outdated, adopting server ts");
                if let Some(state) = self.state.as_mut() {
                    state.ts = ts;
                }
                Ok(Vec::new())
            }
            PollOutcome::Failure(LongPollFailure::KeyExpired) => {
                debug!("user long-poll key expired, refreshing");
                self.acquire_server(true).await?;
                Ok(Vec::new())
            }
            PollOutcome::Failure(LongPollFailure::InformationLost) => {
                warn!("user long-poll state lost, full re-acquisition");
                self.acquire_server(false).await?;
                Ok(Vec::new())
            }
        }
    }

    fn decode_batch(&self, updates: &[Value]) -> Vec<UserEvent> {
        let mut events = Vec::with_capacity(updates.len());
        for raw in updates {
            match decode_user_update(raw) {
                Ok(event) => events.push(event),
                Err(err) => warn!(error = %err, "skipping undecodable update"),
            }
        }
        events
    }

    /// Fills the message slot of message-bearing events with full bodies.
    ///
    /// One `messages.getById` call per batch, ids deduplicated; every
    /// event referencing an id receives its own copy of the body. A failed
    /// call leaves the batch unenriched instead of failing the poll.
    async fn preload(&self, events: &mut [UserEvent]) {
        let ids: BTreeSet<i64> =
            events.iter().filter_map(UserEvent::preload_message_id).collect();
        if ids.is_empty() {
            return;
        }
        let joined = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        let body = match self
            .transport
            .call("messages.getById", json!({"message_ids": joined}))
            .await
        {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "message preload failed, batch stays unenriched");
                return;
            }
        };
        let Some(items) = body.pointer("/response/items").and_then(Value::as_array) else {
            warn!("message preload response carries no items");
            return;
        };
        let by_id: HashMap<i64, &Value> = items
            .iter()
            .filter_map(|item| item.get("id").and_then(Value::as_i64).map(|id| (id, item)))
            .collect();
        for event in events.iter_mut() {
            if let Some(id) = event.preload_message_id()
                && let Some(message) = by_id.get(&id)
            {
                event.attach_message((*message).clone());
            }
        }
    }
}
