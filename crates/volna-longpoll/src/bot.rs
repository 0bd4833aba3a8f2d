//! Group (bot) long-poll sessions.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use volna_core::event::{GroupEvent, decode_group_update};
use volna_core::transport::BoxedTransport;

use crate::error::{PollError, PollResult};
use crate::state::{
    AcquiredServer, DEFAULT_WAIT_SECS, LongPollFailure, POLL_TIMEOUT_MARGIN_SECS, PollOutcome,
    PollState, interpret_poll_response, parse_acquire_response,
};

/// A long-poll session against a community's event stream.
///
/// Owns the server/key/cursor state and decodes object-shaped updates.
/// `poll_once` takes `&mut self`: exactly one poll is in flight per
/// session, because cursor updates cannot be interleaved.
///
/// ```rust,ignore
/// let mut session = BotPollSession::new(transport, group_id).wait(25);
/// session.acquire_server(false).await?;
/// loop {
///     for event in session.poll_once().await? {
///         // dispatch
///     }
/// }
/// ```
pub struct BotPollSession {
    transport: BoxedTransport,
    group_id: i64,
    wait: u64,
    state: Option<PollState>,
}

impl BotPollSession {
    /// Creates a session for one community. The server is not contacted
    /// until [`acquire_server`](Self::acquire_server).
    pub fn new(transport: BoxedTransport, group_id: i64) -> Self {
        Self { transport, group_id, wait: DEFAULT_WAIT_SECS, state: None }
    }

    /// Sets how long the server holds each poll open, in seconds.
    pub fn wait(mut self, seconds: u64) -> Self {
        self.wait = seconds;
        self
    }

    /// The community this session polls for.
    pub fn group_id(&self) -> i64 {
        self.group_id
    }

    /// Current server/key/cursor state, once acquired.
    pub fn state(&self) -> Option<&PollState> {
        self.state.as_ref()
    }

    /// Acquires (or refreshes) the poll server and access key.
    ///
    /// With `preserve_cursor` an existing `ts`/`pts` pair survives the
    /// refresh; otherwise the server-offered cursor replaces it.
    pub async fn acquire_server(&mut self, preserve_cursor: bool) -> PollResult<()> {
        let body = self
            .transport
            .call(
                "groups.getLongPollServer",
                json!({"group_id": self.group_id, "lp_version": 3, "need_pts": 1}),
            )
            .await?;
        let acquired = parse_acquire_response(&body)?;
        self.adopt(acquired, preserve_cursor);
        info!(group_id = self.group_id, "long-poll server acquired");
        Ok(())
    }

    fn adopt(&mut self, acquired: AcquiredServer, preserve_cursor: bool) {
        let (ts, pts) = match self.state.take() {
            Some(previous) if preserve_cursor => (previous.ts, previous.pts),
            _ => (acquired.ts, acquired.pts),
        };
        self.state = Some(PollState { server: acquired.server, key: acquired.key, ts, pts });
    }

    /// Runs one poll cycle and returns the decoded batch.
    ///
    /// Failure codes 1–3 are repaired in place and yield an empty batch;
    /// transport and protocol errors surface to the caller, who decides
    /// whether to back off and retry the session.
    pub async fn poll_once(&mut self) -> PollResult<Vec<GroupEvent>> {
        let (server, params) = {
            let state = self.state.as_ref().ok_or(PollError::NotInitialized)?;
            let params = json!({
                "act": "a_check",
                "key": state.key,
                "ts": state.ts,
                "wait": self.wait,
            });
            (state.server.clone(), params)
        };
        let timeout = Duration::from_secs(self.wait + POLL_TIMEOUT_MARGIN_SECS);
        let body = self.transport.poll(&server, params, timeout).await?;

        match interpret_poll_response(&body)? {
            PollOutcome::Batch { ts, pts, updates } => {
                if let Some(state) = self.state.as_mut() {
                    state.ts = ts;
                    if pts.is_some() {
                        state.pts = pts;
                    }
                }
                Ok(self.decode_batch(&updates))
            }
            PollOutcome::Failure(LongPollFailure::HistoryOutdated(ts)) => {
                debug!(group_id = self.group_id, "cursor outdated, adopting server ts");
                if let Some(state) = self.state.as_mut() {
                    state.ts = ts;
                }
                Ok(Vec::new())
            }
            PollOutcome::Failure(LongPollFailure::KeyExpired) => {
                debug!(group_id = self.group_id, "long-poll key expired, refreshing");
                self.acquire_server(true).await?;
                Ok(Vec::new())
            }
            PollOutcome::Failure(LongPollFailure::InformationLost) => {
                warn!(group_id = self.group_id, "long-poll state lost, full re-acquisition");
                self.acquire_server(false).await?;
                Ok(Vec::new())
            }
        }
    }

    fn decode_batch(&self, updates: &[Value]) -> Vec<GroupEvent> {
        let mut events = Vec::with_capacity(updates.len());
        for raw in updates {
            match decode_group_update(raw, self.group_id) {
                Ok(event) => events.push(event),
                Err(err) => warn!(error = %err, "skipping undecodable update"),
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use volna_core::error::{TransportError, TransportResult};
    use volna_core::event::UpdateKind;
    use volna_core::transport::VkTransport;

    use super::*;

    #[derive(Default)]
    struct MockTransport {
        calls: Mutex<Vec<(String, Value)>>,
        call_responses: Mutex<VecDeque<Value>>,
        polls: Mutex<Vec<(String, Value, Duration)>>,
        poll_responses: Mutex<VecDeque<Value>>,
    }

    impl MockTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn queue_call(&self, response: Value) {
            self.call_responses.lock().push_back(response);
        }

        fn queue_poll(&self, response: Value) {
            self.poll_responses.lock().push_back(response);
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().clone()
        }

        fn polls(&self) -> Vec<(String, Value, Duration)> {
            self.polls.lock().clone()
        }
    }

    #[async_trait]
    impl VkTransport for MockTransport {
        async fn call(&self, method: &str, params: Value) -> TransportResult<Value> {
            self.calls.lock().push((method.to_owned(), params));
            self.call_responses
                .lock()
                .pop_front()
                .ok_or_else(|| TransportError::Request("no scripted call response".into()))
        }

        async fn poll(
            &self,
            url: &str,
            params: Value,
            timeout: Duration,
        ) -> TransportResult<Value> {
            self.polls.lock().push((url.to_owned(), params, timeout));
            self.poll_responses
                .lock()
                .pop_front()
                .ok_or_else(|| TransportError::Request("no scripted poll response".into()))
        }
    }

    fn acquire_body(server: &str, key: &str, ts: &str) -> Value {
        json!({"response": {"server": server, "key": key, "ts": ts}})
    }

    async fn acquired_session(mock: &Arc<MockTransport>) -> BotPollSession {
        mock.queue_call(acquire_body("https://lp.vk.com/wh1", "key-1", "10"));
        let mut session = BotPollSession::new(mock.clone(), 1);
        session.acquire_server(false).await.unwrap();
        session
    }

    #[tokio::test]
    async fn poll_before_acquire_is_not_initialized() {
        let mut session = BotPollSession::new(MockTransport::new(), 1);
        assert!(matches!(session.poll_once().await, Err(PollError::NotInitialized)));
    }

    #[tokio::test]
    async fn acquire_sends_the_documented_params() {
        let mock = MockTransport::new();
        let session = acquired_session(&mock).await;

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "groups.getLongPollServer");
        assert_eq!(calls[0].1, json!({"group_id": 1, "lp_version": 3, "need_pts": 1}));

        let state = session.state().unwrap();
        assert_eq!(state.server, "https://lp.vk.com/wh1");
        assert_eq!(state.key, "key-1");
        assert_eq!(state.ts, json!("10"));
    }

    #[tokio::test]
    async fn poll_uses_the_server_verbatim_with_a_timeout_margin() {
        let mock = MockTransport::new();
        let mut session = acquired_session(&mock).await;
        mock.queue_poll(json!({"ts": "11", "updates": []}));

        session.poll_once().await.unwrap();

        let polls = mock.polls();
        assert_eq!(polls.len(), 1);
        assert_eq!(polls[0].0, "https://lp.vk.com/wh1");
        assert_eq!(
            polls[0].1,
            json!({"act": "a_check", "key": "key-1", "ts": "10", "wait": 25}),
        );
        assert_eq!(polls[0].2, Duration::from_secs(35));
    }

    #[tokio::test]
    async fn repeated_failed_1_follows_the_server_ts() {
        let mock = MockTransport::new();
        let mut session = acquired_session(&mock).await;

        for ts in ["20", "21"] {
            mock.queue_poll(json!({"failed": 1, "ts": ts}));
            let events = session.poll_once().await.unwrap();
            assert!(events.is_empty());
            let state = session.state().unwrap();
            assert_eq!(state.ts, json!(ts));
            assert_eq!(state.server, "https://lp.vk.com/wh1");
            assert_eq!(state.key, "key-1");
        }
        // no extra acquisition happened
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_2_refreshes_the_key_and_preserves_the_cursor() {
        let mock = MockTransport::new();
        let mut session = acquired_session(&mock).await;

        mock.queue_poll(json!({"failed": 2}));
        mock.queue_call(acquire_body("https://lp.vk.com/wh2", "key-2", "99"));

        let events = session.poll_once().await.unwrap();
        assert!(events.is_empty());
        assert_eq!(mock.calls().len(), 2);

        let state = session.state().unwrap();
        assert_eq!(state.key, "key-2");
        assert_eq!(state.server, "https://lp.vk.com/wh2");
        assert_eq!(state.ts, json!("10"), "cursor must survive a key refresh");
    }

    #[tokio::test]
    async fn failed_3_replaces_the_cursor() {
        let mock = MockTransport::new();
        let mut session = acquired_session(&mock).await;

        mock.queue_poll(json!({"failed": 3}));
        mock.queue_call(acquire_body("https://lp.vk.com/wh3", "key-3", "77"));

        session.poll_once().await.unwrap();
        assert_eq!(mock.calls().len(), 2);

        let state = session.state().unwrap();
        assert_eq!(state.key, "key-3");
        assert_eq!(state.ts, json!("77"), "cursor must come from the new acquisition");
    }

    #[tokio::test]
    async fn unknown_failure_codes_are_protocol_errors() {
        let mock = MockTransport::new();
        let mut session = acquired_session(&mock).await;

        mock.queue_poll(json!({"failed": 9}));
        assert!(matches!(session.poll_once().await, Err(PollError::UnknownFailureCode(9))));

        mock.queue_poll(json!({"ts": "12"}));
        assert!(matches!(session.poll_once().await, Err(PollError::Protocol(_))));
    }

    #[tokio::test]
    async fn a_bad_record_does_not_poison_the_batch() {
        let mock = MockTransport::new();
        let mut session = acquired_session(&mock).await;

        mock.queue_poll(json!({
            "ts": "11",
            "updates": [
                {"type": "message_new", "object": {"message": {"peer_id": 5, "text": "a"}}},
                {"object": {}},
                {"type": "message_typing_state", "object": {"from_id": 2}},
            ],
        }));

        let events = session.poll_once().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, UpdateKind::MessageNew);
        assert_eq!(events[1].kind, UpdateKind::MessageTypingState);
        assert_eq!(session.state().unwrap().ts, json!("11"));
    }

    #[tokio::test]
    async fn transport_errors_surface_untouched() {
        let mock = MockTransport::new();
        let mut session = acquired_session(&mock).await;
        // nothing queued: the mock reports a request failure
        assert!(matches!(
            session.poll_once().await,
            Err(PollError::Transport(TransportError::Request(_)))
        ));
    }
}
