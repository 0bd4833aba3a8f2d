//! Shared cursor state and poll-response interpretation.
//!
//! Both session variants speak the same failure protocol: a poll response
//! either carries a batch (`ts`, optional `pts`, `updates`) or a `failed`
//! code telling the client how much of its state went stale. Codes 1–3
//! are ordered by the repair they demand (cursor only, key only, key and
//! cursor) and are matched as a strict three-way switch so a cursor hiccup
//! is never treated as a full desync.

use serde_json::Value;

use crate::error::{PollError, PollResult};

/// Safety margin added to `wait` for the transport-level poll timeout.
pub(crate) const POLL_TIMEOUT_MARGIN_SECS: u64 = 10;

/// Default long-poll hold time in seconds.
pub const DEFAULT_WAIT_SECS: u64 = 25;

/// Server address, access key, and cursors of one acquired session.
///
/// `ts` and `pts` are opaque JSON scalars: the group endpoint serves `ts`
/// as a string, the user endpoint as a number, and both are echoed back
/// verbatim on the next poll.
#[derive(Debug, Clone)]
pub struct PollState {
    /// Poll endpoint, as handed out by the acquisition call.
    pub server: String,
    /// Session access key.
    pub key: String,
    /// Primary update cursor.
    pub ts: Value,
    /// Secondary message-scoped cursor, when the server offers one.
    pub pts: Option<Value>,
}

// =============================================================================
// Acquisition parsing
// =============================================================================

/// Fields of a successful acquisition response.
#[derive(Debug)]
pub(crate) struct AcquiredServer {
    pub server: String,
    pub key: String,
    pub ts: Value,
    pub pts: Option<Value>,
}

/// Extracts `{response: {key, server, ts, pts?}}` from an acquisition body.
pub(crate) fn parse_acquire_response(body: &Value) -> PollResult<AcquiredServer> {
    let response = body
        .get("response")
        .ok_or_else(|| PollError::ServerAcquisition(format!("no usable response body: {body}")))?;
    let key = response
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| PollError::ServerAcquisition("response is missing `key`".into()))?;
    let server = response
        .get("server")
        .and_then(Value::as_str)
        .ok_or_else(|| PollError::ServerAcquisition("response is missing `server`".into()))?;
    let ts = response
        .get("ts")
        .cloned()
        .ok_or_else(|| PollError::ServerAcquisition("response is missing `ts`".into()))?;
    Ok(AcquiredServer {
        server: server.to_owned(),
        key: key.to_owned(),
        ts,
        pts: response.get("pts").cloned(),
    })
}

// =============================================================================
// Poll-response interpretation
// =============================================================================

/// A recoverable failure signaled by the server.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LongPollFailure {
    /// Code 1: the cursor fell behind; adopt the ts the server sent along.
    HistoryOutdated(Value),
    /// Code 2: the access key expired; re-acquire, cursor untouched.
    KeyExpired,
    /// Code 3: full desync; re-acquire key, server, and cursor.
    InformationLost,
}

/// A poll response after interpretation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PollOutcome {
    /// Successful cycle: new cursors plus the raw update batch.
    Batch {
        ts: Value,
        pts: Option<Value>,
        updates: Vec<Value>,
    },
    /// Recoverable failure for the session to repair.
    Failure(LongPollFailure),
}

/// Interprets one poll response body.
///
/// Unknown failure codes and success bodies missing `ts` or `updates` are
/// protocol errors; the caller decides whether to restart the session.
pub(crate) fn interpret_poll_response(body: &Value) -> PollResult<PollOutcome> {
    if let Some(failed) = body.get("failed") {
        let code = failed
            .as_i64()
            .ok_or_else(|| PollError::protocol(format!("non-numeric failure code: {failed}")))?;
        return match code {
            1 => {
                let ts = body
                    .get("ts")
                    .cloned()
                    .ok_or_else(|| PollError::protocol("failed=1 response without ts"))?;
                Ok(PollOutcome::Failure(LongPollFailure::HistoryOutdated(ts)))
            }
            2 => Ok(PollOutcome::Failure(LongPollFailure::KeyExpired)),
            3 => Ok(PollOutcome::Failure(LongPollFailure::InformationLost)),
            other => Err(PollError::UnknownFailureCode(other)),
        };
    }

    let ts = body
        .get("ts")
        .cloned()
        .ok_or_else(|| PollError::protocol("success response without ts"))?;
    let updates = body
        .get("updates")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| PollError::protocol("success response without updates"))?;
    Ok(PollOutcome::Batch { ts, pts: body.get("pts").cloned(), updates })
}
