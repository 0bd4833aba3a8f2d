//! # Volna Long-Poll
//!
//! Poll sessions against the platform's two long-poll endpoints.
//!
//! A session owns the `server`/`key`/`ts` state handed out at acquisition
//! and repairs it in place when the server reports staleness:
//!
//! | `failed` | meaning | repair |
//! |----------|---------|--------|
//! | 1 | cursor outdated | adopt the server's `ts` |
//! | 2 | key expired | re-acquire, keep the cursor |
//! | 3 | state lost | re-acquire, replace the cursor |
//!
//! Anything else is a protocol error and surfaces to the caller. Both
//! variants poll with a transport timeout of `wait + 10` seconds so the
//! server side, not the socket, ends an idle cycle.
//!
//! - [`BotPollSession`]: community stream, object-shaped updates.
//! - [`UserPollSession`]: personal stream, array-shaped updates, optional
//!   message preload.

pub mod bot;
pub mod error;
pub mod state;
pub mod user;

pub use bot::BotPollSession;
pub use error::{PollError, PollResult};
pub use state::{DEFAULT_WAIT_SECS, PollState};
pub use user::{LongPollMode, UserPollSession};
