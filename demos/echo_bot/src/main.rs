//! Echo Bot Example
//!
//! A small community bot that answers a few slash commands and echoes
//! everything else back, built on the volna router tree.
//!
//! # Dispatch Layout
//!
//! The root router carries the specific commands; two child routers are
//! attached behind it, so the catch-all echo only sees what nothing else
//! claimed:
//!
//! ```text
//! root ──▶ /ping, /help
//!  ├── chat ──▶ /here        (root filter: multi-user chats only)
//!  └── echo ──▶ any text
//! ```
//!
//! Entries are matched in registration order and the first accepting one
//! wins, so `/ping` never reaches the echo handler.
//!
//! # Configuration
//!
//! Drop a `volna.toml` next to the binary:
//!
//! ```toml
//! [api]
//! token = "your-community-token"
//!
//! [longpoll]
//! group_id = 123456789
//! ```
//!
//! or use environment variables (`VOLNA_API__TOKEN`,
//! `VOLNA_LONGPOLL__GROUP_ID`).
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use volna::prelude::*;

const HELP_TEXT: &str = "commands:\n\
    /ping - liveness check\n\
    /help - this message\n\
    /here - chat info (chats only)\n\
    anything else is echoed back";

// ============================================================================
// Handler Functions
// ============================================================================

/// Replies with a fixed liveness answer.
async fn ping_handler(event: Arc<Event>) -> Result<()> {
    if let Event::Group(group) = event.as_ref() {
        group.answer("pong").await?;
    }
    Ok(())
}

/// Lists the commands this bot understands.
async fn help_handler(event: Arc<Event>) -> Result<()> {
    if let Event::Group(group) = event.as_ref() {
        group.answer(HELP_TEXT).await?;
    }
    Ok(())
}

/// Tells a multi-user chat which conversation it is.
async fn here_handler(event: Arc<Event>) -> Result<()> {
    if let Event::Group(group) = event.as_ref()
        && let Some(chat_id) = group.chat_id()
    {
        group.answer(&format!("this is chat #{chat_id}")).await?;
    }
    Ok(())
}

/// Echoes the message text back into the conversation.
async fn echo_handler(event: Arc<Event>) -> Result<()> {
    if let Event::Group(group) = event.as_ref()
        && let Some(text) = group.text()
    {
        group.answer(text).await?;
    }
    Ok(())
}

/// Root filter that logs every message without gating anything.
fn log_message(event: &Event, _context: &Context) -> bool {
    if let Event::Group(group) = event {
        info!(
            peer_id = ?group.peer_id,
            text = group.text().unwrap_or_default(),
            "message received"
        );
    }
    true
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config = volna::runtime::load_config()?;
    volna::runtime::init_from_config(&config.logging);

    let transport: BoxedTransport = Arc::new(config.api.build_transport()?);
    let session = config.longpoll.bot_session(Arc::clone(&transport));

    let root = Router::named("root");
    root.startup().register(|| async {
        info!("echo bot starting");
    });
    root.shutdown().register(|| async {
        info!("echo bot stopping");
    });

    root.message().root_filter(filter_fn(log_message));
    root.message().register(
        HandlerEntry::new(ping_handler).filter(field("object.message.text").eq("/ping")),
    );
    root.message().register(
        HandlerEntry::new(help_handler).filter(field("object.message.text").eq("/help")),
    );

    let chat = Router::named("chat");
    chat.message().root_filter(filter_fn(|event: &Event, _: &Context| {
        matches!(event, Event::Group(group) if group.from_chat())
    }));
    chat.message().register(
        HandlerEntry::new(here_handler).filter(field("object.message.text").eq("/here")),
    );

    let echo = Router::named("echo");
    echo.message().register(
        HandlerEntry::new(echo_handler).filter(field("object.message.text").exists()),
    );

    root.include_routers(&[chat, echo])?;

    Dispatcher::new(root, transport)
        .retry_delay(Duration::from_secs(config.longpoll.poll_retry_delay_secs))
        .run_polling(session)
        .await?;

    Ok(())
}
