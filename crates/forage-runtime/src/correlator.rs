//! Reply correlation: turns inbound game-bot replies into statistics.
//!
//! A reply counts only when it comes from the configured game-bot identity,
//! in the session's own channel, and references a message this session sent.
//! Anything that cannot be resolved is a correlation miss and is dropped
//! silently — misses are expected noise, not errors.

use std::sync::Arc;

use forage_core::mask_secret;
use forage_store::StatsStore;
use tokio::sync::{mpsc, watch};

use crate::connection::{Connection, InboundMessage};

pub(crate) struct CorrelatorContext {
    pub credential: String,
    pub channel_id: String,
    pub own_user_id: String,
    pub game_bot_id: String,
    pub connection: Arc<dyn Connection>,
    pub stats: Arc<StatsStore>,
}

pub(crate) async fn run_reply_correlator(
    context: CorrelatorContext,
    mut events: mpsc::Receiver<InboundMessage>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let account = mask_secret(&context.credential);
    loop {
        let message = tokio::select! {
            changed = cancel_rx.changed() => {
                if changed.is_err() || *cancel_rx.borrow() {
                    break;
                }
                continue;
            }
            received = events.recv() => match received {
                Some(message) => message,
                None => break,
            },
        };
        handle_inbound_message(&context, &account, message).await;
    }
    tracing::debug!(account = %account, "reply correlator terminated");
}

async fn handle_inbound_message(
    context: &CorrelatorContext,
    account: &str,
    message: InboundMessage,
) {
    if message.author_id != context.game_bot_id {
        return;
    }
    if message.channel_id != context.channel_id {
        return;
    }
    let Some(referenced_id) = message.replied_to_message_id.as_deref() else {
        return;
    };

    let referenced = match context
        .connection
        .fetch_message(&message.channel_id, referenced_id)
        .await
    {
        Ok(Some(found)) => found,
        Ok(None) => {
            tracing::debug!(account = %account, "referenced message not found; reply dropped");
            return;
        }
        Err(error) => {
            tracing::debug!(account = %account, %error, "referenced message fetch failed; reply dropped");
            return;
        }
    };
    if referenced.author_id != context.own_user_id {
        return;
    }

    let text = assemble_reply_text(&message);
    if let Err(error) = context.stats.apply_reply(&context.credential, &text) {
        tracing::warn!(account = %account, %error, "failed to apply reply to statistics");
    }
}

/// Joins the message body with every embed's description and field text,
/// in delivery order, so the parser sees one flat reply.
pub(crate) fn assemble_reply_text(message: &InboundMessage) -> String {
    let mut text = message.body.clone();
    for embed in &message.embeds {
        if !embed.description.is_empty() {
            text.push(' ');
            text.push_str(&embed.description);
        }
        for field in &embed.fields {
            text.push(' ');
            text.push_str(&field.name);
            text.push(' ');
            text.push_str(&field.value);
        }
    }
    text
}
