//! Repeating command-cycle task, one per live session.
//!
//! Each pass emits the configured command sequence in order, waiting the
//! inter-command delay between emissions, then parks for the inter-cycle
//! delay before the next pass. Send failures are isolated per command; the
//! loop only terminates when the session is cancelled or the connection
//! stops reporting ready, and it does so silently — no terminal signal
//! beyond ceasing to reschedule.

use std::sync::Arc;
use std::time::Duration;

use forage_core::mask_secret;
use forage_store::StatsStore;
use tokio::sync::watch;

use crate::command_log::CommandLog;
use crate::connection::Connection;

/// Default automation sequence issued each cycle.
pub const DEFAULT_COMMAND_SEQUENCE: [&str; 4] = ["pls beg", "pls hunt", "pls dig", "pls bal"];
pub const DEFAULT_COMMAND_INTERVAL: Duration = Duration::from_millis(3_000);
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(45_000);

#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub commands: Vec<String>,
    pub command_interval: Duration,
    pub cycle_interval: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            commands: DEFAULT_COMMAND_SEQUENCE
                .iter()
                .map(|command| command.to_string())
                .collect(),
            command_interval: DEFAULT_COMMAND_INTERVAL,
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
        }
    }
}

pub(crate) struct CycleContext {
    pub credential: String,
    pub channel_id: String,
    pub connection: Arc<dyn Connection>,
    pub stats: Arc<StatsStore>,
    pub command_log: CommandLog,
    pub config: CycleConfig,
}

pub(crate) async fn run_command_cycle(
    context: CycleContext,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let account = mask_secret(&context.credential);
    'cycles: loop {
        if *cancel_rx.borrow() || !context.connection.is_ready() {
            break;
        }

        for (index, command) in context.config.commands.iter().enumerate() {
            if index > 0
                && !sleep_unless_cancelled(context.config.command_interval, &mut cancel_rx).await
            {
                break 'cycles;
            }
            if *cancel_rx.borrow() || !context.connection.is_ready() {
                break 'cycles;
            }
            dispatch_command(&context, &account, command).await;
        }

        if !sleep_unless_cancelled(context.config.cycle_interval, &mut cancel_rx).await {
            break;
        }
    }
    tracing::debug!(account = %account, "command cycle terminated");
}

async fn dispatch_command(context: &CycleContext, account: &str, command: &str) {
    if let Err(error) = context.stats.record_command_sent(&context.credential) {
        tracing::warn!(account = %account, %error, "failed to record command dispatch");
    }

    match context
        .connection
        .send_message(&context.channel_id, command)
        .await
    {
        Ok(()) => {
            tracing::info!(account = %account, %command, "command sent");
            context
                .command_log
                .record(account, &context.channel_id, command, "sent");
        }
        Err(error) => {
            tracing::warn!(account = %account, %command, %error, "command send failed");
            if let Err(record_error) = context.stats.record_command_failure(&context.credential) {
                tracing::warn!(account = %account, error = %record_error, "failed to record command failure");
            }
            context
                .command_log
                .record(account, &context.channel_id, command, "failed");
        }
    }
}

/// Waits out `delay`, returning false as soon as cancellation is observed.
async fn sleep_unless_cancelled(delay: Duration, cancel_rx: &mut watch::Receiver<bool>) -> bool {
    if *cancel_rx.borrow() {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        changed = cancel_rx.changed() => changed.is_ok() && !*cancel_rx.borrow(),
    }
}
