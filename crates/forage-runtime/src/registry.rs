//! Session registry: one live session per credential, owned lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use forage_core::mask_secret;
use forage_store::{RosterStore, StatsStore};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::command_log::CommandLog;
use crate::connection::{Connection, Connector};
use crate::correlator::{run_reply_correlator, CorrelatorContext};
use crate::cycle::{run_command_cycle, CycleConfig, CycleContext};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a session is already running for {account}")]
    AlreadyRunning { account: String },
    #[error("login failed for {account}: {reason}")]
    LoginFailure { account: String, reason: String },
}

struct SessionHandle {
    connection: Arc<dyn Connection>,
    cancel_tx: watch::Sender<bool>,
    cycle_task: JoinHandle<()>,
    correlator_task: JoinHandle<()>,
}

impl SessionHandle {
    async fn shutdown(self) {
        let _ = self.cancel_tx.send(true);
        self.connection.destroy().await;
        let _ = self.cycle_task.await;
        let _ = self.correlator_task.await;
    }
}

/// Tracks live sessions keyed by credential. Start and stop serialize on
/// the handle map, so a concurrent double start resolves deterministically
/// to `AlreadyRunning` rather than racing the login.
pub struct SessionRegistry {
    connector: Arc<dyn Connector>,
    roster: Arc<RosterStore>,
    stats: Arc<StatsStore>,
    command_log: CommandLog,
    cycle_config: CycleConfig,
    game_bot_id: String,
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new(
        connector: Arc<dyn Connector>,
        roster: Arc<RosterStore>,
        stats: Arc<StatsStore>,
        command_log: CommandLog,
        cycle_config: CycleConfig,
        game_bot_id: String,
    ) -> Self {
        Self {
            connector,
            roster,
            stats,
            command_log,
            cycle_config,
            game_bot_id,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Logs the credential in and brings up its cycle and correlator
    /// tasks. Nothing is registered on login failure.
    pub async fn start(&self, credential: &str, channel_id: &str) -> Result<(), RegistryError> {
        let account = mask_secret(credential);
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(credential) {
            return Err(RegistryError::AlreadyRunning { account });
        }

        let established = match self.connector.connect(credential).await {
            Ok(established) => established,
            Err(error) => {
                tracing::warn!(account = %account, %error, "login failed");
                return Err(RegistryError::LoginFailure {
                    account,
                    reason: error.to_string(),
                });
            }
        };

        if let Err(error) = self
            .stats
            .initialize(credential, &established.identity.display_name)
        {
            tracing::warn!(account = %account, %error, "failed to initialize statistics record");
        }
        if !established.identity.display_name.is_empty() {
            if let Err(error) = self
                .roster
                .set_label(credential, &established.identity.display_name)
            {
                tracing::warn!(account = %account, %error, "failed to update roster label");
            }
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let correlator_task = tokio::spawn(run_reply_correlator(
            CorrelatorContext {
                credential: credential.to_string(),
                channel_id: channel_id.to_string(),
                own_user_id: established.identity.user_id.clone(),
                game_bot_id: self.game_bot_id.clone(),
                connection: Arc::clone(&established.connection),
                stats: Arc::clone(&self.stats),
            },
            established.events,
            cancel_rx.clone(),
        ));
        let cycle_task = tokio::spawn(run_command_cycle(
            CycleContext {
                credential: credential.to_string(),
                channel_id: channel_id.to_string(),
                connection: Arc::clone(&established.connection),
                stats: Arc::clone(&self.stats),
                command_log: self.command_log.clone(),
                config: self.cycle_config.clone(),
            },
            cancel_rx,
        ));

        sessions.insert(
            credential.to_string(),
            SessionHandle {
                connection: established.connection,
                cancel_tx,
                cycle_task,
                correlator_task,
            },
        );
        tracing::info!(account = %account, channel = %channel_id, "session started");
        Ok(())
    }

    /// Tears the session down; no-op (false) when the credential is not
    /// tracked.
    pub async fn stop(&self, credential: &str) -> bool {
        let handle = self.sessions.lock().await.remove(credential);
        let Some(handle) = handle else {
            return false;
        };
        handle.shutdown().await;
        tracing::info!(account = %mask_secret(credential), "session stopped");
        true
    }

    /// Starts every roster account marked active; returns how many came up.
    /// Individual login failures are logged and skipped.
    pub async fn start_all(&self) -> usize {
        let roster = self.roster.load();
        let mut started = 0;
        for account in roster.accounts.into_iter().filter(|record| record.active) {
            match self.start(&account.credential, &account.channel_id).await {
                Ok(()) => started += 1,
                Err(error) => tracing::warn!(%error, "session not started"),
            }
        }
        started
    }

    /// Stops every tracked session; returns how many were stopped.
    pub async fn stop_all(&self) -> usize {
        let handles: Vec<(String, SessionHandle)> =
            self.sessions.lock().await.drain().collect();
        let mut stopped = 0;
        for (credential, handle) in handles {
            handle.shutdown().await;
            tracing::info!(account = %mask_secret(&credential), "session stopped");
            stopped += 1;
        }
        stopped
    }

    pub async fn is_running(&self, credential: &str) -> bool {
        self.sessions.lock().await.contains_key(credential)
    }

    pub async fn running_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
