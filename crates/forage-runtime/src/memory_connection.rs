//! In-memory connector for dry runs and tests.
//!
//! Logins are scripted, sends are recorded instead of delivered, and
//! inbound events are injected through a handle. This is the runtime's
//! stand-in for a real platform adapter, in the same spirit as a
//! channel-store/dry-run outbound mode: the full fleet pipeline runs
//! end-to-end with nothing leaving the process.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::connection::{
    Connection, ConnectionIdentity, Connector, EstablishedConnection, FetchedMessage,
    InboundMessage,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// One recorded outbound send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub channel_id: String,
    pub text: String,
}

#[derive(Default)]
struct ConnectorState {
    rejected: HashSet<String>,
    profiles: HashMap<String, ConnectionIdentity>,
    handles: HashMap<String, MemoryHandle>,
}

/// Scripted connector. Credentials log in successfully unless rejected;
/// each login yields a fresh connection whose handle stays retrievable for
/// injection and inspection.
#[derive(Default)]
pub struct MemoryConnector {
    state: Mutex<ConnectorState>,
    login_counter: AtomicU64,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future login with `credential` fail.
    pub fn reject_credential(&self, credential: &str) {
        let mut state = self.state.lock().expect("connector state lock");
        state.rejected.insert(credential.to_string());
    }

    /// Fixes the identity a credential logs in as.
    pub fn register_profile(&self, credential: &str, user_id: &str, display_name: &str) {
        let mut state = self.state.lock().expect("connector state lock");
        state.profiles.insert(
            credential.to_string(),
            ConnectionIdentity {
                user_id: user_id.to_string(),
                display_name: display_name.to_string(),
            },
        );
    }

    /// Handle for the most recent connection made with `credential`.
    pub fn handle(&self, credential: &str) -> Option<MemoryHandle> {
        let state = self.state.lock().expect("connector state lock");
        state.handles.get(credential).cloned()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, credential: &str) -> Result<EstablishedConnection> {
        let identity = {
            let state = self.state.lock().expect("connector state lock");
            if state.rejected.contains(credential) {
                bail!("credential rejected by platform");
            }
            state.profiles.get(credential).cloned()
        }
        .unwrap_or_else(|| ConnectionIdentity {
            user_id: format!(
                "forager-{}",
                self.login_counter.fetch_add(1, Ordering::Relaxed)
            ),
            display_name: String::new(),
        });

        let (events_tx, events_rx) = tokio::sync::mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let connection = Arc::new(MemoryConnection {
            identity: identity.clone(),
            ready: AtomicBool::new(true),
            forced_send_failures: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
            messages: Mutex::new(HashMap::new()),
        });

        let handle = MemoryHandle {
            connection: Arc::clone(&connection),
            events_tx,
        };
        self.state
            .lock()
            .expect("connector state lock")
            .handles
            .insert(credential.to_string(), handle);

        Ok(EstablishedConnection {
            identity,
            connection,
            events: events_rx,
        })
    }
}

/// Test/inspection side of a memory connection.
#[derive(Clone)]
pub struct MemoryHandle {
    connection: Arc<MemoryConnection>,
    events_tx: tokio::sync::mpsc::Sender<InboundMessage>,
}

impl MemoryHandle {
    pub fn identity(&self) -> ConnectionIdentity {
        self.connection.identity.clone()
    }

    /// Delivers an inbound message to the session's correlator. Dropped
    /// silently when the session is gone.
    pub async fn inject(&self, message: InboundMessage) {
        let _ = self.events_tx.send(message).await;
    }

    /// Seeds the fetch-by-id table.
    pub fn insert_message(&self, channel_id: &str, message_id: &str, author_id: &str, body: &str) {
        let mut messages = self.connection.messages.lock().expect("message table lock");
        messages.insert(
            (channel_id.to_string(), message_id.to_string()),
            FetchedMessage {
                author_id: author_id.to_string(),
                body: body.to_string(),
            },
        );
    }

    pub fn sent(&self) -> Vec<SentRecord> {
        self.connection.sent.lock().expect("sent log lock").clone()
    }

    /// Forces the next `count` sends to fail.
    pub fn fail_next_sends(&self, count: u64) {
        self.connection
            .forced_send_failures
            .store(count, Ordering::Relaxed);
    }

    pub fn set_ready(&self, ready: bool) {
        self.connection.ready.store(ready, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.connection.ready.load(Ordering::Relaxed)
    }
}

struct MemoryConnection {
    identity: ConnectionIdentity,
    ready: AtomicBool,
    forced_send_failures: AtomicU64,
    sent: Mutex<Vec<SentRecord>>,
    messages: Mutex<HashMap<(String, String), FetchedMessage>>,
}

#[async_trait]
impl Connection for MemoryConnection {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()> {
        if !self.is_ready() {
            bail!("connection is not ready");
        }
        let forced = self.forced_send_failures.load(Ordering::Relaxed);
        if forced > 0 {
            self.forced_send_failures
                .store(forced.saturating_sub(1), Ordering::Relaxed);
            bail!("send rejected by platform");
        }
        self.sent.lock().expect("sent log lock").push(SentRecord {
            channel_id: channel_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<FetchedMessage>> {
        let messages = self.messages.lock().expect("message table lock");
        Ok(messages
            .get(&(channel_id.to_string(), message_id.to_string()))
            .cloned())
    }

    async fn destroy(&self) {
        self.ready.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unit_connect_records_sends_and_resolves_fetches() {
        let connector = MemoryConnector::new();
        connector.register_profile("credential-alpha", "user-1", "Forager One");
        let established = connector.connect("credential-alpha").await.expect("connect");
        assert_eq!(established.identity.user_id, "user-1");

        established
            .connection
            .send_message("chan-1", "pls beg")
            .await
            .expect("send");
        let handle = connector.handle("credential-alpha").expect("handle");
        assert_eq!(
            handle.sent(),
            vec![SentRecord {
                channel_id: "chan-1".to_string(),
                text: "pls beg".to_string(),
            }]
        );

        handle.insert_message("chan-1", "msg-1", "user-1", "pls beg");
        let fetched = established
            .connection
            .fetch_message("chan-1", "msg-1")
            .await
            .expect("fetch")
            .expect("present");
        assert_eq!(fetched.author_id, "user-1");
        assert!(established
            .connection
            .fetch_message("chan-1", "missing")
            .await
            .expect("fetch")
            .is_none());
    }

    #[tokio::test]
    async fn unit_rejected_credentials_fail_login() {
        let connector = MemoryConnector::new();
        connector.reject_credential("credential-bad");
        assert!(connector.connect("credential-bad").await.is_err());
    }

    #[tokio::test]
    async fn unit_destroy_marks_connection_not_ready() {
        let connector = MemoryConnector::new();
        let established = connector.connect("credential-alpha").await.expect("connect");
        assert!(established.connection.is_ready());
        established.connection.destroy().await;
        assert!(!established.connection.is_ready());
        assert!(established
            .connection
            .send_message("chan-1", "pls beg")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn functional_forced_failures_expire_per_send() {
        let connector = MemoryConnector::new();
        let established = connector.connect("credential-alpha").await.expect("connect");
        let handle = connector.handle("credential-alpha").expect("handle");

        handle.fail_next_sends(1);
        assert!(established
            .connection
            .send_message("chan-1", "pls hunt")
            .await
            .is_err());
        assert!(established
            .connection
            .send_message("chan-1", "pls dig")
            .await
            .is_ok());
        assert_eq!(handle.sent().len(), 1);
    }
}
