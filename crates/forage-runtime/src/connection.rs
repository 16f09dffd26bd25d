//! Platform connection contract consumed by the fleet runtime.
//!
//! Authentication and transport belong to the platform adapter, not to this
//! workspace; the runtime only needs login, send, fetch-by-id, an inbound
//! event stream, and teardown.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Who a logged-in connection is on the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionIdentity {
    pub user_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// Structured attachment delivered alongside a message body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageEmbed {
    pub description: String,
    pub fields: Vec<EmbedField>,
}

/// One inbound platform message, reduced to what correlation needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
    pub author_id: String,
    pub channel_id: String,
    pub body: String,
    pub replied_to_message_id: Option<String>,
    pub embeds: Vec<MessageEmbed>,
}

/// A previously sent message resolved by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedMessage {
    pub author_id: String,
    pub body: String,
}

/// A live, logged-in platform connection.
#[async_trait]
pub trait Connection: Send + Sync {
    /// False once the connection has been destroyed or dropped by the
    /// platform; cycle tasks stop rescheduling when this turns false.
    fn is_ready(&self) -> bool;

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()>;

    /// Resolves a message by id; `Ok(None)` when the platform no longer
    /// has it.
    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<FetchedMessage>>;

    async fn destroy(&self);
}

/// What a successful login hands back: the identity, the connection, and
/// the owned inbound event stream.
pub struct EstablishedConnection {
    pub identity: ConnectionIdentity,
    pub connection: Arc<dyn Connection>,
    pub events: mpsc::Receiver<InboundMessage>,
}

/// Factory for logged-in connections; one per platform adapter.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Performs login with the credential. An error here is the login
    /// failure path — nothing is registered and nothing retries.
    async fn connect(&self, credential: &str) -> Result<EstablishedConnection>;
}
