//! Fleet runtime: session lifecycle, command cycles, and reply correlation.
//!
//! The platform connection is consumed as an opaque capability behind the
//! [`Connector`]/[`Connection`] traits; everything else — the per-account
//! session registry, the repeating command-cycle task, and the correlator
//! that turns game-bot replies into statistics updates — lives here.

pub mod command_log;
pub mod connection;
pub mod correlator;
pub mod cycle;
pub mod fleet;
pub mod memory_connection;
pub mod registry;

pub use command_log::CommandLog;
pub use connection::{
    Connection, ConnectionIdentity, Connector, EmbedField, EstablishedConnection, FetchedMessage,
    InboundMessage, MessageEmbed,
};
pub use cycle::{CycleConfig, DEFAULT_COMMAND_SEQUENCE};
pub use fleet::{AddOutcome, FleetConfig, FleetService, ToggleOutcome};
pub use memory_connection::{MemoryConnector, MemoryHandle, SentRecord};
pub use registry::{RegistryError, SessionRegistry};
