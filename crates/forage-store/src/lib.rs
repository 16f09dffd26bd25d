//! Persisted documents for the account fleet.
//!
//! Three independent full-document JSON stores: the roster (accounts and
//! their channels), per-account statistics, and the operator access list.
//! Every store owns its file path and serializes read-modify-write under a
//! sync mutex; no suspension ever occurs inside a mutation, so concurrent
//! tasks cannot interleave destructively. Absent or corrupt documents load
//! as empty defaults — accepted data loss, never a crash.

use std::path::Path;

use serde::de::DeserializeOwned;

pub mod access;
pub mod roster;
pub mod stats;

pub use access::{AccessDocument, AccessStore};
pub use roster::{AccountRecord, RosterDocument, RosterStore};
pub use stats::{StatsDocument, StatsRecord, StatsStore};

/// Reads a document, substituting the empty default when the file is
/// missing or fails to parse.
pub(crate) fn load_document_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return T::default(),
    };
    match serde_json::from_str::<T>(&raw) {
        Ok(document) => document,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                %error,
                "document failed to parse; substituting empty default"
            );
            T::default()
        }
    }
}

pub(crate) fn save_document<T: serde::Serialize>(path: &Path, document: &T) -> anyhow::Result<()> {
    let mut payload = serde_json::to_string_pretty(document)?;
    payload.push('\n');
    forage_core::write_text_atomic(path, &payload)
}
