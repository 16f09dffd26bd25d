//! Operator access list: one owner plus explicitly authorized users.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{load_document_or_default, save_document};

const ACCESS_FILE: &str = "access.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessDocument {
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub authorized_users: Vec<String>,
}

pub struct AccessStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AccessStore {
    pub fn open(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(ACCESS_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn load(&self) -> AccessDocument {
        let _guard = self.lock.lock().expect("access store lock");
        load_document_or_default(&self.path)
    }

    fn with_document<T>(&self, mutate: impl FnOnce(&mut AccessDocument) -> T) -> Result<T> {
        let _guard = self.lock.lock().expect("access store lock");
        let mut document: AccessDocument = load_document_or_default(&self.path);
        let outcome = mutate(&mut document);
        save_document(&self.path, &document)?;
        Ok(outcome)
    }

    pub fn set_owner(&self, owner_id: &str) -> Result<()> {
        self.with_document(|document| {
            document.owner_id = owner_id.to_string();
        })
    }

    /// Grants access; false when the user already holds it.
    pub fn grant(&self, user_id: &str) -> Result<bool> {
        self.with_document(|document| {
            if document.authorized_users.iter().any(|user| user == user_id) {
                return false;
            }
            document.authorized_users.push(user_id.to_string());
            true
        })
    }

    /// Revokes access; false when the user was not authorized.
    pub fn revoke(&self, user_id: &str) -> Result<bool> {
        self.with_document(|document| {
            let before = document.authorized_users.len();
            document.authorized_users.retain(|user| user != user_id);
            document.authorized_users.len() != before
        })
    }

    /// The owner and every granted user may drive operator commands.
    pub fn has_permission(&self, user_id: &str) -> bool {
        let document = self.load();
        (!document.owner_id.is_empty() && document.owner_id == user_id)
            || document.authorized_users.iter().any(|user| user == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_grant_and_revoke_round_trip() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let store = AccessStore::open(tempdir.path());

        assert!(store.grant("operator-2").expect("grant"));
        assert!(!store.grant("operator-2").expect("grant again"));
        assert!(store.has_permission("operator-2"));

        assert!(store.revoke("operator-2").expect("revoke"));
        assert!(!store.revoke("operator-2").expect("revoke again"));
        assert!(!store.has_permission("operator-2"));
    }

    #[test]
    fn unit_owner_always_has_permission() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let store = AccessStore::open(tempdir.path());
        store.set_owner("operator-1").expect("set owner");
        assert!(store.has_permission("operator-1"));
        assert!(!store.has_permission("operator-2"));
    }

    #[test]
    fn regression_empty_owner_grants_nobody() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let store = AccessStore::open(tempdir.path());
        assert!(!store.has_permission(""));
    }
}
