//! Roster document: the configured accounts and their target channels.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{load_document_or_default, save_document};

const ROSTER_FILE: &str = "roster.json";

/// One automated account: an opaque credential, the channel it farms in,
/// whether it should be running, and a display label for operator output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRecord {
    pub credential: String,
    pub channel_id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterDocument {
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
}

/// Full-document store for the roster. Operator commands address accounts
/// by their position in the list, so ordering is preserved across edits.
pub struct RosterStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RosterStore {
    pub fn open(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(ROSTER_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn load(&self) -> RosterDocument {
        let _guard = self.lock.lock().expect("roster store lock");
        load_document_or_default(&self.path)
    }

    fn with_document<T>(&self, mutate: impl FnOnce(&mut RosterDocument) -> T) -> Result<T> {
        let _guard = self.lock.lock().expect("roster store lock");
        let mut document: RosterDocument = load_document_or_default(&self.path);
        let outcome = mutate(&mut document);
        save_document(&self.path, &document)?;
        Ok(outcome)
    }

    /// Appends a new account. Returns false when the credential is already
    /// registered; the roster never holds duplicates.
    pub fn add_account(&self, credential: &str, channel_id: &str) -> Result<bool> {
        self.with_document(|document| {
            if document
                .accounts
                .iter()
                .any(|account| account.credential == credential)
            {
                return false;
            }
            document.accounts.push(AccountRecord {
                credential: credential.to_string(),
                channel_id: channel_id.to_string(),
                active: false,
                label: String::new(),
            });
            true
        })
    }

    /// Removes and returns the account at `index`, if present.
    pub fn remove_account(&self, index: usize) -> Result<Option<AccountRecord>> {
        self.with_document(|document| {
            if index >= document.accounts.len() {
                return None;
            }
            Some(document.accounts.remove(index))
        })
    }

    /// Flips the active flag at `index`; returns the updated record.
    pub fn toggle_account(&self, index: usize) -> Result<Option<AccountRecord>> {
        self.with_document(|document| {
            let account = document.accounts.get_mut(index)?;
            account.active = !account.active;
            Some(account.clone())
        })
    }

    /// Records the display label observed at login. Accounts rename over
    /// time, so the stored label follows the latest reading.
    pub fn set_label(&self, credential: &str, label: &str) -> Result<()> {
        self.with_document(|document| {
            if let Some(account) = document
                .accounts
                .iter_mut()
                .find(|account| account.credential == credential)
            {
                if account.label != label {
                    account.label = label.to_string();
                }
            }
        })
    }

    pub fn account_at(&self, index: usize) -> Option<AccountRecord> {
        self.load().accounts.into_iter().nth(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_add_account_rejects_duplicate_credentials() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let store = RosterStore::open(tempdir.path());
        assert!(store.add_account("credential-alpha", "chan-1").expect("add"));
        assert!(!store.add_account("credential-alpha", "chan-2").expect("add again"));
        assert_eq!(store.load().accounts.len(), 1);
    }

    #[test]
    fn unit_toggle_account_flips_and_persists() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let store = RosterStore::open(tempdir.path());
        store.add_account("credential-alpha", "chan-1").expect("add");

        let toggled = store.toggle_account(0).expect("toggle").expect("present");
        assert!(toggled.active);
        assert!(store.account_at(0).expect("account").active);

        let toggled_back = store.toggle_account(0).expect("toggle").expect("present");
        assert!(!toggled_back.active);
        assert!(store.toggle_account(5).expect("toggle").is_none());
    }

    #[test]
    fn functional_remove_account_preserves_order_of_rest() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let store = RosterStore::open(tempdir.path());
        store.add_account("credential-a", "chan-1").expect("add");
        store.add_account("credential-b", "chan-2").expect("add");
        store.add_account("credential-c", "chan-3").expect("add");

        let removed = store.remove_account(1).expect("remove").expect("present");
        assert_eq!(removed.credential, "credential-b");
        let remaining: Vec<String> = store
            .load()
            .accounts
            .into_iter()
            .map(|account| account.credential)
            .collect();
        assert_eq!(remaining, vec!["credential-a", "credential-c"]);
    }

    #[test]
    fn regression_corrupt_roster_loads_as_empty() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        std::fs::write(tempdir.path().join("roster.json"), "{not json").expect("write");
        let store = RosterStore::open(tempdir.path());
        assert!(store.load().accounts.is_empty());
    }
}
