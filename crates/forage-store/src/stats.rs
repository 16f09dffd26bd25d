//! Per-account statistics document and the adapter that applies parsed
//! replies onto it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;
use forage_core::mask_secret;
use forage_reply::{has_balance_markers, parse_coins, parse_loot};
use serde::{Deserialize, Serialize};

use crate::{load_document_or_default, save_document, RosterDocument};

const STATS_FILE: &str = "stats.json";

/// Lifetime counters for one account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsRecord {
    pub name: String,
    #[serde(default)]
    pub commands: u64,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub last_total: u64,
    #[serde(default)]
    pub catches: u64,
    #[serde(default)]
    pub items: u64,
    #[serde(default)]
    pub animals: u64,
    #[serde(default)]
    pub failures: u64,
}

impl StatsRecord {
    fn zeroed(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsDocument {
    #[serde(default)]
    pub stats: BTreeMap<String, StatsRecord>,
}

/// Statistics store adapter. Every mutation is a full load+mutate+save
/// under the store lock with no suspension inside, so per-credential
/// updates from concurrent sessions never interleave destructively.
pub struct StatsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl StatsStore {
    pub fn open(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(STATS_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> StatsDocument {
        let _guard = self.lock.lock().expect("stats store lock");
        load_document_or_default(&self.path)
    }

    fn with_document<T>(&self, mutate: impl FnOnce(&mut StatsDocument) -> T) -> Result<T> {
        let _guard = self.lock.lock().expect("stats store lock");
        let mut document: StatsDocument = load_document_or_default(&self.path);
        let outcome = mutate(&mut document);
        save_document(&self.path, &document)?;
        Ok(outcome)
    }

    /// Creates a zeroed record on first sight of a credential; follows
    /// display-name changes on later calls. Idempotent.
    pub fn initialize(&self, credential: &str, display_name: &str) -> Result<()> {
        let name = if display_name.is_empty() {
            mask_secret(credential)
        } else {
            display_name.to_string()
        };
        self.with_document(|document| {
            match document.stats.get_mut(credential) {
                Some(record) => {
                    if record.name != name {
                        record.name = name;
                    }
                }
                None => {
                    document
                        .stats
                        .insert(credential.to_string(), StatsRecord::zeroed(name));
                }
            }
        })
    }

    /// Applies one correlated reply. Currency counts only when both balance
    /// markers are present, and gains are monotonic: the cumulative coin
    /// counter moves only when the observed total exceeds the previous one,
    /// while `last_total` always follows the latest reading. Loot counts
    /// unconditionally.
    pub fn apply_reply(&self, credential: &str, text: &str) -> Result<()> {
        self.with_document(|document| {
            let Some(record) = document.stats.get_mut(credential) else {
                return;
            };

            if has_balance_markers(text) {
                let total = parse_coins(text).total();
                if total > record.last_total {
                    record.coins = record.coins.saturating_add(total - record.last_total);
                }
                record.last_total = total;
            }

            let loot = parse_loot(text);
            let animals = loot.animals.len() as u64;
            let items = loot.items.len() as u64;
            record.animals = record.animals.saturating_add(animals);
            record.items = record.items.saturating_add(items);
            record.catches = record.catches.saturating_add(animals + items);
        })
    }

    pub fn record_command_sent(&self, credential: &str) -> Result<()> {
        self.with_document(|document| {
            if let Some(record) = document.stats.get_mut(credential) {
                record.commands = record.commands.saturating_add(1);
            }
        })
    }

    pub fn record_command_failure(&self, credential: &str) -> Result<()> {
        self.with_document(|document| {
            if let Some(record) = document.stats.get_mut(credential) {
                record.failures = record.failures.saturating_add(1);
            }
        })
    }

    pub fn remove(&self, credential: &str) -> Result<()> {
        self.with_document(|document| {
            document.stats.remove(credential);
        })
    }

    /// Replaces the whole document with zeroed records for every roster
    /// account, labelled by masked credential until the next login.
    pub fn reset(&self, roster: &RosterDocument) -> Result<()> {
        self.with_document(|document| {
            document.stats.clear();
            for account in &roster.accounts {
                document.stats.insert(
                    account.credential.to_string(),
                    StatsRecord::zeroed(mask_secret(&account.credential)),
                );
            }
        })
    }

    /// Writes a timestamped snapshot into `export_dir` and returns its
    /// path. Credentials are masked in the export; raw secrets stay in the
    /// roster document only.
    pub fn export(&self, export_dir: &Path) -> Result<PathBuf> {
        let snapshot = self.snapshot();
        let mut masked = StatsDocument::default();
        for (credential, record) in snapshot.stats {
            masked.stats.insert(mask_secret(&credential), record);
        }

        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ");
        let export_path = export_dir.join(format!("stats-export-{stamp}.json"));
        let payload = serde_json::to_string_pretty(&masked)
            .context("failed to serialize statistics export")?;
        forage_core::write_text_atomic(&export_path, &payload)?;
        Ok(export_path)
    }
}
