//! Fleet service: the operator-facing surface over roster, statistics,
//! access, and the session registry.
//!
//! Every operation mutates state and triggers its start/stop side effects
//! inline; none of them block on a running cycle.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use forage_core::mask_secret;
use forage_store::{AccessStore, RosterDocument, RosterStore, StatsDocument, StatsStore};

use crate::command_log::CommandLog;
use crate::connection::Connector;
use crate::cycle::CycleConfig;
use crate::registry::{RegistryError, SessionRegistry};

const EXPORT_DIR: &str = "exports";

#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub state_dir: PathBuf,
    pub game_bot_id: String,
    pub cycle: CycleConfig,
}

/// Outcome of registering a new account.
#[derive(Debug)]
pub enum AddOutcome {
    Duplicate,
    Added {
        account: String,
        login: Result<(), RegistryError>,
    },
}

/// Outcome of flipping an account's active flag.
#[derive(Debug)]
pub enum ToggleOutcome {
    InvalidIndex,
    Activated {
        account: String,
        login: Result<(), RegistryError>,
    },
    Deactivated {
        account: String,
    },
}

pub struct FleetService {
    roster: Arc<RosterStore>,
    stats: Arc<StatsStore>,
    access: AccessStore,
    registry: SessionRegistry,
    export_dir: PathBuf,
}

impl FleetService {
    pub fn new(config: FleetConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        std::fs::create_dir_all(&config.state_dir).with_context(|| {
            format!(
                "failed to create state directory {}",
                config.state_dir.display()
            )
        })?;

        let roster = Arc::new(RosterStore::open(&config.state_dir));
        let stats = Arc::new(StatsStore::open(&config.state_dir));
        let access = AccessStore::open(&config.state_dir);
        let command_log = CommandLog::open(&config.state_dir)?;
        let registry = SessionRegistry::new(
            connector,
            Arc::clone(&roster),
            Arc::clone(&stats),
            command_log,
            config.cycle,
            config.game_bot_id,
        );

        Ok(Self {
            roster,
            stats,
            access,
            registry,
            export_dir: config.state_dir.join(EXPORT_DIR),
        })
    }

    pub fn access(&self) -> &AccessStore {
        &self.access
    }

    pub fn roster_snapshot(&self) -> RosterDocument {
        self.roster.load()
    }

    pub fn stats_snapshot(&self) -> StatsDocument {
        self.stats.snapshot()
    }

    pub async fn running_count(&self) -> usize {
        self.registry.running_count().await
    }

    /// Registers the account (inactive) and immediately attempts login, so
    /// the operator learns right away whether the credential works.
    pub async fn add_account(&self, credential: &str, channel_id: &str) -> Result<AddOutcome> {
        if !self.roster.add_account(credential, channel_id)? {
            return Ok(AddOutcome::Duplicate);
        }
        let login = self.registry.start(credential, channel_id).await;
        Ok(AddOutcome::Added {
            account: mask_secret(credential),
            login,
        })
    }

    /// Stops and deletes the account at `index` along with its statistics
    /// record; later queries omit it entirely.
    pub async fn remove_account(&self, index: usize) -> Result<Option<String>> {
        let Some(record) = self.roster.remove_account(index)? else {
            return Ok(None);
        };
        self.registry.stop(&record.credential).await;
        self.stats.remove(&record.credential)?;
        Ok(Some(mask_secret(&record.credential)))
    }

    pub async fn toggle_account(&self, index: usize) -> Result<ToggleOutcome> {
        let Some(record) = self.roster.toggle_account(index)? else {
            return Ok(ToggleOutcome::InvalidIndex);
        };
        let account = mask_secret(&record.credential);
        if record.active {
            let login = self
                .registry
                .start(&record.credential, &record.channel_id)
                .await;
            Ok(ToggleOutcome::Activated { account, login })
        } else {
            self.registry.stop(&record.credential).await;
            Ok(ToggleOutcome::Deactivated { account })
        }
    }

    pub async fn start_all(&self) -> usize {
        self.registry.start_all().await
    }

    pub async fn stop_all(&self) -> usize {
        self.registry.stop_all().await
    }

    /// Zeroes every roster account's counters.
    pub fn reset_stats(&self) -> Result<()> {
        self.stats.reset(&self.roster.load())
    }

    /// Writes a masked statistics snapshot and returns the file path.
    pub fn export_stats(&self) -> Result<PathBuf> {
        self.stats.export(&self.export_dir)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::memory_connection::MemoryConnector;

    struct FleetFixture {
        _tempdir: TempDir,
        connector: Arc<MemoryConnector>,
        service: FleetService,
    }

    fn fixture() -> FleetFixture {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let connector = Arc::new(MemoryConnector::new());
        let service = FleetService::new(
            FleetConfig {
                state_dir: tempdir.path().join("state"),
                game_bot_id: "game-bot".to_string(),
                cycle: CycleConfig {
                    commands: vec!["pls beg".to_string()],
                    command_interval: Duration::from_millis(10),
                    cycle_interval: Duration::from_millis(10_000),
                },
            },
            Arc::clone(&connector) as Arc<dyn Connector>,
        )
        .expect("fleet service");
        FleetFixture {
            _tempdir: tempdir,
            connector,
            service,
        }
    }

    #[tokio::test]
    async fn functional_add_account_registers_and_logs_in() {
        let fixture = fixture();
        let outcome = fixture
            .service
            .add_account("credential-alpha", "chan-1")
            .await
            .expect("add");
        assert!(matches!(
            outcome,
            AddOutcome::Added { login: Ok(()), .. }
        ));
        assert_eq!(fixture.service.running_count().await, 1);

        let duplicate = fixture
            .service
            .add_account("credential-alpha", "chan-9")
            .await
            .expect("add duplicate");
        assert!(matches!(duplicate, AddOutcome::Duplicate));

        fixture.service.stop_all().await;
    }

    #[tokio::test]
    async fn functional_add_account_with_bad_credential_keeps_roster_entry() {
        let fixture = fixture();
        fixture.connector.reject_credential("credential-bad");
        let outcome = fixture
            .service
            .add_account("credential-bad", "chan-1")
            .await
            .expect("add");
        assert!(matches!(
            outcome,
            AddOutcome::Added { login: Err(_), .. }
        ));
        assert_eq!(fixture.service.running_count().await, 0);
        assert_eq!(fixture.service.roster_snapshot().accounts.len(), 1);
    }

    #[tokio::test]
    async fn functional_remove_account_drops_session_and_statistics() {
        let fixture = fixture();
        fixture
            .service
            .add_account("credential-alpha", "chan-1")
            .await
            .expect("add");
        assert!(fixture
            .service
            .stats_snapshot()
            .stats
            .contains_key("credential-alpha"));

        let removed = fixture.service.remove_account(0).await.expect("remove");
        assert!(removed.is_some());
        assert_eq!(fixture.service.running_count().await, 0);
        assert!(fixture.service.roster_snapshot().accounts.is_empty());
        assert!(fixture.service.stats_snapshot().stats.is_empty());

        assert!(fixture
            .service
            .remove_account(0)
            .await
            .expect("remove again")
            .is_none());
    }

    #[tokio::test]
    async fn functional_toggle_round_trip_starts_then_stops() {
        let fixture = fixture();
        fixture
            .service
            .add_account("credential-alpha", "chan-1")
            .await
            .expect("add");
        fixture.service.stop_all().await;

        let activated = fixture.service.toggle_account(0).await.expect("toggle");
        assert!(matches!(
            activated,
            ToggleOutcome::Activated { login: Ok(()), .. }
        ));
        assert_eq!(fixture.service.running_count().await, 1);

        let deactivated = fixture.service.toggle_account(0).await.expect("toggle");
        assert!(matches!(deactivated, ToggleOutcome::Deactivated { .. }));
        assert_eq!(fixture.service.running_count().await, 0);

        assert!(matches!(
            fixture.service.toggle_account(7).await.expect("toggle"),
            ToggleOutcome::InvalidIndex
        ));
    }

    #[tokio::test]
    async fn functional_reset_and_export_cover_current_roster() {
        let fixture = fixture();
        fixture
            .service
            .add_account("credential-alpha-0001", "chan-1")
            .await
            .expect("add");
        fixture.service.stop_all().await;

        fixture.service.reset_stats().expect("reset");
        let snapshot = fixture.service.stats_snapshot();
        assert_eq!(snapshot.stats.len(), 1);
        assert_eq!(snapshot.stats["credential-alpha-0001"].commands, 0);

        let export_path = fixture.service.export_stats().expect("export");
        assert!(export_path.exists());
    }
}
