//! Append-only JSONL log of command dispatch outcomes.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use forage_core::current_unix_timestamp_ms;
use serde_json::{json, Value};

const COMMAND_LOG_FILE: &str = "sent-commands.jsonl";

/// Shared JSONL appender. Recording is best-effort: a log write failure is
/// warned about and swallowed, never surfaced into the command cycle.
#[derive(Clone)]
pub struct CommandLog {
    path: PathBuf,
    file: Arc<Mutex<std::fs::File>>,
}

impl CommandLog {
    pub fn open(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(COMMAND_LOG_FILE);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Records one dispatch outcome. `account` must already be masked.
    pub fn record(&self, account: &str, channel_id: &str, command: &str, status: &str) {
        let entry = json!({
            "timestamp_unix_ms": current_unix_timestamp_ms(),
            "account": account,
            "channel_id": channel_id,
            "command": command,
            "status": status,
        });
        if let Err(error) = self.append(&entry) {
            tracing::warn!(%error, "failed to append command log entry");
        }
    }

    fn append(&self, value: &Value) -> Result<()> {
        let line = serde_json::to_string(value).context("failed to encode log entry")?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("command log mutex is poisoned"))?;
        writeln!(file, "{line}")
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(())
    }
}
