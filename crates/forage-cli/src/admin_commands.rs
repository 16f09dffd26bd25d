//! Operator command parsing and dispatch.
//!
//! The same dispatch path serves both the clap subcommands and the raw
//! `$`-prefixed command lines an embedding operator interface forwards.
//! Every command resolves to an explicit success/failure outcome with a
//! human-readable message; scheduler internals never surface here.

use forage_runtime::{AddOutcome, FleetService, ToggleOutcome};

use crate::render_helpers::{render_help_text, render_stats_table};

/// Prefix an embedding chat surface puts in front of operator commands.
pub const ADMIN_COMMAND_PREFIX: char = '$';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Help,
    Stats,
    AddAccount {
        credential: String,
        channel_id: String,
    },
    RemoveAccount {
        index: usize,
    },
    Toggle {
        index: usize,
    },
    StartAll,
    StopAll,
    Grant {
        user_id: String,
    },
    Revoke {
        user_id: String,
    },
    ResetStats,
    ExportStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminOutcome {
    pub ok: bool,
    pub message: String,
}

impl AdminOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Strips platform mention decoration: `<@!123>` → `123`.
fn normalize_user_mention(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !matches!(ch, '<' | '@' | '!' | '>'))
        .collect()
}

fn parse_index(args: &[&str], usage: &str) -> Result<usize, String> {
    args.first()
        .and_then(|raw| raw.parse::<usize>().ok())
        .ok_or_else(|| usage.to_string())
}

fn parse_user(args: &[&str], usage: &str) -> Result<String, String> {
    let user_id = args.first().map(|raw| normalize_user_mention(raw));
    match user_id {
        Some(user_id) if !user_id.is_empty() => Ok(user_id),
        _ => Err(usage.to_string()),
    }
}

/// Parses one operator command line; the `$` prefix is optional. Errors
/// carry a usage message suitable for echoing back verbatim.
pub fn parse_admin_command(input: &str) -> Result<AdminCommand, String> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix(ADMIN_COMMAND_PREFIX)
        .unwrap_or(trimmed);
    let mut parts = trimmed.split_whitespace();
    let Some(keyword) = parts.next() else {
        return Err("empty command; try `help`".to_string());
    };
    let args: Vec<&str> = parts.collect();

    match keyword.to_ascii_lowercase().as_str() {
        "help" => Ok(AdminCommand::Help),
        "stats" => Ok(AdminCommand::Stats),
        "add-account" => match args.as_slice() {
            [credential, channel_id] => Ok(AdminCommand::AddAccount {
                credential: (*credential).to_string(),
                channel_id: (*channel_id).to_string(),
            }),
            _ => Err("usage: add-account <credential> <channel-id>".to_string()),
        },
        "remove-account" => Ok(AdminCommand::RemoveAccount {
            index: parse_index(&args, "usage: remove-account <index>")?,
        }),
        "toggle" => Ok(AdminCommand::Toggle {
            index: parse_index(&args, "usage: toggle <index>")?,
        }),
        "start-all" => Ok(AdminCommand::StartAll),
        "stop-all" => Ok(AdminCommand::StopAll),
        "grant" => Ok(AdminCommand::Grant {
            user_id: parse_user(&args, "usage: grant <user>")?,
        }),
        "revoke" => Ok(AdminCommand::Revoke {
            user_id: parse_user(&args, "usage: revoke <user>")?,
        }),
        "reset-stats" => Ok(AdminCommand::ResetStats),
        "export-stats" => Ok(AdminCommand::ExportStats),
        other => Err(format!("unknown command `{other}`; try `help`")),
    }
}

/// Dispatch with the permission gate applied — the path used for commands
/// arriving from an embedding operator interface.
pub async fn execute_admin_command(
    service: &FleetService,
    actor_id: &str,
    command: AdminCommand,
) -> AdminOutcome {
    if !service.access().has_permission(actor_id) {
        return AdminOutcome::failure("no permission");
    }
    dispatch_admin_command(service, command).await
}

/// Dispatch without a permission check — the path for the local operator
/// driving the binary directly.
pub async fn dispatch_admin_command(service: &FleetService, command: AdminCommand) -> AdminOutcome {
    match command {
        AdminCommand::Help => AdminOutcome::success(render_help_text()),
        AdminCommand::Stats => {
            let roster = service.roster_snapshot();
            let stats = service.stats_snapshot();
            let running = service.running_count().await;
            AdminOutcome::success(render_stats_table(&roster, &stats, running))
        }
        AdminCommand::AddAccount {
            credential,
            channel_id,
        } => match service.add_account(&credential, &channel_id).await {
            Ok(AddOutcome::Duplicate) => AdminOutcome::failure("account already registered"),
            Ok(AddOutcome::Added {
                account,
                login: Ok(()),
            }) => AdminOutcome::success(format!("added and logged in {account}")),
            Ok(AddOutcome::Added {
                account,
                login: Err(error),
            }) => AdminOutcome::failure(format!("added {account}, but login failed: {error}")),
            Err(error) => AdminOutcome::failure(format!("failed to add account: {error}")),
        },
        AdminCommand::RemoveAccount { index } => match service.remove_account(index).await {
            Ok(Some(account)) => {
                AdminOutcome::success(format!("removed {account} and its statistics"))
            }
            Ok(None) => AdminOutcome::failure(format!("no account at index {index}")),
            Err(error) => AdminOutcome::failure(format!("failed to remove account: {error}")),
        },
        AdminCommand::Toggle { index } => match service.toggle_account(index).await {
            Ok(ToggleOutcome::Activated {
                account,
                login: Ok(()),
            }) => AdminOutcome::success(format!("activated {account}")),
            Ok(ToggleOutcome::Activated {
                account,
                login: Err(error),
            }) => AdminOutcome::failure(format!("activated {account}, but login failed: {error}")),
            Ok(ToggleOutcome::Deactivated { account }) => {
                AdminOutcome::success(format!("deactivated {account}"))
            }
            Ok(ToggleOutcome::InvalidIndex) => {
                AdminOutcome::failure(format!("no account at index {index}"))
            }
            Err(error) => AdminOutcome::failure(format!("failed to toggle account: {error}")),
        },
        AdminCommand::StartAll => {
            let started = service.start_all().await;
            AdminOutcome::success(format!("started {started} sessions"))
        }
        AdminCommand::StopAll => {
            let stopped = service.stop_all().await;
            AdminOutcome::success(format!("stopped {stopped} sessions"))
        }
        AdminCommand::Grant { user_id } => match service.access().grant(&user_id) {
            Ok(true) => AdminOutcome::success(format!("granted access to {user_id}")),
            Ok(false) => AdminOutcome::failure(format!("{user_id} already has access")),
            Err(error) => AdminOutcome::failure(format!("failed to grant access: {error}")),
        },
        AdminCommand::Revoke { user_id } => match service.access().revoke(&user_id) {
            Ok(true) => AdminOutcome::success(format!("revoked access from {user_id}")),
            Ok(false) => AdminOutcome::failure(format!("{user_id} is not authorized")),
            Err(error) => AdminOutcome::failure(format!("failed to revoke access: {error}")),
        },
        AdminCommand::ResetStats => match service.reset_stats() {
            Ok(()) => AdminOutcome::success("statistics reset"),
            Err(error) => AdminOutcome::failure(format!("failed to reset statistics: {error}")),
        },
        AdminCommand::ExportStats => match service.export_stats() {
            Ok(path) => AdminOutcome::success(format!("exported {}", path.display())),
            Err(error) => AdminOutcome::failure(format!("failed to export statistics: {error}")),
        },
    }
}
