//! Clap argument surface for the `forage` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliConnectorMode {
    /// In-process connector: logins always succeed and sends are recorded
    /// locally. Lets the whole fleet pipeline run as a dry run.
    Memory,
}

#[derive(Debug, Parser)]
#[command(
    name = "forage",
    about = "Multi-account command fleet for a chat game bot",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "FORAGE_STATE_DIR",
        default_value = ".forage",
        help = "Directory holding the roster, statistics, and access documents"
    )]
    pub state_dir: PathBuf,

    #[arg(
        long = "game-bot-id",
        env = "FORAGE_GAME_BOT_ID",
        default_value = "",
        help = "Platform identity of the game bot whose replies feed the statistics"
    )]
    pub game_bot_id: String,

    #[arg(
        long = "command-interval-ms",
        env = "FORAGE_COMMAND_INTERVAL_MS",
        default_value_t = 3_000,
        value_parser = parse_positive_u64,
        help = "Delay between commands within one cycle"
    )]
    pub command_interval_ms: u64,

    #[arg(
        long = "cycle-interval-ms",
        env = "FORAGE_CYCLE_INTERVAL_MS",
        default_value_t = 45_000,
        value_parser = parse_positive_u64,
        help = "Delay between the last send of one cycle and the next cycle"
    )]
    pub cycle_interval_ms: u64,

    #[arg(
        long = "command-sequence",
        env = "FORAGE_COMMAND_SEQUENCE",
        value_delimiter = ',',
        help = "Ordered command sequence issued each cycle; defaults to the built-in rotation"
    )]
    pub command_sequence: Vec<String>,

    #[arg(
        long,
        env = "FORAGE_CONNECTOR",
        value_enum,
        default_value_t = CliConnectorMode::Memory,
        help = "Platform connector mode"
    )]
    pub connector: CliConnectorMode,

    #[arg(
        long = "owner-id",
        env = "FORAGE_OWNER_ID",
        help = "Operator identity written to the access document at startup"
    )]
    pub owner_id: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Start every active account and keep the fleet running until ctrl-c.
    Run,
    /// Print the statistics table.
    Stats,
    /// Register an account and immediately attempt login.
    AddAccount {
        credential: String,
        channel_id: String,
    },
    /// Stop and delete the account at the roster index, with its statistics.
    RemoveAccount { index: usize },
    /// Flip an account's active flag, starting or stopping its session.
    Toggle { index: usize },
    /// Start every account marked active.
    StartAll,
    /// Stop every running session.
    StopAll,
    /// Authorize an operator for the command surface.
    Grant { user_id: String },
    /// Withdraw an operator's access.
    Revoke { user_id: String },
    /// Zero every account's counters.
    ResetStats,
    /// Write a masked statistics snapshot to the exports directory.
    ExportStats,
    /// Dispatch a raw operator command line (e.g. "toggle 0") as `actor`,
    /// with the permission gate applied.
    Admin {
        #[arg(long, help = "Acting operator identity for the permission check")]
        actor: String,
        #[arg(required = true, help = "Command line to dispatch")]
        line: Vec<String>,
    },
}
