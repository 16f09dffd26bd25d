//! `forage` binary: fleet runtime plus the operator command surface.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use forage_runtime::{
    Connector, CycleConfig, FleetConfig, FleetService, MemoryConnector, DEFAULT_COMMAND_SEQUENCE,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod admin_commands;
mod cli_args;
mod render_helpers;

use admin_commands::{
    dispatch_admin_command, execute_admin_command, parse_admin_command, AdminCommand, AdminOutcome,
};
use cli_args::{Cli, CliCommand, CliConnectorMode};

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn cycle_config_from_cli(cli: &Cli) -> CycleConfig {
    let commands = if cli.command_sequence.is_empty() {
        DEFAULT_COMMAND_SEQUENCE
            .iter()
            .map(|command| command.to_string())
            .collect()
    } else {
        cli.command_sequence.clone()
    };
    CycleConfig {
        commands,
        command_interval: Duration::from_millis(cli.command_interval_ms),
        cycle_interval: Duration::from_millis(cli.cycle_interval_ms),
    }
}

fn build_connector(mode: CliConnectorMode) -> Arc<dyn Connector> {
    match mode {
        CliConnectorMode::Memory => Arc::new(MemoryConnector::new()),
    }
}

async fn run_fleet(service: &FleetService) -> Result<()> {
    let started = service.start_all().await;
    tracing::info!(started, "fleet running; press ctrl-c to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    let stopped = service.stop_all().await;
    tracing::info!(stopped, "fleet stopped");
    Ok(())
}

fn finish(outcome: AdminOutcome) -> Result<()> {
    if outcome.ok {
        println!("{}", outcome.message);
        Ok(())
    } else {
        bail!(outcome.message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let service = FleetService::new(
        FleetConfig {
            state_dir: cli.state_dir.clone(),
            game_bot_id: cli.game_bot_id.clone(),
            cycle: cycle_config_from_cli(&cli),
        },
        build_connector(cli.connector),
    )?;
    if let Some(owner_id) = cli.owner_id.as_deref() {
        service.access().set_owner(owner_id)?;
    }

    let command = match cli.command {
        CliCommand::Run => return run_fleet(&service).await,
        CliCommand::Admin { actor, line } => {
            let outcome = match parse_admin_command(&line.join(" ")) {
                Ok(command) => execute_admin_command(&service, &actor, command).await,
                Err(usage) => AdminOutcome::failure(usage),
            };
            return finish(outcome);
        }
        CliCommand::Stats => AdminCommand::Stats,
        CliCommand::AddAccount {
            credential,
            channel_id,
        } => AdminCommand::AddAccount {
            credential,
            channel_id,
        },
        CliCommand::RemoveAccount { index } => AdminCommand::RemoveAccount { index },
        CliCommand::Toggle { index } => AdminCommand::Toggle { index },
        CliCommand::StartAll => AdminCommand::StartAll,
        CliCommand::StopAll => AdminCommand::StopAll,
        CliCommand::Grant { user_id } => AdminCommand::Grant { user_id },
        CliCommand::Revoke { user_id } => AdminCommand::Revoke { user_id },
        CliCommand::ResetStats => AdminCommand::ResetStats,
        CliCommand::ExportStats => AdminCommand::ExportStats,
    };

    let outcome = dispatch_admin_command(&service, command).await;
    finish(outcome)
}
