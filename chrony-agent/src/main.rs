//! chrony management agent
//!
//! Driven by the host's orchestration hooks, one subcommand per lifecycle
//! event:
//!
//! ```text
//! chrony-agent install
//! chrony-agent config-changed
//! chrony-agent remove
//! ```
//!
//! `render` and `status` are read-only.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrony_agent::{HostAgent, Settings, UnitStatus, SETTINGS_FILE};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "chrony-agent")]
#[command(about = "Installs chrony and manages its configuration")]
#[command(version)]
struct Args {
    /// Path to the agent settings file
    #[arg(short, long, env = "CHRONY_AGENT_CONFIG", default_value = SETTINGS_FILE, global = true)]
    config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// First deployment on this host
    Install,
    /// Agent upgraded in place
    Upgrade,
    /// Settings file changed
    ConfigChanged,
    /// Hand chrony back and release the host
    Remove,
    /// Print the configuration that would be written
    Render,
    /// Show lock and installation state
    Status,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(args: &Args) -> Result<ExitCode> {
    let settings = Settings::load(&args.config)
        .with_context(|| format!("loading settings from {}", args.config.display()))?;
    let mut agent = HostAgent::from_settings(&settings).context("preparing agent")?;
    info!(name = %settings.name, command = ?args.command, "chrony-agent starting");

    match args.command {
        Command::Install | Command::Upgrade | Command::ConfigChanged => {
            let status = agent
                .install_and_configure()
                .context("configuring chrony")?;
            print_unit_status(&status, args.format)?;
            Ok(exit_code(&status))
        }
        Command::Remove => {
            if agent.remove().context("removing chrony")? {
                print_line("removed", args.format)?;
                return Ok(ExitCode::SUCCESS);
            }
            let status = agent
                .transitions()
                .last()
                .cloned()
                .unwrap_or(UnitStatus::Active);
            print_unit_status(&status, args.format)?;
            Ok(exit_code(&status))
        }
        Command::Render => {
            let config = agent.render().context("rendering chrony configuration")?;
            match args.format {
                Format::Text => print!("{config}"),
                Format::Json => println!("{}", serde_json::json!({ "config": config })),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let status = agent.status().context("reading agent status")?;
            match args.format {
                Format::Text => println!("{status}"),
                Format::Json => println!("{}", serde_json::to_string_pretty(&status)?),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_unit_status(status: &UnitStatus, format: Format) -> Result<()> {
    match format {
        Format::Text => println!("{status}"),
        Format::Json => println!("{}", serde_json::to_string(status)?),
    }
    Ok(())
}

fn print_line(message: &str, format: Format) -> Result<()> {
    match format {
        Format::Text => println!("{message}"),
        Format::Json => println!("{}", serde_json::json!({ "status": message })),
    }
    Ok(())
}

/// Blocked is reported on stdout but still exits 2 so hooks can tell it apart.
fn exit_code(status: &UnitStatus) -> ExitCode {
    match status {
        UnitStatus::Blocked(_) => ExitCode::from(2),
        _ => ExitCode::SUCCESS,
    }
}
