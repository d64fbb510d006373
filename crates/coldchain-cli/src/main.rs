mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{alerts, calls, shipments, Context};
use crate::error::{exit_code_for, report_error};
use coldchain_config::{self as config, AppConfig};
use coldchain_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(name = "coldchain", version, about = "coldchain CLI")]
struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Act on this owner's shipments instead of the configured one
    #[arg(long, global = true)]
    owner: Option<String>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replace the owner's shipments with the contents of a CSV or Excel file
    Import(shipments::ImportArgs),
    List(shipments::ListArgs),
    Show(shipments::ShowArgs),
    Delete(shipments::DeleteArgs),
    /// Delete every shipment of the owner
    Clear,
    Export(shipments::ExportArgs),
    /// Print a CSV template with the recognised columns
    Template(shipments::TemplateArgs),
    Alerts(alerts::AlertsArgs),
    /// Mark an alert as read
    Ack(alerts::AckArgs),
    /// Re-check the latest readings against the configured thresholds
    Check(alerts::CheckArgs),
    /// Place a notification call and follow it until it settles
    Call(calls::CallArgs),
    /// Show call history
    Calls,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        owner,
        json,
        verbose,
        command,
    } = cli;

    if let Command::Template(args) = command {
        return shipments::template(args);
    }

    let app_config = load_config(config_path, owner, verbose)?;
    let store = open_store(db_path)?;
    let ctx = Context {
        store: &store,
        json,
        config: &app_config,
    };

    match command {
        Command::Import(args) => shipments::import(&ctx, args),
        Command::List(args) => shipments::list(&ctx, args),
        Command::Show(args) => shipments::show(&ctx, args),
        Command::Delete(args) => shipments::delete(&ctx, args),
        Command::Clear => shipments::clear(&ctx),
        Command::Export(args) => shipments::export(&ctx, args),
        Command::Template(_) => unreachable!("template command handled before store initialization"),
        Command::Alerts(args) => alerts::list_alerts(&ctx, args),
        Command::Ack(args) => alerts::ack(&ctx, args),
        Command::Check(args) => alerts::check(&ctx, args),
        Command::Call(args) => calls::call(&ctx, args),
        Command::Calls => calls::history(&ctx),
    }
}

fn load_config(
    config_path: Option<PathBuf>,
    owner: Option<String>,
    verbose: bool,
) -> Result<AppConfig> {
    let mut app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) if path.exists() => debug!(path = %path.display(), "config resolved"),
            Ok(path) => debug!(path = %path.display(), "config missing, using defaults"),
            Err(err) => debug!(error = %err, "config unavailable"),
        }
    }
    if let Some(owner) = owner {
        let trimmed = owner.trim();
        if trimmed.is_empty() {
            return Err(error::invalid_input("owner cannot be empty"));
        }
        app_config.owner = trimmed.to_string();
    }
    debug!(owner = %app_config.owner, "acting as owner");
    Ok(app_config)
}

fn open_store(db_path: Option<PathBuf>) -> Result<Store> {
    let db_path = paths::resolve_db_path(db_path).with_context(|| "resolve database path")?;
    debug!(path = %db_path.display(), "database path resolved");
    let store = Store::open(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;
    Ok(store)
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
