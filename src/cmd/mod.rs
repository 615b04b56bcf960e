pub mod context;
pub mod db;

use crate::context::ContextStore;
use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "cloud",
    version,
    about = "named contexts for provisioning cloud services",
    long_about = "Keeps a kubeconfig-style file of named contexts, each bound to a host and the services provisioned through it."
)]
pub struct Cli {
    /// Config file to read and update
    #[arg(long, global = true, env = "CLOUD_CONFIG", default_value = "cloud.json")]
    pub config: PathBuf,
    /// Context to select before running the command
    #[arg(long, global = true, env = "CLOUD_CONTEXT")]
    pub context: Option<String>,
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Inspect and manage contexts
    Context {
        #[command(subcommand)]
        action: Option<ContextCommand>,
    },
    /// Provision and release services in the current context
    Db {
        #[command(subcommand)]
        action: DbCommand,
    },
}

#[derive(Subcommand, Default)]
pub enum ContextCommand {
    /// Display the current context
    #[default]
    Current,
    /// List all contexts
    #[command(alias = "ls")]
    List {
        #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Select a context, creating it if needed
    Use { name: String },
    /// Set the host of the current context
    Host { url: String },
    /// Rename a context
    Rename { from: String, to: String },
    /// Delete a context
    Delete { name: String },
}

#[derive(Subcommand)]
pub enum DbCommand {
    /// Allocate a new service id in the current context
    Create {
        #[arg(long)]
        host: Option<String>,
    },
    /// Release a service id from the current context
    Delete {
        id: String,
        #[arg(long)]
        host: Option<String>,
    },
    /// List service ids in the current context
    #[command(alias = "ls")]
    List,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

/// Opens the store, runs the command, and closes the store whether or not the
/// command succeeded. A command error takes precedence over a close error.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let select = cli.context.as_deref().map(str::trim);

    let mut store = match ContextStore::open(&cli.config, select) {
        Ok(store) => store,
        Err(err) if err.is_malformed() => {
            return Err(anyhow::Error::new(err).context(format!(
                "Config '{}' is malformed; fix or remove it",
                cli.config.display()
            )));
        }
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!("Failed to load config '{}'", cli.config.display())));
        }
    };

    let outcome = match cli.command {
        Command::Context { action } => context::handle(&mut store, action.unwrap_or_default()),
        Command::Db { action } => db::handle(&mut store, action),
    };

    debug!(dirty = store.is_dirty(), "closing context store");
    let closed = store
        .close()
        .with_context(|| format!("Failed to save config '{}'", store.path().display()));

    outcome.and(closed)
}
