//! Clap derive structures for the `macrosync` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// macrosync -- keep Zabbix host macros in sync with NetBox
#[derive(Debug, Parser)]
#[command(
    name = "macrosync",
    version,
    about = "Reconcile Zabbix host macros against NetBox device templates",
    long_about = "Receives NetBox change webhooks and keeps each Zabbix host's macros\n\
        aligned with the template in the device's config context. Existing\n\
        macros are never removed; only missing or differing ones are written.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (default: platform config dir)
    #[arg(long, short = 'c', env = "MACROSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the webhook server and heartbeat
    Serve(ServeArgs),

    /// Reconcile one device now, ignoring tags
    Reconcile(ReconcileArgs),

    /// Diff two ", "-joined tag lists
    Tags(TagsArgs),

    /// Diff two device snapshots
    Compare(CompareArgs),

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address (overrides server.bind)
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// NetBox device id
    pub device_id: u64,

    /// Print the combined macro set without writing or notifying
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct TagsArgs {
    /// Tags before the change
    pub prechange: String,
    /// Tags after the change
    pub postchange: String,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Snapshot before the change (Python-style repr or JSON)
    pub prechange: String,
    /// Snapshot after the change
    pub postchange: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration, secrets redacted
    Show,
    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    pub shell: Shell,
}
