use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "quire",
    about = "quire: load, validate, and cache content collections",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every collection loader once and write the data store
    Sync(SyncArgs),
    /// Sync, then re-sync whenever the config or a loaded file changes
    Watch(WatchArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ProjectArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
    /// Config file; defaults to `quire.toml` in the root
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
    /// Only run object loaders with this name (repeatable)
    #[arg(long = "loader")]
    pub loaders: Vec<String>,
}

#[derive(Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}
