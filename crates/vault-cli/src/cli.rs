use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vault",
    about = "Archive vault: versioned deposits into a remote archive",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a scripted deposit, update, and listing against a simulated archive
    Demo(DemoArgs),
    /// List deposit records from a journal
    Records(RecordsArgs),
    /// Show one deposit record from a journal
    Status(StatusArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct DemoArgs {
    /// Configuration file; defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Persist records to this journal instead of memory
    #[arg(long)]
    pub journal: Option<PathBuf>,
    /// Resolution checks the simulated archive answers "not yet" before completing
    #[arg(long, default_value = "2")]
    pub resolve_after: u32,
}

#[derive(Args)]
pub struct RecordsArgs {
    #[arg(long)]
    pub journal: PathBuf,
    /// Only records of this object type (e.g. "data-item")
    #[arg(long = "type")]
    pub object_type: Option<String>,
    /// Only records in this status (PENDING, DEPOSITED, FAILED)
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    #[arg(long)]
    pub journal: PathBuf,
    pub deposit_id: String,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub file: Option<PathBuf>,
}
