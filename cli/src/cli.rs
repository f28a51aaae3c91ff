use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use workbench_access::PageMode;
use workbench_types::{AccessModule, RuntimePreset};

#[derive(Parser, Debug)]
#[command(
    name = "workbench",
    version,
    about = "Manage Workbench runtimes and data access requirements"
)]
pub struct Cli {
    /// Config file (defaults to $WORKBENCH_CONFIG, then ~/.workbench/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Workbench API base URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Leonardo base URL.
    #[arg(long, global = true)]
    pub leo_url: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Workspace runtime.
    #[command(subcommand)]
    Runtime(RuntimeCommand),
    /// Data access requirements.
    #[command(subcommand)]
    Access(AccessCommand),
    /// Remember a default workspace namespace.
    Use { namespace: String },
}

#[derive(Subcommand, Debug)]
pub enum RuntimeCommand {
    /// Poll until the runtime is running, creating or resuming it as needed.
    Init {
        #[arg(short, long)]
        workspace: Option<String>,
        /// Configuration to create with when there is no runtime.
        #[arg(long, value_enum)]
        preset: Option<PresetArg>,
    },
    /// Show the runtime once.
    Status {
        #[arg(short, long)]
        workspace: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccessCommand {
    /// Show module progress.
    Status {
        #[arg(long, value_enum, default_value_t = ModeArg::Initial)]
        mode: ModeArg,
    },
    /// Pull external status for every incomplete module.
    Sync,
    /// Bypass modules for yourself (test environments only).
    Bypass {
        /// Module names such as ERA_COMMONS. Defaults to every initial module.
        #[arg(value_parser = parse_module)]
        modules: Vec<AccessModule>,
    },
    /// Annual renewal confirmations.
    Confirm {
        #[arg(value_enum)]
        what: ConfirmArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Initial,
    Renewal,
}

impl From<ModeArg> for PageMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Initial => PageMode::InitialRegistration,
            ModeArg::Renewal => PageMode::AnnualRenewal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    General,
    Hail,
}

impl From<PresetArg> for RuntimePreset {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::General => RuntimePreset::GeneralAnalysis,
            PresetArg::Hail => RuntimePreset::HailAnalysis,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfirmArg {
    Publications,
    Profile,
}

fn parse_module(raw: &str) -> Result<AccessModule, String> {
    let wanted = raw.trim().replace('-', "_");
    AccessModule::ALL
        .into_iter()
        .find(|module| module.as_str().eq_ignore_ascii_case(&wanted))
        .ok_or_else(|| {
            let known: Vec<_> = AccessModule::ALL.iter().map(|m| m.as_str()).collect();
            format!("unknown module `{raw}` (expected one of {})", known.join(", "))
        })
}
