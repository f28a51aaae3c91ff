//! `workbench`: drive a workspace runtime to a usable state and work through data
//! access requirements from the terminal.
//!
//! ```text
//! main() -> Cli::parse() -> Settings::resolve() -> WorkbenchClient
//!                                                   |
//!                    runtime init/status  <---------+--------->  access status/sync/bypass/confirm
//! ```
//!
//! Logs go to stderr so stdout stays clean for command output. Ctrl-C cancels the
//! shared [`CancellationToken`]; the runtime poller stops before issuing another call.

mod cli;
mod render;
mod settings;

use anyhow::{Result, bail};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use workbench_access::{AccessContext, AccessPlan, PageMode};
use workbench_client::{ProfileStore, WorkbenchClient, actions};
use workbench_runtime::{RuntimeInitializer, RuntimeStore};
use workbench_types::{Profile, RuntimePreset, ServerConfig};

use crate::cli::{AccessCommand, Cli, Command, ConfirmArg, RuntimeCommand};
use crate::settings::Settings;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; stopping");
            token.cancel();
        }
    });
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Use { namespace } = &cli.command {
        settings::remember_workspace(cli.config.as_deref(), namespace)?;
        println!("Default workspace set to {namespace}");
        return Ok(());
    }

    let settings = Settings::resolve(&cli)?;
    let client = settings.client()?;
    tracing::debug!(api = %client.api_base(), "Client ready");

    match cli.command {
        Command::Runtime(command) => run_runtime(command, &settings, &client).await,
        Command::Access(command) => run_access(command, &client).await,
        Command::Use { .. } => Ok(()),
    }
}

async fn run_runtime(
    command: RuntimeCommand,
    settings: &Settings,
    client: &WorkbenchClient,
) -> Result<()> {
    match command {
        RuntimeCommand::Status { workspace } => {
            let namespace = settings.workspace(workspace.as_deref())?;
            let runtime = client.get_runtime(&namespace).await?;
            println!("{}", render::runtime_line(runtime.as_ref()));
        }
        RuntimeCommand::Init { workspace, preset } => {
            let namespace = settings.workspace(workspace.as_deref())?;
            let cancel = CancellationToken::new();
            cancel_on_interrupt(cancel.clone());

            let store = RuntimeStore::new();
            store.switch_workspace(Some(namespace.clone()));

            let mut last_line = String::new();
            let mut initializer = RuntimeInitializer::new(client, namespace)
                .with_options(settings.initializer.clone())
                .with_cancellation(cancel)
                .with_store(store)
                .on_poll(move |runtime| {
                    let line = render::runtime_line(runtime);
                    if line != last_line {
                        println!("{line}");
                        last_line = line;
                    }
                });
            if let Some(preset) = preset {
                initializer =
                    initializer.with_target_runtime(RuntimePreset::from(preset).template());
            }

            let runtime = initializer.run().await?;
            println!("Ready: {}", runtime.display_id());
        }
    }
    Ok(())
}

async fn run_access(command: AccessCommand, client: &WorkbenchClient) -> Result<()> {
    let store = ProfileStore::new();
    match command {
        AccessCommand::Status { mode } => {
            let (config, profile) = tokio::try_join!(client.get_config(), client.get_profile())?;
            store.set(profile.clone());
            print_report(&profile, &config, mode.into());
        }
        AccessCommand::Sync => {
            let config = client.get_config().await?;
            let profile =
                actions::sync_incomplete_modules(client, &store, &config, now_millis()).await?;
            print_report(&profile, &config, PageMode::InitialRegistration);
        }
        AccessCommand::Bypass { modules } => {
            let config = client.get_config().await?;
            if !config.unsafe_allow_self_bypass {
                bail!("self-bypass is not allowed in this environment");
            }
            let profile = if modules.is_empty() {
                actions::self_bypass_all(client, &store).await?
            } else {
                actions::self_bypass(client, &store, &modules).await?
            };
            print_report(&profile, &config, PageMode::InitialRegistration);
        }
        AccessCommand::Confirm { what } => {
            let config = client.get_config().await?;
            let profile = match what {
                ConfirmArg::Publications => actions::confirm_publications(client, &store).await?,
                ConfirmArg::Profile => actions::confirm_profile(client, &store).await?,
            };
            print_report(&profile, &config, PageMode::AnnualRenewal);
        }
    }
    Ok(())
}

fn print_report(profile: &Profile, config: &ServerConfig, mode: PageMode) {
    let ctx = AccessContext::new(profile, config, now_millis());
    let plan = AccessPlan::build(&ctx, mode);
    print!("{}", render::access_report(&plan, &ctx));
}
