//! Effective settings: command-line flags over the config file over defaults.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use url::Url;
use workbench_client::{RetryConfig, WorkbenchClient};
use workbench_config::WorkbenchConfig;
use workbench_runtime::InitializerOptions;
use workbench_types::{AccessToken, WorkspaceNamespace};

use crate::cli::Cli;

#[derive(Debug)]
pub struct Settings {
    pub api_url: Url,
    pub leo_url: Url,
    pub token: Option<AccessToken>,
    pub retry: RetryConfig,
    pub initializer: InitializerOptions,
    pub default_workspace: Option<String>,
}

impl Settings {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => WorkbenchConfig::load_from(path)?
                .with_context(|| format!("config file {} does not exist", path.display()))?,
            None => WorkbenchConfig::load()?.unwrap_or_default(),
        };
        Self::from_config(&config, cli.api_url.as_deref(), cli.leo_url.as_deref())
    }

    pub fn from_config(
        config: &WorkbenchConfig,
        api_url: Option<&str>,
        leo_url: Option<&str>,
    ) -> Result<Self> {
        let api_url = parse_url("API", api_url.map_or_else(|| config.api_url(), str::to_string))?;
        let leo_url = parse_url(
            "Leonardo",
            leo_url.map_or_else(|| config.leo_url(), str::to_string),
        )?;

        Ok(Self {
            api_url,
            leo_url,
            token: config.token().and_then(AccessToken::new),
            retry: retry_config(config.retry.as_ref()),
            initializer: initializer_options(config.runtime.as_ref()),
            default_workspace: config.default_workspace(),
        })
    }

    pub fn client(&self) -> Result<WorkbenchClient> {
        Ok(
            WorkbenchClient::new(self.api_url.clone(), self.leo_url.clone())?
                .with_token(self.token.clone())
                .with_retry(self.retry.clone()),
        )
    }

    /// `explicit`, else the configured default.
    pub fn workspace(&self, explicit: Option<&str>) -> Result<WorkspaceNamespace> {
        let Some(raw) = explicit.or(self.default_workspace.as_deref()) else {
            bail!("no workspace given; pass --workspace or run `workbench use <namespace>`");
        };
        WorkspaceNamespace::new(raw).with_context(|| format!("invalid workspace `{raw}`"))
    }
}

fn parse_url(what: &str, raw: String) -> Result<Url> {
    let url = Url::parse(&raw).with_context(|| format!("invalid {what} URL `{raw}`"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{what} URL must be http or https, got `{raw}`");
    }
    Ok(url)
}

fn retry_config(section: Option<&workbench_config::RetryConfig>) -> RetryConfig {
    let mut retry = RetryConfig::default();
    let Some(section) = section else {
        return retry;
    };
    if let Some(max_retries) = section.max_retries {
        retry.max_retries = max_retries;
    }
    if let Some(ms) = section.initial_delay_ms {
        retry.initial_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = section.max_delay_ms {
        retry.max_delay = Duration::from_millis(ms);
    }
    retry
}

fn initializer_options(section: Option<&workbench_config::RuntimeConfig>) -> InitializerOptions {
    let mut options = InitializerOptions::default();
    let Some(section) = section else {
        return options;
    };
    if let Some(ms) = section.initial_delay_ms {
        options.initial_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = section.max_delay_ms {
        options.max_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = section.overall_timeout_ms {
        options.overall_timeout = Duration::from_millis(ms);
    }
    if let Some(count) = section.max_create_count {
        options.max_create_count = count;
    }
    if let Some(count) = section.max_delete_count {
        options.max_delete_count = count;
    }
    if let Some(count) = section.max_resume_count {
        options.max_resume_count = count;
    }
    if let Some(count) = section.max_server_error_count {
        options.max_server_error_count = count;
    }
    options
}

/// Persist `namespace` as the default workspace in the active config file.
pub fn remember_workspace(config_override: Option<&Path>, namespace: &str) -> Result<()> {
    let namespace = WorkspaceNamespace::new(namespace)
        .with_context(|| format!("invalid workspace `{namespace}`"))?;
    let path = match config_override {
        Some(path) => {
            workbench_config::persist_default_workspace_at(path, namespace.as_str())?;
            path.to_path_buf()
        }
        None => WorkbenchConfig::persist_default_workspace(namespace.as_str())?,
    };
    tracing::info!(path = %path.display(), %namespace, "Default workspace saved");
    Ok(())
}
