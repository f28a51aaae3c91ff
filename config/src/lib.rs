//! `~/.workbench/config.toml`: server endpoints, credentials, and poller tuning.
//!
//! Every section is optional. String values may reference environment variables as
//! `${NAME}`; unset variables expand to the empty string.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tempfile::NamedTempFile;

pub const DEFAULT_API_URL: &str = "https://api.workbench.researchallofus.org";
pub const DEFAULT_LEO_URL: &str = "https://notebooks.firecloud.org";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "WORKBENCH_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct WorkbenchConfig {
    pub server: Option<ServerConfig>,
    pub runtime: Option<RuntimeConfig>,
    pub retry: Option<RetryConfig>,
    pub defaults: Option<DefaultsConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to write config at {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not determine config path (no home directory)")]
    NoPath,
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Write { path, .. } => Some(path),
            ConfigError::NoPath => None,
        }
    }
}

#[derive(Default, Deserialize)]
pub struct ServerConfig {
    pub api_url: Option<String>,
    pub leo_url: Option<String>,
    /// Bearer token. Prefer `${ENV_VAR}` over a literal.
    pub token: Option<String>,
}

// Manual Debug impl to keep the token out of logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_url", &self.api_url)
            .field("leo_url", &self.leo_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Runtime initializer overrides.
#[derive(Debug, Default, Deserialize)]
pub struct RuntimeConfig {
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub overall_timeout_ms: Option<u64>,
    pub max_create_count: Option<u32>,
    pub max_delete_count: Option<u32>,
    pub max_resume_count: Option<u32>,
    pub max_server_error_count: Option<u32>,
}

/// HTTP retry policy for idempotent requests.
#[derive(Debug, Default, Deserialize)]
pub struct RetryConfig {
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DefaultsConfig {
    /// Workspace namespace used when a command is not given one.
    pub workspace: Option<String>,
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &after[..end];
        if !name.is_empty() {
            out.push_str(&env::var(name).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn expanded(value: Option<&String>) -> Option<String> {
    value
        .map(|raw| expand_env_vars(raw))
        .filter(|value| !value.trim().is_empty())
}

impl WorkbenchConfig {
    /// Load from [`WorkbenchConfig::path`]. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!(path = %path.display(), %source, "Failed to read config");
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!(path = %path.display(), %source, "Failed to parse config");
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn api_url(&self) -> String {
        expanded(self.server.as_ref().and_then(|s| s.api_url.as_ref()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    #[must_use]
    pub fn leo_url(&self) -> String {
        expanded(self.server.as_ref().and_then(|s| s.leo_url.as_ref()))
            .unwrap_or_else(|| DEFAULT_LEO_URL.to_string())
    }

    /// The bearer token after env expansion; `None` when unset or blank.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        expanded(self.server.as_ref().and_then(|s| s.token.as_ref()))
    }

    #[must_use]
    pub fn default_workspace(&self) -> Option<String> {
        expanded(self.defaults.as_ref().and_then(|d| d.workspace.as_ref()))
    }

    /// Remember `namespace` as the default workspace.
    pub fn persist_default_workspace(namespace: &str) -> Result<PathBuf, ConfigError> {
        let path = config_path().ok_or(ConfigError::NoPath)?;
        persist_default_workspace_at(&path, namespace)?;
        Ok(path)
    }
}

/// Set `[defaults] workspace` in the file at `path`, keeping comments and every other
/// setting. The file and its directory are created if missing.
pub fn persist_default_workspace_at(path: &Path, namespace: &str) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(write_err)?;

    let content = if path.exists() {
        fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        String::new()
    };

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|err| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))?;
    if !doc.contains_key("defaults") {
        doc["defaults"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["defaults"]["workspace"] = toml_edit::value(namespace);

    atomic_write(parent, path, doc.to_string().as_bytes()).map_err(write_err)
}

/// Write via a sibling temp file and rename, user-only permissions on Unix.
fn atomic_write(parent: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(parent)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|path| !path.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".workbench").join("config.toml"))
}
