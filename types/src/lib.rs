//! Core domain types for the Workbench client.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod access;
mod runtime;
mod server_config;

pub use access::{
    AccessModule, AccessModuleStatus, AccessModules, AccessTier, MILLIS_PER_DAY, Profile,
    TierEligibility, whole_days_from_now,
};
pub use runtime::{
    DataprocConfig, GceConfig, Runtime, RuntimeConfigurationType, RuntimePreset, RuntimeStatus,
    apply_preset_override,
};
pub use server_config::{AccessModuleConfig, ServerConfig};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// ============================================================================
// Workspace Namespace
// ============================================================================

/// A workspace namespace, guaranteed non-empty and free of path separators.
///
/// Namespaces are interpolated into request paths, so a `/` would address a
/// different resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkspaceNamespace(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("workspace namespace must not be empty")]
    Empty,
    #[error("workspace namespace must not contain '/': {0}")]
    InvalidCharacter(String),
}

impl WorkspaceNamespace {
    pub fn new(value: impl Into<String>) -> Result<Self, NamespaceError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(NamespaceError::Empty);
        }
        if trimmed.contains('/') {
            return Err(NamespaceError::InvalidCharacter(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkspaceNamespace {
    type Error = NamespaceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for WorkspaceNamespace {
    type Error = NamespaceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkspaceNamespace> for String {
    fn from(value: WorkspaceNamespace) -> Self {
        value.0
    }
}

impl std::fmt::Display for WorkspaceNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Access Token
// ============================================================================

/// Bearer token for the Workbench and Leonardo APIs.
///
/// Note: `Debug` is manually implemented to redact the token value, preventing accidental
/// credential disclosure in logs or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessToken(<redacted>)")
    }
}

impl AccessToken {
    /// Returns `None` for blank input so an unset `${VAR}` in config means "no token".
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(Self(value.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Lenient lists
// ============================================================================

/// Deserialize a JSON array, dropping entries that do not fit `T`.
///
/// The server adds module names and tiers over time; one unknown entry must not
/// make the whole profile or config unreadable.
fn known_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}
