//! Server-provided configuration: feature flags and access-module settings.

use serde::{Deserialize, Serialize};

use crate::access::{AccessModule, AccessTier};

/// Server-side settings for one access module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessModuleConfig {
    pub name: AccessModule,
    #[serde(default)]
    pub expirable: bool,
    #[serde(default, rename = "requiredForRTAccess")]
    pub required_for_rt_access: bool,
    #[serde(default, rename = "requiredForCTAccess")]
    pub required_for_ct_access: bool,
    #[serde(default)]
    pub bypassable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default)]
    pub enable_ras_login_gov_linking: bool,
    #[serde(default)]
    pub enable_ras_id_me_linking: bool,
    #[serde(default)]
    pub enable_era_commons: bool,
    #[serde(default)]
    pub enable_compliance_training: bool,
    #[serde(default)]
    pub unsafe_allow_self_bypass: bool,
    #[serde(default, deserialize_with = "crate::known_entries")]
    pub access_tiers_visible_to_users: Vec<AccessTier>,
    #[serde(default)]
    pub current_ducc_versions: Vec<u32>,
    /// Days before expiration at which a non-training module needs renewal.
    #[serde(default = "default_lookback")]
    pub access_renewal_lookback: i64,
    /// Days before expiration at which a training module needs renewal.
    #[serde(default = "default_lookback")]
    pub compliance_training_renewal_lookback: i64,
    #[serde(default, deserialize_with = "crate::known_entries")]
    pub access_modules: Vec<AccessModuleConfig>,
}

const fn default_lookback() -> i64 {
    330
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enable_ras_login_gov_linking: false,
            enable_ras_id_me_linking: false,
            enable_era_commons: false,
            enable_compliance_training: false,
            unsafe_allow_self_bypass: false,
            access_tiers_visible_to_users: vec![AccessTier::Registered],
            current_ducc_versions: Vec::new(),
            access_renewal_lookback: default_lookback(),
            compliance_training_renewal_lookback: default_lookback(),
            access_modules: Vec::new(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn module_config(&self, module: AccessModule) -> Option<&AccessModuleConfig> {
        self.access_modules.iter().find(|config| config.name == module)
    }

    #[must_use]
    pub fn is_current_ducc_version(&self, signed: Option<u32>) -> bool {
        signed.is_some_and(|version| self.current_ducc_versions.contains(&version))
    }

    #[must_use]
    pub fn renewal_lookback_days(&self, module: AccessModule) -> i64 {
        if module.is_training() {
            self.compliance_training_renewal_lookback
        } else {
            self.access_renewal_lookback
        }
    }

    #[must_use]
    pub fn tier_visible(&self, tier: AccessTier) -> bool {
        self.access_tiers_visible_to_users.contains(&tier)
    }
}
