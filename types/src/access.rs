//! Access modules, their per-user statuses, and the profile that aggregates them.

use serde::{Deserialize, Serialize};

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Whole days between `now` and `epoch_millis`, rounded toward negative infinity.
///
/// A partial day remaining counts as 0; anything in the past is negative.
#[must_use]
pub fn whole_days_from_now(epoch_millis: i64, now_millis: i64) -> i64 {
    (epoch_millis - now_millis).div_euclid(MILLIS_PER_DAY)
}

/// A compliance requirement a user completes to gain or keep data access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessModule {
    TwoFactorAuth,
    /// Identity verification. The server mirrors RAS Login.gov and ID.me completions
    /// onto this module; the per-provider `RAS_LINK_*` entries are not read.
    Identity,
    EraCommons,
    /// Registered Tier training.
    ComplianceTraining,
    /// Controlled Tier training.
    CtComplianceTraining,
    DataUserCodeOfConduct,
    ProfileConfirmation,
    PublicationConfirmation,
}

impl AccessModule {
    pub const ALL: [AccessModule; 8] = [
        AccessModule::TwoFactorAuth,
        AccessModule::Identity,
        AccessModule::EraCommons,
        AccessModule::ComplianceTraining,
        AccessModule::CtComplianceTraining,
        AccessModule::DataUserCodeOfConduct,
        AccessModule::ProfileConfirmation,
        AccessModule::PublicationConfirmation,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AccessModule::TwoFactorAuth => "TWO_FACTOR_AUTH",
            AccessModule::Identity => "IDENTITY",
            AccessModule::EraCommons => "ERA_COMMONS",
            AccessModule::ComplianceTraining => "COMPLIANCE_TRAINING",
            AccessModule::CtComplianceTraining => "CT_COMPLIANCE_TRAINING",
            AccessModule::DataUserCodeOfConduct => "DATA_USER_CODE_OF_CONDUCT",
            AccessModule::ProfileConfirmation => "PROFILE_CONFIRMATION",
            AccessModule::PublicationConfirmation => "PUBLICATION_CONFIRMATION",
        }
    }

    /// Title shown on admin pages and in CLI output.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            AccessModule::TwoFactorAuth => "Google 2-Step Verification",
            AccessModule::Identity => "Verify your identity with Login.gov",
            AccessModule::EraCommons => "Connect your eRA Commons account",
            AccessModule::ComplianceTraining => "Registered Tier training",
            AccessModule::CtComplianceTraining => "Controlled Tier training",
            AccessModule::DataUserCodeOfConduct => "Sign Data User Code of Conduct",
            AccessModule::ProfileConfirmation => "Update your profile",
            AccessModule::PublicationConfirmation => "Report any publications",
        }
    }

    #[must_use]
    pub const fn is_training(self) -> bool {
        matches!(
            self,
            AccessModule::ComplianceTraining | AccessModule::CtComplianceTraining
        )
    }

    /// Estimated minutes to complete during annual renewal.
    #[must_use]
    pub const fn renewal_time_estimate(self) -> Option<u32> {
        match self {
            AccessModule::ComplianceTraining | AccessModule::CtComplianceTraining => Some(60),
            AccessModule::DataUserCodeOfConduct
            | AccessModule::ProfileConfirmation
            | AccessModule::PublicationConfirmation => Some(5),
            AccessModule::TwoFactorAuth | AccessModule::Identity | AccessModule::EraCommons => {
                None
            }
        }
    }
}

impl std::fmt::Display for AccessModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user record for one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessModuleStatus {
    pub module_name: AccessModule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_epoch_millis: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_epoch_millis: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_epoch_millis: Option<i64>,
}

impl AccessModuleStatus {
    /// A status with nothing recorded.
    #[must_use]
    pub const fn empty(module_name: AccessModule) -> Self {
        Self {
            module_name,
            completion_epoch_millis: None,
            bypass_epoch_millis: None,
            expiration_epoch_millis: None,
        }
    }

    #[must_use]
    pub const fn is_bypassed(&self) -> bool {
        self.bypass_epoch_millis.is_some()
    }

    #[must_use]
    pub fn has_expired(&self, now_millis: i64) -> bool {
        self.expiration_epoch_millis
            .is_some_and(|expiration| whole_days_from_now(expiration, now_millis) < 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessTier {
    #[serde(rename = "registered")]
    Registered,
    #[serde(rename = "controlled")]
    Controlled,
}

impl AccessTier {
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            AccessTier::Registered => "registered",
            AccessTier::Controlled => "controlled",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            AccessTier::Registered => "Registered Tier",
            AccessTier::Controlled => "Controlled Tier",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierEligibility {
    pub access_tier_short_name: AccessTier,
    #[serde(default)]
    pub eligible: bool,
    #[serde(default)]
    pub era_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessModules {
    /// Statuses for modules this client does not model are dropped.
    #[serde(default, deserialize_with = "crate::known_entries")]
    pub modules: Vec<AccessModuleStatus>,
}

/// The signed-in user's profile, as far as access decisions are concerned.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub access_modules: AccessModules,
    #[serde(default, deserialize_with = "crate::known_entries")]
    pub tier_eligibilities: Vec<TierEligibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ducc_signed_version: Option<u32>,
    #[serde(default)]
    pub disabled: bool,
}

impl Profile {
    /// Status for `module`, or an empty status when the profile has no record of it.
    #[must_use]
    pub fn module_status(&self, module: AccessModule) -> AccessModuleStatus {
        self.access_modules
            .modules
            .iter()
            .find(|status| status.module_name == module)
            .copied()
            .unwrap_or_else(|| AccessModuleStatus::empty(module))
    }

    #[must_use]
    pub fn tier_eligibility(&self, tier: AccessTier) -> Option<&TierEligibility> {
        self.tier_eligibilities
            .iter()
            .find(|eligibility| eligibility.access_tier_short_name == tier)
    }

    /// Whether the user is eligible for `tier`. Missing data means not eligible.
    #[must_use]
    pub fn eligible_for_tier(&self, tier: AccessTier) -> bool {
        self.tier_eligibility(tier)
            .is_some_and(|eligibility| eligibility.eligible)
    }
}
