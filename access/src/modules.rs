//! Static per-module facts: display orders, feature-flag gating, sync endpoints.

use workbench_types::{AccessModule, ServerConfig};

/// Which page the modules are being evaluated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageMode {
    #[default]
    InitialRegistration,
    AnnualRenewal,
}

impl PageMode {
    /// Parse a `pageMode` query value. Unknown values fall back to `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INITIAL_REGISTRATION" => Some(PageMode::InitialRegistration),
            "ANNUAL_RENEWAL" => Some(PageMode::AnnualRenewal),
            _ => None,
        }
    }

    /// Every module shown in this mode, in display order.
    #[must_use]
    pub const fn display_order(self) -> &'static [AccessModule] {
        match self {
            PageMode::InitialRegistration => ALL_INITIAL_MODULES,
            PageMode::AnnualRenewal => RENEWAL_MODULES,
        }
    }

    /// The subset a user must finish; the Controlled Tier training is optional.
    #[must_use]
    pub const fn required_modules(self) -> &'static [AccessModule] {
        match self {
            PageMode::InitialRegistration => INITIAL_REQUIRED_MODULES,
            PageMode::AnnualRenewal => RENEWAL_REQUIRED_MODULES,
        }
    }
}

pub const ALL_INITIAL_MODULES: &[AccessModule] = &[
    AccessModule::TwoFactorAuth,
    AccessModule::Identity,
    AccessModule::EraCommons,
    AccessModule::ComplianceTraining,
    AccessModule::CtComplianceTraining,
    AccessModule::DataUserCodeOfConduct,
];

pub const INITIAL_REQUIRED_MODULES: &[AccessModule] = &[
    AccessModule::TwoFactorAuth,
    AccessModule::Identity,
    AccessModule::EraCommons,
    AccessModule::ComplianceTraining,
    AccessModule::DataUserCodeOfConduct,
];

pub const RENEWAL_MODULES: &[AccessModule] = &[
    AccessModule::ProfileConfirmation,
    AccessModule::PublicationConfirmation,
    AccessModule::ComplianceTraining,
    AccessModule::CtComplianceTraining,
    AccessModule::DataUserCodeOfConduct,
];

pub const RENEWAL_REQUIRED_MODULES: &[AccessModule] = &[
    AccessModule::ProfileConfirmation,
    AccessModule::PublicationConfirmation,
    AccessModule::ComplianceTraining,
    AccessModule::DataUserCodeOfConduct,
];

/// Registered Tier modules subject to annual renewal.
pub const RT_RENEWAL_MODULES: &[AccessModule] = &[
    AccessModule::ProfileConfirmation,
    AccessModule::PublicationConfirmation,
    AccessModule::ComplianceTraining,
    AccessModule::DataUserCodeOfConduct,
];

/// Whether the environment's feature flags turn this module on at all.
#[must_use]
pub fn is_enabled_in_environment(module: AccessModule, config: &ServerConfig) -> bool {
    match module {
        AccessModule::Identity => config.enable_ras_login_gov_linking,
        AccessModule::EraCommons => config.enable_era_commons,
        AccessModule::ComplianceTraining | AccessModule::CtComplianceTraining => {
            config.enable_compliance_training
        }
        AccessModule::TwoFactorAuth
        | AccessModule::DataUserCodeOfConduct
        | AccessModule::ProfileConfirmation
        | AccessModule::PublicationConfirmation => true,
    }
}

/// Display title, which names Login.gov only while it is the sole identity provider.
#[must_use]
pub fn module_title(module: AccessModule, config: &ServerConfig) -> &'static str {
    match module {
        AccessModule::Identity if config.enable_ras_id_me_linking => "Verify your identity",
        _ => module.title(),
    }
}

/// Backend endpoint that pulls a module's status from its external system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncEndpoint {
    TwoFactorAuth,
    EraCommons,
    ComplianceTraining,
}

impl SyncEndpoint {
    #[must_use]
    pub const fn for_module(module: AccessModule) -> Option<Self> {
        match module {
            AccessModule::TwoFactorAuth => Some(SyncEndpoint::TwoFactorAuth),
            AccessModule::EraCommons => Some(SyncEndpoint::EraCommons),
            AccessModule::ComplianceTraining | AccessModule::CtComplianceTraining => {
                Some(SyncEndpoint::ComplianceTraining)
            }
            AccessModule::Identity
            | AccessModule::DataUserCodeOfConduct
            | AccessModule::ProfileConfirmation
            | AccessModule::PublicationConfirmation => None,
        }
    }
}

/// Sync endpoints to call for `modules`, one call per endpoint.
///
/// Both trainings share an endpoint and concurrent calls to it conflict.
#[must_use]
pub fn sync_endpoints(modules: &[AccessModule]) -> Vec<SyncEndpoint> {
    let mut endpoints = Vec::new();
    for endpoint in modules.iter().copied().filter_map(SyncEndpoint::for_module) {
        if !endpoints.contains(&endpoint) {
            endpoints.push(endpoint);
        }
    }
    endpoints
}
