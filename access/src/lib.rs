//! Access-module eligibility engine.
//!
//! Pure, synchronous rules over a profile snapshot and the server's feature flags:
//!
//! - [`eligible_modules`] - modules that apply to this user in this environment
//! - [`incomplete_modules`] / [`focused_module`] - what is left and what comes next
//! - [`AccessPlan`] - the page-level view model (rows, focus, clickable set)
//! - [`renewal_display`] and friends - annual renewal labels and countdowns
//!
//! Nothing here performs IO. The current time is an input so results are
//! reproducible in tests.

mod eligibility;
mod modules;
mod plan;
mod renewal;
mod status;

pub use eligibility::{
    eligible_modules, focused_module, in_display_order, incomplete_modules,
    is_eligible_module, is_era_commons_required_by_institution,
};
pub use modules::{
    ALL_INITIAL_MODULES, INITIAL_REQUIRED_MODULES, PageMode, RENEWAL_MODULES,
    RENEWAL_REQUIRED_MODULES, RT_RENEWAL_MODULES, SyncEndpoint, is_enabled_in_environment,
    module_title, sync_endpoints,
};
pub use plan::{AccessPlan, ModuleRow};
pub use renewal::{
    NOTIFICATION_THRESHOLD_DAYS, RenewalDisplay, RenewalStatus, days_until_expiration,
    display_date, has_registered_tier_expired, renewal_display,
};
pub use status::{is_completed, is_compliant, is_expiring_or_expired, is_renewal_complete};

use workbench_types::{Profile, ServerConfig};

/// The inputs every rule reads: who, under which flags, and when.
#[derive(Debug, Clone, Copy)]
pub struct AccessContext<'a> {
    pub profile: &'a Profile,
    pub config: &'a ServerConfig,
    pub now_millis: i64,
}

impl<'a> AccessContext<'a> {
    #[must_use]
    pub const fn new(profile: &'a Profile, config: &'a ServerConfig, now_millis: i64) -> Self {
        Self {
            profile,
            config,
            now_millis,
        }
    }
}
