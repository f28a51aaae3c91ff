//! Which modules apply to a user, which are left, and which one to focus.
//!
//! All functions here are total: missing profile data degrades to "not eligible" or
//! "not complete" instead of an error.

use workbench_types::{AccessModule, AccessModuleStatus, AccessTier};

use crate::AccessContext;
use crate::modules::{PageMode, is_enabled_in_environment};
use crate::status::{is_compliant, is_renewal_complete};

/// Tier-based eligibility. Only the Controlled Tier training can be ineligible.
#[must_use]
pub fn is_eligible_module(module: AccessModule, ctx: &AccessContext<'_>) -> bool {
    if module != AccessModule::CtComplianceTraining {
        return true;
    }
    ctx.profile.eligible_for_tier(AccessTier::Controlled)
}

/// With RAS linking on, eRA Commons is only asked of users whose institution requires
/// it for the Registered Tier.
#[must_use]
pub fn is_era_commons_required_by_institution(
    module: AccessModule,
    ctx: &AccessContext<'_>,
) -> bool {
    if module != AccessModule::EraCommons || !ctx.config.enable_ras_login_gov_linking {
        return true;
    }
    ctx.profile
        .tier_eligibilities
        .iter()
        .filter(|tier| tier.access_tier_short_name == AccessTier::Registered)
        .any(|tier| tier.era_required)
}

/// `modules` filtered to those the user is eligible for, enabled in this
/// environment, and required by the user's institution. Input order is kept.
#[must_use]
pub fn eligible_modules(modules: &[AccessModule], ctx: &AccessContext<'_>) -> Vec<AccessModule> {
    modules
        .iter()
        .copied()
        .filter(|&module| is_eligible_module(module, ctx))
        .filter(|&module| is_enabled_in_environment(module, ctx.config))
        .filter(|&module| is_era_commons_required_by_institution(module, ctx))
        .collect()
}

fn is_done(status: &AccessModuleStatus, ctx: &AccessContext<'_>, mode: PageMode) -> bool {
    match mode {
        PageMode::InitialRegistration => is_compliant(status, ctx),
        PageMode::AnnualRenewal => is_renewal_complete(status, ctx),
    }
}

/// `modules` that still need action, in input order.
///
/// Initial registration asks for compliance; annual renewal asks for renewal
/// completeness.
#[must_use]
pub fn incomplete_modules(
    modules: &[AccessModule],
    ctx: &AccessContext<'_>,
    mode: PageMode,
) -> Vec<AccessModule> {
    modules
        .iter()
        .copied()
        .filter(|&module| !is_done(&ctx.profile.module_status(module), ctx, mode))
        .collect()
}

/// Sort `modules` by the mode's display order. Modules the mode does not show keep
/// their relative order after the ones it does.
#[must_use]
pub fn in_display_order(modules: &[AccessModule], mode: PageMode) -> Vec<AccessModule> {
    let order = mode.display_order();
    let mut sorted = modules.to_vec();
    sorted.sort_by_key(|module| {
        order
            .iter()
            .position(|candidate| candidate == module)
            .unwrap_or(order.len())
    });
    sorted
}

/// The next module to direct the user to: the first eligible, incomplete module in
/// display order. `None` when everything eligible is done.
#[must_use]
pub fn focused_module(
    modules: &[AccessModule],
    ctx: &AccessContext<'_>,
    mode: PageMode,
) -> Option<AccessModule> {
    let eligible = eligible_modules(&in_display_order(modules, mode), ctx);
    incomplete_modules(&eligible, ctx, mode).into_iter().next()
}
