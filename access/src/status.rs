//! Completion predicates over a single module status.

use workbench_types::{AccessModule, AccessModuleStatus, ServerConfig, whole_days_from_now};

use crate::AccessContext;

/// Completed per the backend's rules.
///
/// The Data User Code of Conduct additionally needs a signature on a version the
/// server still considers current.
#[must_use]
pub fn is_completed(status: &AccessModuleStatus, ctx: &AccessContext<'_>) -> bool {
    if status.completion_epoch_millis.is_none() {
        return false;
    }
    if status.module_name == AccessModule::DataUserCodeOfConduct {
        return ctx
            .config
            .is_current_ducc_version(ctx.profile.ducc_signed_version);
    }
    true
}

#[must_use]
pub fn is_compliant(status: &AccessModuleStatus, ctx: &AccessContext<'_>) -> bool {
    is_completed(status, ctx) || status.is_bypassed()
}

/// Expiration falls inside the module's renewal lookback window (or has passed).
#[must_use]
pub fn is_expiring_or_expired(
    status: &AccessModuleStatus,
    config: &ServerConfig,
    now_millis: i64,
) -> bool {
    status.expiration_epoch_millis.is_some_and(|expiration| {
        whole_days_from_now(expiration, now_millis)
            <= config.renewal_lookback_days(status.module_name)
    })
}

/// Bypassed, or completed and not yet due for renewal.
#[must_use]
pub fn is_renewal_complete(status: &AccessModuleStatus, ctx: &AccessContext<'_>) -> bool {
    status.is_bypassed()
        || (is_completed(status, ctx)
            && !is_expiring_or_expired(status, ctx.config, ctx.now_millis))
}
