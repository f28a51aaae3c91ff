//! Annual renewal: per-module status labels, expiry countdowns.

use chrono::{DateTime, Utc};
use workbench_types::{AccessModuleStatus, AccessTier, whole_days_from_now};

use crate::AccessContext;
use crate::modules::{RT_RENEWAL_MODULES, is_enabled_in_environment};
use crate::status::{is_completed, is_expiring_or_expired};

/// Days-remaining at or below which the user gets an expiration notice.
pub const NOTIFICATION_THRESHOLD_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalStatus {
    NeverExpires,
    Current,
    ExpiringSoon,
    Expired,
    Bypassed,
    Incomplete,
}

impl RenewalStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            RenewalStatus::NeverExpires => "Complete (Never Expires)",
            RenewalStatus::Current => "Current",
            RenewalStatus::ExpiringSoon => "Expiring Soon",
            RenewalStatus::Expired => "Expired",
            RenewalStatus::Bypassed => "Bypassed",
            RenewalStatus::Incomplete => "Incomplete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalDisplay {
    pub last_confirmed_date: String,
    pub next_review_date: String,
    pub status: RenewalStatus,
}

/// `Mon D, YYYY`, or "Unavailable" when there is no date.
#[must_use]
pub fn display_date(epoch_millis: Option<i64>) -> String {
    epoch_millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map_or_else(
            || "Unavailable".to_string(),
            |date| date.format("%b %-d, %Y").to_string(),
        )
}

fn days_remaining_suffix(expiration: i64, now_millis: i64) -> String {
    let days = whole_days_from_now(expiration, now_millis);
    let plural = if days == 1 { "" } else { "s" };
    format!("({days} day{plural})")
}

/// Dates and status label for one module on the renewal page.
///
/// Checks run in priority order: bypass, incomplete, no expiration, expired,
/// inside the lookback window, otherwise current.
#[must_use]
pub fn renewal_display(status: &AccessModuleStatus, ctx: &AccessContext<'_>) -> RenewalDisplay {
    if status.is_bypassed() {
        return RenewalDisplay {
            last_confirmed_date: display_date(status.bypass_epoch_millis),
            next_review_date: "Unavailable (bypassed)".to_string(),
            status: RenewalStatus::Bypassed,
        };
    }

    if !is_completed(status, ctx) {
        return RenewalDisplay {
            last_confirmed_date: "Unavailable (not completed)".to_string(),
            next_review_date: "Unavailable (not completed)".to_string(),
            status: RenewalStatus::Incomplete,
        };
    }

    let last_confirmed_date = display_date(status.completion_epoch_millis);
    let Some(expiration) = status.expiration_epoch_millis else {
        return RenewalDisplay {
            last_confirmed_date,
            next_review_date: "Never Expires".to_string(),
            status: RenewalStatus::NeverExpires,
        };
    };

    let next_review = display_date(Some(expiration));
    if status.has_expired(ctx.now_millis) {
        return RenewalDisplay {
            last_confirmed_date,
            next_review_date: format!("{next_review} (expired)"),
            status: RenewalStatus::Expired,
        };
    }

    let next_review_date = format!(
        "{next_review} {}",
        days_remaining_suffix(expiration, ctx.now_millis)
    );
    let status = if is_expiring_or_expired(status, ctx.config, ctx.now_millis) {
        RenewalStatus::ExpiringSoon
    } else {
        RenewalStatus::Current
    };
    RenewalDisplay {
        last_confirmed_date,
        next_review_date,
        status,
    }
}

/// Whole days until the soonest expiration among modules required for `tier`,
/// reported only once it is within [`NOTIFICATION_THRESHOLD_DAYS`].
#[must_use]
pub fn days_until_expiration(ctx: &AccessContext<'_>, tier: AccessTier) -> Option<i64> {
    let earliest = ctx
        .profile
        .access_modules
        .modules
        .iter()
        .filter(|status| {
            ctx.config
                .module_config(status.module_name)
                .is_some_and(|config| match tier {
                    AccessTier::Registered => config.required_for_rt_access,
                    AccessTier::Controlled => config.required_for_ct_access,
                })
        })
        .filter_map(|status| status.expiration_epoch_millis)
        .min()?;

    let days = whole_days_from_now(earliest, ctx.now_millis);
    (days <= NOTIFICATION_THRESHOLD_DAYS).then_some(days)
}

/// Registered Tier access has lapsed: some enabled renewal module expired without a
/// bypass.
#[must_use]
pub fn has_registered_tier_expired(ctx: &AccessContext<'_>) -> bool {
    RT_RENEWAL_MODULES
        .iter()
        .copied()
        .filter(|&module| is_enabled_in_environment(module, ctx.config))
        .map(|module| ctx.profile.module_status(module))
        .any(|status| status.has_expired(ctx.now_millis) && !status.is_bypassed())
}
