//! Page-level view model for the data access requirements flow.

use workbench_types::{AccessModule, AccessModuleStatus, AccessTier};

use crate::AccessContext;
use crate::eligibility::{eligible_modules, focused_module};
use crate::modules::{PageMode, is_enabled_in_environment};
use crate::status::{is_compliant, is_renewal_complete};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRow {
    pub module: AccessModule,
    pub status: AccessModuleStatus,
    /// False for rows shown disabled, e.g. identity verification while the
    /// Login.gov flag is off.
    pub eligible: bool,
    pub compliant: bool,
    pub renewal_complete: bool,
    pub focused: bool,
    pub clickable: bool,
}

/// Everything a renderer needs to draw the requirements page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPlan {
    pub mode: PageMode,
    pub rows: Vec<ModuleRow>,
    pub focused: Option<AccessModule>,
    /// At most two: the focused module and the next required one. They differ when
    /// the focused module is optional, which lets the user skip it.
    pub clickable: Vec<AccessModule>,
    /// No required module is left.
    pub complete: bool,
    pub show_controlled_tier: bool,
    pub self_bypass_available: bool,
}

impl AccessPlan {
    #[must_use]
    pub fn build(ctx: &AccessContext<'_>, mode: PageMode) -> Self {
        let focused = focused_module(mode.display_order(), ctx, mode);
        let next_required = focused_module(mode.required_modules(), ctx, mode);

        let mut clickable = Vec::with_capacity(2);
        for module in [focused, next_required].into_iter().flatten() {
            if !clickable.contains(&module) {
                clickable.push(module);
            }
        }

        let show_controlled_tier =
            mode == PageMode::AnnualRenewal || ctx.config.tier_visible(AccessTier::Controlled);

        let eligible = eligible_modules(mode.display_order(), ctx);
        let rows = mode
            .display_order()
            .iter()
            .copied()
            .filter(|module| {
                eligible.contains(module) || shown_disabled(*module, ctx, show_controlled_tier)
            })
            .map(|module| {
                let status = ctx.profile.module_status(module);
                ModuleRow {
                    module,
                    status,
                    eligible: eligible.contains(&module),
                    compliant: is_compliant(&status, ctx),
                    renewal_complete: is_renewal_complete(&status, ctx),
                    focused: focused == Some(module),
                    clickable: clickable.contains(&module),
                }
            })
            .collect();

        Self {
            mode,
            rows,
            focused,
            self_bypass_available: ctx.config.unsafe_allow_self_bypass && !clickable.is_empty(),
            clickable,
            complete: next_required.is_none(),
            show_controlled_tier,
        }
    }

    #[must_use]
    pub fn row(&self, module: AccessModule) -> Option<&ModuleRow> {
        self.rows.iter().find(|row| row.module == module)
    }
}

/// Modules listed even though the user cannot act on them.
fn shown_disabled(module: AccessModule, ctx: &AccessContext<'_>, show_ct: bool) -> bool {
    match module {
        AccessModule::Identity => !ctx.config.enable_ras_login_gov_linking,
        AccessModule::CtComplianceTraining => {
            show_ct && is_enabled_in_environment(module, ctx.config)
        }
        _ => false,
    }
}
