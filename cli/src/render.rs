//! Plain-text output for the terminal.

use std::fmt::Write as _;

use workbench_access::{
    AccessContext, AccessPlan, ModuleRow, PageMode, days_until_expiration,
    has_registered_tier_expired, module_title, renewal_display,
};
use workbench_types::{AccessTier, Runtime, RuntimePreset, RuntimeStatus};

/// One line describing the current runtime.
pub fn runtime_line(runtime: Option<&Runtime>) -> String {
    let Some(runtime) = runtime else {
        return "no runtime".to_string();
    };
    let status = runtime
        .status
        .map_or("Unknown", RuntimeStatus::as_str);
    let mut line = format!("{} {status}", runtime.display_id());
    if let Some(preset) = runtime
        .configuration_type
        .and_then(RuntimePreset::for_configuration_type)
    {
        let _ = write!(line, " ({})", preset.display_name());
    }
    line
}

fn row_marker(row: &ModuleRow, mode: PageMode) -> &'static str {
    let done = match mode {
        PageMode::InitialRegistration => row.compliant,
        PageMode::AnnualRenewal => row.renewal_complete,
    };
    if !row.eligible {
        "-"
    } else if done {
        "x"
    } else if row.focused {
        ">"
    } else {
        " "
    }
}

pub fn access_report(plan: &AccessPlan, ctx: &AccessContext<'_>) -> String {
    let mut out = String::new();
    let title = match plan.mode {
        PageMode::InitialRegistration => "Data access requirements",
        PageMode::AnnualRenewal => "Annual renewal",
    };
    let _ = writeln!(out, "{title} for {}", ctx.profile.username);
    if ctx.profile.disabled {
        out.push_str("This account is disabled.\n");
    }

    for row in &plan.rows {
        let _ = write!(
            out,
            "[{}] {:<34}",
            row_marker(row, plan.mode),
            module_title(row.module, ctx.config)
        );
        if plan.mode == PageMode::AnnualRenewal {
            let display = renewal_display(&row.status, ctx);
            let _ = write!(
                out,
                " {:<24} last {} / next {}",
                display.status.label(),
                display.last_confirmed_date,
                display.next_review_date
            );
            if let Some(minutes) = row.module.renewal_time_estimate()
                && row.eligible
                && !row.renewal_complete
            {
                let _ = write!(out, " (~{minutes} min)");
            }
        } else if !row.eligible {
            out.push_str(" unavailable");
        }
        out.push('\n');
    }

    if plan.complete {
        out.push_str("All required modules are complete.\n");
    } else if let Some(focused) = plan.focused {
        let _ = writeln!(out, "Next: {}", module_title(focused, ctx.config));
    }
    if plan.self_bypass_available {
        out.push_str("Self-bypass is enabled: `workbench access bypass`.\n");
    }

    if has_registered_tier_expired(ctx) {
        out.push_str("Registered Tier access has expired.\n");
    } else if let Some(days) = days_until_expiration(ctx, AccessTier::Registered) {
        let _ = writeln!(
            out,
            "{} access expires in {days} day(s).",
            AccessTier::Registered.display_name()
        );
    }
    out
}
