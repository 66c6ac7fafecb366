use anyhow::Result;
use triport_installer::{
    PackageRemovalReport, PurgeOutcome, RemovalEvent, RemoveError, RemovePlanAction,
    RemovePlanType, RequestType,
};

use crate::render::{render_status_line, OutputStyle};

/// Renders a remove plan for confirmation: not-installed entries first, then
/// the removals, each group sorted by spec. Automatically removed packages
/// carry a `*` marker. An action without a plan type is an error.
pub(crate) fn format_remove_plan(plan: &[RemovePlanAction]) -> Result<Vec<String>> {
    let mut not_installed = Vec::new();
    let mut remove = Vec::new();
    for action in plan {
        match action.plan_type {
            RemovePlanType::NotInstalled => not_installed.push(action),
            RemovePlanType::Remove => remove.push(action),
            RemovePlanType::Unknown => {
                return Err(RemoveError::UnexpectedPlanType(action.spec.clone()).into());
            }
        }
    }

    let mut lines = Vec::new();
    if !not_installed.is_empty() {
        not_installed.sort_by(|a, b| a.spec.cmp(&b.spec));
        lines.push("The following packages are not installed, so not removed:".to_string());
        lines.extend(not_installed.into_iter().map(format_plan_entry));
    }
    if !remove.is_empty() {
        remove.sort_by(|a, b| a.spec.cmp(&b.spec));
        lines.push("The following packages will be removed:".to_string());
        lines.extend(remove.into_iter().map(format_plan_entry));
    }
    Ok(lines)
}

fn format_plan_entry(action: &RemovePlanAction) -> String {
    match action.request_type {
        RequestType::UserRequested => format!("    {}", action.spec),
        RequestType::AutomaticallyRemoved => format!("  * {}", action.spec),
    }
}

pub(crate) fn format_removal_event(event: &RemovalEvent<'_>, style: OutputStyle) -> Vec<String> {
    match event {
        RemovalEvent::NotInstalled(spec) => vec![render_status_line(
            style,
            "ok",
            &format!("package {spec} is not installed"),
        )],
        RemovalEvent::Removing(spec) => vec![render_status_line(
            style,
            "step",
            &format!("removing package {spec}..."),
        )],
        RemovalEvent::Removed(report) => format_removal_report(report, style),
        RemovalEvent::Purged { spec, outcome } => match outcome {
            PurgeOutcome::Cleaned(path) => vec![render_status_line(
                style,
                "ok",
                &format!("purged package {spec}: cleaned up {}", path.display()),
            )],
            PurgeOutcome::Missing(_) => Vec::new(),
            PurgeOutcome::Residual { path, error } => {
                let detail = error
                    .as_deref()
                    .map(|error| format!(" ({error})"))
                    .unwrap_or_default();
                vec![render_status_line(
                    style,
                    "warn",
                    &format!(
                        "some files in {} were unable to be removed{detail}; close any editors operating in this directory and retry",
                        path.display()
                    ),
                )]
            }
        },
    }
}

fn format_removal_report(report: &PackageRemovalReport, style: OutputStyle) -> Vec<String> {
    let mut lines = Vec::new();
    for failure in &report.failures {
        lines.push(render_status_line(
            style,
            "error",
            &format!("failed: {}: {}", failure.path.display(), failure.reason),
        ));
    }
    for warning in &report.warnings {
        lines.push(render_status_line(style, "warn", warning));
    }
    for dir in &report.kept_dirs {
        lines.push(render_status_line(
            style,
            "warn",
            &format!("kept non-empty directory {}", dir.display()),
        ));
    }
    lines.push(render_status_line(
        style,
        "ok",
        &format!(
            "removed package {} ({} files, {} directories)",
            report.spec,
            report.removed_files.len(),
            report.removed_dirs.len()
        ),
    ));
    lines
}
