use anyhow::Result;
use tracing::info;

use triport_core::PackageSpec;
use triport_installer::{
    create_remove_plan, execute_remove_plan, InstallLayout, RemovalEvent, RemovalOptions,
    RemoveError, RemovePlanAction, RemovePlanType, StatusDatabase,
};
use triport_registry::{find_outdated_packages, PortIndex};

use crate::presenter::{format_remove_plan, format_removal_event};
use crate::render::{render_status_line, OutputStyle, TerminalRenderer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RemoveRequest {
    pub(crate) specs: Vec<String>,
    pub(crate) purge: bool,
    pub(crate) no_purge: bool,
    pub(crate) recurse: bool,
    pub(crate) dry_run: bool,
    pub(crate) outdated: bool,
}

/// Whether staging directories should be purged; both flags together is a
/// usage error.
pub(crate) fn resolve_purge(request: &RemoveRequest) -> Result<bool> {
    if request.purge && request.no_purge {
        return Err(RemoveError::ConflictingPurgeFlags.into());
    }
    Ok(!request.no_purge)
}

fn collect_target_specs(
    layout: &InstallLayout,
    db: &StatusDatabase,
    request: &RemoveRequest,
    default_triplet: &str,
) -> Result<Vec<PackageSpec>> {
    if request.outdated {
        let index = PortIndex::open(layout.ports_dir());
        let outdated = find_outdated_packages(&index, db)?;
        return Ok(outdated.into_iter().map(|package| package.spec).collect());
    }

    request
        .specs
        .iter()
        .map(|raw| PackageSpec::parse(raw, default_triplet))
        .collect()
}

fn automatically_removed(plan: &[RemovePlanAction]) -> Vec<PackageSpec> {
    let mut specs = plan
        .iter()
        .filter(|action| !action.is_user_requested())
        .map(|action| action.spec.clone())
        .collect::<Vec<_>>();
    specs.sort();
    specs
}

pub(crate) fn run_remove_command(
    layout: &InstallLayout,
    request: &RemoveRequest,
    default_triplet: &str,
    output_style: OutputStyle,
) -> Result<()> {
    let purge = resolve_purge(request)?;
    if request.outdated && !request.specs.is_empty() {
        return Err(RemoveError::OutdatedTakesNoSpecs.into());
    }
    if !request.outdated && request.specs.is_empty() {
        return Err(RemoveError::MissingSpecs.into());
    }

    let mut db = StatusDatabase::load(layout)?;
    let specs = collect_target_specs(layout, &db, request, default_triplet)?;
    let plan = create_remove_plan(&specs, &db)?;

    let plan_lines = format_remove_plan(&plan)?;
    let renderer = TerminalRenderer::from_style(output_style);
    renderer.print_section("Remove plan");
    renderer.print_lines(&plan_lines);

    let dependents = automatically_removed(&plan);
    if !dependents.is_empty() {
        println!(
            "{}",
            render_status_line(
                output_style,
                "warn",
                "additional packages (*) need to be removed to complete this operation"
            )
        );
        if !request.recurse {
            return Err(RemoveError::RecursionRequired(dependents).into());
        }
    }

    if request.dry_run {
        info!(actions = plan.len(), "dry run; nothing removed");
        return Ok(());
    }

    layout.ensure_base_dirs()?;
    let removals = plan
        .iter()
        .filter(|action| action.plan_type == RemovePlanType::Remove)
        .count() as u64;
    let mut progress = renderer.start_progress("remove", removals);
    let result = execute_remove_plan(
        layout,
        &mut db,
        &plan,
        RemovalOptions { purge },
        |event| {
            for line in format_removal_event(&event, output_style) {
                progress.println(&line);
            }
            if matches!(event, RemovalEvent::Removed(_)) {
                progress.advance();
            }
        },
    );
    progress.finish();
    result?;

    Ok(())
}
