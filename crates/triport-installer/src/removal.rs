use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use triport_core::PackageSpec;

use crate::fs_utils::{dir_is_empty, remove_file_if_exists};
use crate::{
    purge_package_dir, read_listfile, InstallLayout, InstallState, PurgeOutcome, RemoveError,
    RemovePlanAction, RemovePlanType, StatusDatabase, StatusParagraph, Want,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalOptions {
    /// Also delete each removed package's staging directory.
    pub purge: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// What happened to one package's files. Failures here never abort the
/// removal; they are surfaced to the operator instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRemovalReport {
    pub spec: PackageSpec,
    pub listfile_found: bool,
    pub removed_files: Vec<PathBuf>,
    pub removed_dirs: Vec<PathBuf>,
    /// Listed directories left in place because something else still lives
    /// in them.
    pub kept_dirs: Vec<PathBuf>,
    pub failures: Vec<DeletionFailure>,
    pub warnings: Vec<String>,
}

impl PackageRemovalReport {
    fn new(spec: PackageSpec) -> Self {
        Self {
            spec,
            listfile_found: false,
            removed_files: Vec::new(),
            removed_dirs: Vec::new(),
            kept_dirs: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn record_failure(&mut self, path: &Path, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(spec = %self.spec, path = %path.display(), %reason, "failed to delete");
        self.failures.push(DeletionFailure {
            path: path.to_path_buf(),
            reason,
        });
    }

    fn record_warning(&mut self, message: String) {
        warn!(spec = %self.spec, "{message}");
        self.warnings.push(message);
    }
}

#[derive(Debug, Clone, Copy)]
pub enum RemovalEvent<'a> {
    NotInstalled(&'a PackageSpec),
    Removing(&'a PackageSpec),
    Removed(&'a PackageRemovalReport),
    Purged {
        spec: &'a PackageSpec,
        outcome: &'a PurgeOutcome,
    },
}

/// Marks `spec` as being removed (`want=purge`, `state=half-installed`) and
/// persists that before anything on disk is touched.
pub fn begin_removal(
    layout: &InstallLayout,
    db: &mut StatusDatabase,
    spec: &PackageSpec,
) -> Result<StatusParagraph> {
    let mut paragraph = db
        .get(spec)
        .cloned()
        .ok_or_else(|| RemoveError::PackageNotFound(spec.clone()))?;

    paragraph.want = Want::Purge;
    paragraph.state = InstallState::HalfInstalled;
    db.write_update(layout, paragraph.clone())?;
    debug!(%spec, "removal checkpoint written");
    Ok(paragraph)
}

/// Deletes everything the package's listfile names, then the listfile, then
/// records the package as `not-installed`.
pub fn finish_removal(
    layout: &InstallLayout,
    db: &mut StatusDatabase,
    mut paragraph: StatusParagraph,
) -> Result<PackageRemovalReport> {
    let mut report = PackageRemovalReport::new(paragraph.spec().clone());
    let listfile = layout.listfile_path(&paragraph.package);

    match read_listfile(&listfile) {
        Ok(Some(entries)) => {
            report.listfile_found = true;
            remove_listed_entries(&layout.installed_dir(), &entries, &mut report);
            if let Err(err) = remove_file_if_exists(&listfile) {
                report.record_failure(&listfile, err.to_string());
            }
        }
        Ok(None) => {
            debug!(spec = %report.spec, "no listfile; nothing to delete");
        }
        Err(err) => {
            // The listfile is the only record of what the package owns.
            report.record_failure(&listfile, format!("{err:#}"));
            report.record_warning(format!(
                "kept unreadable listfile {}; files it lists may remain",
                listfile.display()
            ));
        }
    }

    paragraph.state = InstallState::NotInstalled;
    db.write_update(layout, paragraph)?;
    debug!(spec = %report.spec, "removal complete");
    Ok(report)
}

pub fn remove_package(
    layout: &InstallLayout,
    db: &mut StatusDatabase,
    spec: &PackageSpec,
) -> Result<PackageRemovalReport> {
    let paragraph = begin_removal(layout, db, spec)?;
    finish_removal(layout, db, paragraph)
}

/// Applies `plan` in order. `NotInstalled` actions are only reported;
/// `Remove` actions run the full two-phase removal and, with
/// `options.purge`, delete the staging directory afterwards.
pub fn execute_remove_plan<F>(
    layout: &InstallLayout,
    db: &mut StatusDatabase,
    plan: &[RemovePlanAction],
    options: RemovalOptions,
    mut on_event: F,
) -> Result<Vec<PackageRemovalReport>>
where
    F: FnMut(RemovalEvent<'_>),
{
    let mut reports = Vec::new();
    for action in plan {
        match action.plan_type {
            RemovePlanType::NotInstalled => {
                on_event(RemovalEvent::NotInstalled(&action.spec));
            }
            RemovePlanType::Remove => {
                on_event(RemovalEvent::Removing(&action.spec));
                let report = remove_package(layout, db, &action.spec)?;
                on_event(RemovalEvent::Removed(&report));

                if options.purge {
                    let outcome = purge_package_dir(layout, &action.spec);
                    on_event(RemovalEvent::Purged {
                        spec: &action.spec,
                        outcome: &outcome,
                    });
                }
                reports.push(report);
            }
            RemovePlanType::Unknown => {
                return Err(RemoveError::UnexpectedPlanType(action.spec.clone()).into());
            }
        }
    }
    Ok(reports)
}

fn remove_listed_entries(
    install_root: &Path,
    entries: &[PathBuf],
    report: &mut PackageRemovalReport,
) {
    let mut dirs_touched = Vec::new();
    let mut dirs_seen = HashSet::new();

    for entry in entries {
        let Some(target) = resolve_listed_path(install_root, entry) else {
            report.record_warning(format!(
                "ignoring listfile entry outside install root: {}",
                entry.display()
            ));
            continue;
        };

        let metadata = match fs::symlink_metadata(&target) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                report.record_warning(format!("{}: already missing", target.display()));
                continue;
            }
            Err(err) => {
                report.record_warning(format!("{}: unknown status: {err}", target.display()));
                continue;
            }
        };

        let file_type = metadata.file_type();
        if file_type.is_dir() {
            if dirs_seen.insert(target.clone()) {
                dirs_touched.push(target);
            }
        } else if file_type.is_file() || file_type.is_symlink() {
            match fs::remove_file(&target) {
                Ok(()) => report.removed_files.push(target),
                Err(err) => report.record_failure(&target, err.to_string()),
            }
        } else {
            report.record_warning(format!("{}: cannot handle file type", target.display()));
        }
    }

    // Last declared first; emptiness is checked at deletion time because the
    // listfile order is not guaranteed to be depth-first.
    for dir in dirs_touched.into_iter().rev() {
        match dir_is_empty(&dir) {
            Ok(true) => match fs::remove_dir(&dir) {
                Ok(()) => report.removed_dirs.push(dir),
                Err(err) => report.record_failure(&dir, err.to_string()),
            },
            Ok(false) => {
                debug!(spec = %report.spec, dir = %dir.display(), "directory not empty; keeping");
                report.kept_dirs.push(dir);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => report.record_failure(&dir, err.to_string()),
        }
    }
}

fn resolve_listed_path(install_root: &Path, entry: &Path) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in entry.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(install_root.join(relative))
}
