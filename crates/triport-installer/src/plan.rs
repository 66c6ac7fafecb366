use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use triport_core::PackageSpec;

use crate::{RemoveError, StatusDatabase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovePlanType {
    NotInstalled,
    Remove,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequestType {
    UserRequested,
    AutomaticallyRemoved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovePlanAction {
    pub spec: PackageSpec,
    pub plan_type: RemovePlanType,
    pub request_type: RequestType,
}

impl RemovePlanAction {
    pub fn is_user_requested(&self) -> bool {
        self.request_type == RequestType::UserRequested
    }
}

/// Computes everything that has to go when `specs` are removed.
///
/// Requested specs that are absent (or already `NotInstalled`) are reported
/// as `NotInstalled`. Every present package that depends, directly or
/// transitively, on something being removed is added as
/// `AutomaticallyRemoved`; a package that was also requested stays
/// `UserRequested`.
///
/// The returned order is the execution order: dependents always come before
/// the packages they depend on. The database is only read.
pub fn create_remove_plan(
    specs: &[PackageSpec],
    db: &StatusDatabase,
) -> Result<Vec<RemovePlanAction>> {
    if specs.is_empty() {
        return Err(RemoveError::EmptyPlan.into());
    }

    let requested: HashSet<&PackageSpec> = specs.iter().collect();
    let dependents = dependents_map(db);

    let mut plan = Vec::new();
    let mut visited: HashSet<PackageSpec> = HashSet::new();
    for root in specs {
        let mut stack = vec![(root.clone(), false)];
        while let Some((next, expanded)) = stack.pop() {
            if expanded {
                let plan_type = if db.find_present(&next).is_some() {
                    RemovePlanType::Remove
                } else {
                    RemovePlanType::NotInstalled
                };
                let request_type = if requested.contains(&next) {
                    RequestType::UserRequested
                } else {
                    RequestType::AutomaticallyRemoved
                };
                plan.push(RemovePlanAction {
                    spec: next,
                    plan_type,
                    request_type,
                });
                continue;
            }

            if !visited.insert(next.clone()) {
                continue;
            }
            stack.push((next.clone(), true));

            if db.find_present(&next).is_none() {
                continue;
            }
            if let Some(children) = dependents.get(&next) {
                for child in children.iter().rev() {
                    if !visited.contains(child) {
                        stack.push((child.clone(), false));
                    }
                }
            }
        }
    }

    if plan.is_empty() {
        return Err(RemoveError::EmptyPlan.into());
    }

    debug!(
        requested = specs.len(),
        planned = plan.len(),
        "built remove plan"
    );
    Ok(plan)
}

/// Reverse dependency edges between present packages: dependency -> the
/// packages that declare it.
fn dependents_map(db: &StatusDatabase) -> BTreeMap<PackageSpec, BTreeSet<PackageSpec>> {
    let mut dependents: BTreeMap<PackageSpec, BTreeSet<PackageSpec>> = BTreeMap::new();
    for paragraph in db.iter().filter(|p| db.find_present(p.spec()).is_some()) {
        for dependency in paragraph.package.dependency_specs() {
            if &dependency == paragraph.spec() {
                continue;
            }
            dependents
                .entry(dependency)
                .or_default()
                .insert(paragraph.spec().clone());
        }
    }
    dependents
}
