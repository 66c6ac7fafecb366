use std::path::PathBuf;

use thiserror::Error;
use triport_core::PackageSpec;

/// Conditions the remove flow has to tell apart from ordinary I/O failures.
///
/// These travel inside `anyhow::Error`; use `downcast_ref::<RemoveError>()`
/// to inspect them.
#[derive(Debug, Error)]
pub enum RemoveError {
    #[error("status database is corrupt ({}): {detail}", .path.display())]
    DatabaseCorrupt { path: PathBuf, detail: String },

    #[error("remove plan cannot be empty")]
    EmptyPlan,

    #[error("package {0} is missing from the status database")]
    PackageNotFound(PackageSpec),

    #[error("plan action for {0} has no executable plan type")]
    UnexpectedPlanType(PackageSpec),

    #[error("cannot specify both --no-purge and --purge")]
    ConflictingPurgeFlags,

    #[error(
        "additional packages need to be removed ({}); rerun with --recurse to remove them",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    RecursionRequired(Vec<PackageSpec>),

    #[error("--outdated does not accept package arguments")]
    OutdatedTakesNoSpecs,

    #[error("at least one package must be given")]
    MissingSpecs,
}
