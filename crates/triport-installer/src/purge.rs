use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use triport_core::PackageSpec;

use crate::InstallLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    Cleaned(PathBuf),
    Missing(PathBuf),
    /// Something under the directory survived, usually a file held open by
    /// another process.
    Residual {
        path: PathBuf,
        error: Option<String>,
    },
}

/// Deletes the staging directory of `spec`. Never fails: leftovers are
/// reported as `Residual`.
pub fn purge_package_dir(layout: &InstallLayout, spec: &PackageSpec) -> PurgeOutcome {
    let path = layout.package_dir(spec);
    if fs::symlink_metadata(&path).is_err() {
        return PurgeOutcome::Missing(path);
    }

    let result = fs::remove_dir_all(&path);
    if fs::symlink_metadata(&path).is_ok() {
        let error = result.err().map(|err| err.to_string());
        warn!(path = %path.display(), error = ?error, "package directory not fully purged");
        return PurgeOutcome::Residual { path, error };
    }

    debug!(path = %path.display(), "purged package directory");
    PurgeOutcome::Cleaned(path)
}
