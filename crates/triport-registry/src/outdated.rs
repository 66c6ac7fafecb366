use anyhow::Result;
use tracing::debug;

use triport_core::PackageSpec;
use triport_installer::StatusDatabase;

use crate::PortIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutdatedPackage {
    pub spec: PackageSpec,
    pub installed_version: String,
    pub available_version: String,
}

/// Installed packages whose port now carries a newer version, sorted by
/// spec. Packages without a port are skipped.
pub fn find_outdated_packages(
    index: &PortIndex,
    db: &StatusDatabase,
) -> Result<Vec<OutdatedPackage>> {
    let mut outdated = Vec::new();
    for paragraph in db.iter().filter(|paragraph| paragraph.is_installed()) {
        let Some(port) = index.port(paragraph.spec().name())? else {
            debug!(spec = %paragraph.spec(), "no port for installed package");
            continue;
        };
        if port.is_newer_than(&paragraph.package.version) {
            outdated.push(OutdatedPackage {
                spec: paragraph.spec().clone(),
                installed_version: paragraph.package.version.clone(),
                available_version: port.version,
            });
        }
    }

    outdated.sort_by(|a, b| a.spec.cmp(&b.spec));
    Ok(outdated)
}
