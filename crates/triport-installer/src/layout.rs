use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use triport_core::PackageSpec;

use crate::BinaryParagraph;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory every listfile entry is relative to.
    pub fn installed_dir(&self) -> PathBuf {
        self.root.join("installed")
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    pub fn ports_dir(&self) -> PathBuf {
        self.root.join("ports")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    pub fn status_path(&self) -> PathBuf {
        self.state_dir().join("status")
    }

    pub fn status_rewrite_path(&self) -> PathBuf {
        self.state_dir().join("status-new")
    }

    pub fn updates_dir(&self) -> PathBuf {
        self.state_dir().join("updates")
    }

    pub fn update_path(&self, id: u64) -> PathBuf {
        self.updates_dir().join(format!("{id:010}"))
    }

    pub fn incomplete_update_path(&self) -> PathBuf {
        self.updates_dir().join("incomplete")
    }

    pub fn info_dir(&self) -> PathBuf {
        self.state_dir().join("info")
    }

    pub fn listfile_path(&self, package: &BinaryParagraph) -> PathBuf {
        self.info_dir().join(format!(
            "{}_{}_{}.list",
            package.spec.name(),
            package.version,
            package.spec.triplet()
        ))
    }

    /// Staging directory a package was built into before installation.
    pub fn package_dir(&self, spec: &PackageSpec) -> PathBuf {
        self.packages_dir().join(spec.dir())
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("triport.toml")
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [
            self.installed_dir(),
            self.packages_dir(),
            self.state_dir(),
            self.updates_dir(),
            self.info_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

pub fn default_root() -> Result<PathBuf> {
    if let Some(root) = std::env::var_os("TRIPORT_ROOT").filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(root));
    }

    if cfg!(windows) {
        let app_data = std::env::var("LOCALAPPDATA")
            .context("LOCALAPPDATA is not set; cannot resolve Windows triport root")?;
        return Ok(PathBuf::from(app_data).join("triport"));
    }

    let home = std::env::var("HOME").context("HOME is not set; cannot resolve triport root")?;
    Ok(PathBuf::from(home).join(".triport"))
}
