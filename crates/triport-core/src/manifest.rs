use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::spec::is_valid_identifier;

/// The `port.toml` describing the currently available version of a port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortManifest {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl PortManifest {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let manifest: Self = toml::from_str(input).context("failed to parse port manifest")?;
        if !is_valid_identifier(&manifest.name) {
            return Err(anyhow!("invalid port name: '{}'", manifest.name));
        }
        if manifest.version.trim().is_empty() {
            return Err(anyhow!("port '{}' has an empty version", manifest.name));
        }
        if manifest.dependencies.iter().any(|dep| dep == &manifest.name) {
            return Err(anyhow!("port '{}' depends on itself", manifest.name));
        }
        Ok(manifest)
    }

    /// Whether this port's version is newer than `installed`.
    ///
    /// Semver versions are compared numerically; anything else counts as
    /// newer whenever the strings differ.
    pub fn is_newer_than(&self, installed: &str) -> bool {
        match (
            semver::Version::parse(self.version.trim()),
            semver::Version::parse(installed.trim()),
        ) {
            (Ok(available), Ok(installed)) => available > installed,
            _ => self.version.trim() != installed.trim(),
        }
    }
}
