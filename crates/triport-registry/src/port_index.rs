use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use triport_core::{is_valid_identifier, PortManifest};

/// The ports tree: one `<name>/port.toml` per available port.
#[derive(Debug, Clone)]
pub struct PortIndex {
    root: PathBuf,
}

impl PortIndex {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn port(&self, name: &str) -> Result<Option<PortManifest>> {
        if !is_valid_identifier(name) {
            return Ok(None);
        }

        let path = self.root.join(name).join("port.toml");
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed reading port manifest: {}", path.display()));
            }
        };

        let manifest = PortManifest::from_toml_str(&raw)
            .with_context(|| format!("failed parsing port manifest: {}", path.display()))?;
        if manifest.name != name {
            return Err(anyhow!(
                "port manifest {} declares name '{}'",
                path.display(),
                manifest.name
            ));
        }
        Ok(Some(manifest))
    }
}
