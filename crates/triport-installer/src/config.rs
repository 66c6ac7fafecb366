use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::io;

use triport_core::is_valid_identifier;

use crate::InstallLayout;

/// Optional `triport.toml` at the root of an install layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootConfig {
    pub default_triplet: Option<String>,
}

impl RootConfig {
    pub fn load(layout: &InstallLayout) -> Result<Self> {
        let path = layout.config_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config: {}", path.display()));
            }
        };

        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        if let Some(triplet) = &config.default_triplet {
            if !is_valid_identifier(triplet) {
                return Err(anyhow!(
                    "invalid default_triplet '{triplet}' in {}",
                    path.display()
                ));
            }
        }
        Ok(config)
    }
}

/// Picks the triplet for specs given without one: explicit flag, then
/// `TRIPORT_DEFAULT_TRIPLET`, then the root config, then the host.
pub fn default_triplet(flag: Option<&str>, config: &RootConfig) -> String {
    if let Some(triplet) = flag {
        return triplet.to_string();
    }
    if let Ok(triplet) = std::env::var("TRIPORT_DEFAULT_TRIPLET") {
        if !triplet.trim().is_empty() {
            return triplet.trim().to_string();
        }
    }
    if let Some(triplet) = &config.default_triplet {
        return triplet.clone();
    }
    host_triplet().to_string()
}

pub fn host_triplet() -> &'static str {
    match (std::env::consts::ARCH, std::env::consts::OS) {
        ("x86_64", "linux") => "x64-linux",
        ("aarch64", "linux") => "arm64-linux",
        ("x86_64", "macos") => "x64-osx",
        ("aarch64", "macos") => "arm64-osx",
        ("x86_64", "windows") => "x64-windows",
        ("aarch64", "windows") => "arm64-windows",
        ("x86", "windows") => "x86-windows",
        _ => "x64-linux",
    }
}
