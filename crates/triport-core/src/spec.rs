use std::fmt;

use anyhow::{anyhow, Result};

/// A package identity: port name plus the target triplet it was built for.
///
/// Ordering is by name first, then triplet, which is also the order plans
/// are displayed in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageSpec {
    name: String,
    triplet: String,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>, triplet: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let triplet = triplet.into();
        if !is_valid_identifier(&name) {
            return Err(anyhow!("invalid package name: '{name}'"));
        }
        if !is_valid_identifier(&triplet) {
            return Err(anyhow!("invalid triplet: '{triplet}'"));
        }
        Ok(Self { name, triplet })
    }

    /// Parses `name` or `name:triplet`, filling in `default_triplet` for the
    /// bare form.
    pub fn parse(input: &str, default_triplet: &str) -> Result<Self> {
        let trimmed = input.trim();
        match trimmed.split_once(':') {
            Some((name, triplet)) => Self::new(name, triplet),
            None => Self::new(trimmed, default_triplet),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triplet(&self) -> &str {
        &self.triplet
    }

    /// Directory name used for per-package staging areas.
    pub fn dir(&self) -> String {
        format!("{}_{}", self.name, self.triplet)
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.triplet)
    }
}

pub fn is_valid_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|ch| {
            ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '-' | '_' | '.')
        })
}
