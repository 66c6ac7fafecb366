use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use triport_core::PackageSpec;

/// Where a package is in its install/remove lifecycle.
///
/// `HalfInstalled` is the checkpoint written before any filesystem mutation;
/// finding it on load means the last mutation never completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    NotInstalled,
    HalfInstalled,
    Installed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Want {
    Install,
    Hold,
    Purge,
}

impl InstallState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotInstalled => "not-installed",
            Self::HalfInstalled => "half-installed",
            Self::Installed => "installed",
        }
    }

    pub(crate) fn parse(value: &str) -> Result<Self> {
        match value {
            "not-installed" => Ok(Self::NotInstalled),
            "half-installed" => Ok(Self::HalfInstalled),
            "installed" => Ok(Self::Installed),
            _ => Err(anyhow!("invalid install state: {value}")),
        }
    }
}

impl Want {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Hold => "hold",
            Self::Purge => "purge",
        }
    }

    pub(crate) fn parse(value: &str) -> Result<Self> {
        match value {
            "install" => Ok(Self::Install),
            "hold" => Ok(Self::Hold),
            "purge" => Ok(Self::Purge),
            _ => Err(anyhow!("invalid want: {value}")),
        }
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The package half of a status record: what was built and what it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryParagraph {
    pub spec: PackageSpec,
    pub version: String,
    pub description: Option<String>,
    pub depends: Vec<String>,
}

impl BinaryParagraph {
    /// Resolves `depends` into specs. Bare names share this package's
    /// triplet. Loaded records are validated already, so a malformed entry
    /// can only come from a hand-built paragraph; it is logged and skipped.
    pub fn dependency_specs(&self) -> Vec<PackageSpec> {
        self.depends
            .iter()
            .filter_map(|entry| match PackageSpec::parse(entry, self.spec.triplet()) {
                Ok(spec) => Some(spec),
                Err(err) => {
                    warn!(package = %self.spec, entry = %entry, "skipping malformed dependency: {err:#}");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusParagraph {
    pub package: BinaryParagraph,
    pub want: Want,
    pub state: InstallState,
}

impl StatusParagraph {
    pub fn spec(&self) -> &PackageSpec {
        &self.package.spec
    }

    pub fn is_installed(&self) -> bool {
        self.state == InstallState::Installed
    }

    /// Purged and fully removed records carry no information worth keeping.
    pub fn is_purged(&self) -> bool {
        self.want == Want::Purge && self.state == InstallState::NotInstalled
    }

    fn from_fields(fields: &BTreeMap<String, String>) -> Result<Self> {
        let name = fields.get("Package").context("missing Package field")?;
        let triplet = fields
            .get("Architecture")
            .context("missing Architecture field")?;
        let spec = PackageSpec::new(name.as_str(), triplet.as_str())?;
        let status = fields.get("Status").context("missing Status field")?;
        let (want, state) = parse_status_field(status)?;

        let depends: Vec<String> = fields
            .get("Depends")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        for entry in &depends {
            PackageSpec::parse(entry, spec.triplet())
                .with_context(|| format!("invalid Depends entry '{entry}' for {spec}"))?;
        }

        Ok(Self {
            package: BinaryParagraph {
                spec,
                version: fields.get("Version").cloned().unwrap_or_default(),
                description: fields.get("Description").cloned(),
                depends,
            },
            want,
            state,
        })
    }
}

fn parse_status_field(value: &str) -> Result<(Want, InstallState)> {
    let tokens = value.split_whitespace().collect::<Vec<_>>();
    let [want, "ok", state] = tokens.as_slice() else {
        return Err(anyhow!("malformed Status field: '{value}'"));
    };
    Ok((Want::parse(want)?, InstallState::parse(state)?))
}

pub fn serialize_status_paragraph(paragraph: &StatusParagraph) -> String {
    let package = &paragraph.package;
    let mut payload = String::new();
    payload.push_str(&format!("Package: {}\n", package.spec.name()));
    if !package.version.is_empty() {
        payload.push_str(&format!("Version: {}\n", package.version));
    }
    if !package.depends.is_empty() {
        payload.push_str(&format!("Depends: {}\n", package.depends.join(", ")));
    }
    payload.push_str(&format!("Architecture: {}\n", package.spec.triplet()));
    if let Some(description) = &package.description {
        let mut lines = description.lines();
        payload.push_str(&format!("Description: {}\n", lines.next().unwrap_or_default()));
        for continuation in lines {
            if continuation.trim().is_empty() {
                payload.push_str("    .\n");
            } else {
                payload.push_str(&format!("    {continuation}\n"));
            }
        }
    }
    payload.push_str(&format!(
        "Status: {} ok {}\n",
        paragraph.want.as_str(),
        paragraph.state.as_str()
    ));
    payload
}

/// Parses a status document: blank-line separated paragraphs of
/// `Field: value` lines, indented lines continuing the previous field. An
/// indented `.` stands for an empty continuation line.
pub fn parse_status_paragraphs(raw: &str) -> Result<Vec<StatusParagraph>> {
    let mut paragraphs = Vec::new();
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    let mut last_field: Option<String> = None;
    let mut start_line = 1_usize;

    for (index, line) in raw.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            if !fields.is_empty() {
                paragraphs.push(
                    StatusParagraph::from_fields(&fields)
                        .with_context(|| format!("invalid paragraph at line {start_line}"))?,
                );
                fields.clear();
            }
            last_field = None;
            continue;
        }

        if fields.is_empty() {
            start_line = line_no;
        }

        if line.starts_with([' ', '\t']) {
            let field = last_field
                .as_ref()
                .ok_or_else(|| anyhow!("continuation line without a field at line {line_no}"))?;
            if let Some(value) = fields.get_mut(field) {
                value.push('\n');
                let continuation = line.trim();
                if continuation != "." {
                    value.push_str(continuation);
                }
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            return Err(anyhow!("expected 'Field: value' at line {line_no}"));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("empty field name at line {line_no}"));
        }
        fields.insert(key.to_string(), value.trim().to_string());
        last_field = Some(key.to_string());
    }

    if !fields.is_empty() {
        paragraphs.push(
            StatusParagraph::from_fields(&fields)
                .with_context(|| format!("invalid paragraph at line {start_line}"))?,
        );
    }

    Ok(paragraphs)
}
