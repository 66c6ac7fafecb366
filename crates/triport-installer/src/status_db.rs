use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use triport_core::PackageSpec;

use crate::fs_utils::{remove_file_if_exists, write_synced_then_rename};
use crate::{
    parse_status_paragraphs, serialize_status_paragraph, InstallLayout, InstallState,
    RemoveError, StatusParagraph,
};

/// Every status record the install root knows about, keyed by spec.
///
/// On disk this is `state/status` plus one file per pending update under
/// `state/updates`. Updates are written one paragraph at a time so each
/// state transition survives a crash on its own.
#[derive(Debug, Clone, Default)]
pub struct StatusDatabase {
    paragraphs: BTreeMap<PackageSpec, StatusParagraph>,
    next_update_id: u64,
}

impl StatusDatabase {
    /// Loads the status file, replays pending updates and compacts the
    /// result back into a single status file.
    pub fn load(layout: &InstallLayout) -> Result<Self> {
        let mut paragraphs = BTreeMap::new();

        let status_path = layout.status_path();
        if let Some(raw) = read_optional(&status_path)? {
            for paragraph in parse_store_document(&status_path, &raw)? {
                paragraphs.insert(paragraph.spec().clone(), paragraph);
            }
        }

        let updates = pending_updates(layout)?;
        for (id, path) in &updates {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read status update: {}", path.display()))?;
            for paragraph in parse_store_document(path, &raw)? {
                debug!(update = id, spec = %paragraph.spec(), state = %paragraph.state, "replaying status update");
                paragraphs.insert(paragraph.spec().clone(), paragraph);
            }
        }

        let mut db = Self {
            paragraphs,
            next_update_id: 0,
        };
        db.compact(layout, &updates)?;
        Ok(db)
    }

    pub fn find(&self, name: &str, triplet: &str) -> Option<&StatusParagraph> {
        let spec = PackageSpec::new(name, triplet).ok()?;
        self.paragraphs.get(&spec)
    }

    pub fn get(&self, spec: &PackageSpec) -> Option<&StatusParagraph> {
        self.paragraphs.get(spec)
    }

    /// A record that exists and has not reached `NotInstalled`.
    pub fn find_present(&self, spec: &PackageSpec) -> Option<&StatusParagraph> {
        self.get(spec)
            .filter(|paragraph| paragraph.state != InstallState::NotInstalled)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusParagraph> {
        self.paragraphs.values()
    }

    /// Durably records `paragraph`, then makes it the in-memory record for
    /// its spec. Intermediate states are expected; call once per transition.
    pub fn write_update(&mut self, layout: &InstallLayout, paragraph: StatusParagraph) -> Result<()> {
        let updates_dir = layout.updates_dir();
        fs::create_dir_all(&updates_dir)
            .with_context(|| format!("failed to create {}", updates_dir.display()))?;

        let id = self.next_update_id;
        let path = layout.update_path(id);
        write_synced_then_rename(
            &layout.incomplete_update_path(),
            &path,
            serialize_status_paragraph(&paragraph).as_bytes(),
        )
        .with_context(|| format!("failed to write status update: {}", path.display()))?;
        self.next_update_id = id + 1;

        debug!(
            spec = %paragraph.spec(),
            want = paragraph.want.as_str(),
            state = %paragraph.state,
            update = id,
            "persisted status update"
        );
        self.paragraphs.insert(paragraph.spec().clone(), paragraph);
        Ok(())
    }

    fn compact(&mut self, layout: &InstallLayout, applied: &[(u64, PathBuf)]) -> Result<()> {
        let dropped = self
            .paragraphs
            .values()
            .filter(|paragraph| paragraph.is_purged())
            .count();
        if applied.is_empty() && dropped == 0 {
            return Ok(());
        }

        self.paragraphs.retain(|_, paragraph| !paragraph.is_purged());
        let document = self
            .paragraphs
            .values()
            .map(serialize_status_paragraph)
            .collect::<Vec<_>>()
            .join("\n");

        let state_dir = layout.state_dir();
        fs::create_dir_all(&state_dir)
            .with_context(|| format!("failed to create {}", state_dir.display()))?;
        let status_path = layout.status_path();
        write_synced_then_rename(
            &layout.status_rewrite_path(),
            &status_path,
            document.as_bytes(),
        )
        .with_context(|| format!("failed to rewrite status file: {}", status_path.display()))?;

        for (_, path) in applied {
            remove_file_if_exists(path)
                .with_context(|| format!("failed to remove status update: {}", path.display()))?;
        }
        debug!(
            applied = applied.len(),
            dropped, "compacted status database"
        );
        Ok(())
    }
}

fn parse_store_document(path: &Path, raw: &str) -> Result<Vec<StatusParagraph>> {
    parse_status_paragraphs(raw).map_err(|err| {
        RemoveError::DatabaseCorrupt {
            path: path.to_path_buf(),
            detail: format!("{err:#}"),
        }
        .into()
    })
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("failed to read status file: {}", path.display()))
        }
    }
}

/// Numbered update files in apply order. A leftover `incomplete` file is a
/// torn write from an interrupted run and is discarded.
fn pending_updates(layout: &InstallLayout) -> Result<Vec<(u64, PathBuf)>> {
    let dir = layout.updates_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut updates = Vec::new();
    for entry in fs::read_dir(&dir)
        .with_context(|| format!("failed to read status updates directory: {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|v| v.to_str()) else {
            continue;
        };
        if file_name == "incomplete" {
            remove_file_if_exists(&path)
                .with_context(|| format!("failed to discard torn update: {}", path.display()))?;
            continue;
        }
        let id = file_name.parse::<u64>().map_err(|_| RemoveError::DatabaseCorrupt {
            path: path.clone(),
            detail: "unexpected file in status updates directory".to_string(),
        })?;
        updates.push((id, path));
    }

    updates.sort_by_key(|(id, _)| *id);
    Ok(updates)
}
