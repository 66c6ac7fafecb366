use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Writes `contents` to `staging`, syncs it, then renames it over `dest`.
pub fn write_synced_then_rename(staging: &Path, dest: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(staging)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);
    fs::rename(staging, dest)
}

pub fn dir_is_empty(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}
