use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reads a package's file manifest. `Ok(None)` means the package has no
/// listfile, which is not an error.
///
/// Entries are kept byte-exact: a filename that is not valid UTF-8 still
/// names the file it was recorded for.
pub fn read_listfile(path: &Path) -> Result<Option<Vec<PathBuf>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read listfile: {}", path.display()));
        }
    };

    let entries = bytes
        .split(|byte| *byte == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(entry_path)
        .collect();
    Ok(Some(entries))
}

#[cfg(unix)]
fn entry_path(raw: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    PathBuf::from(OsStr::from_bytes(raw))
}

#[cfg(not(unix))]
fn entry_path(raw: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(raw).into_owned())
}
