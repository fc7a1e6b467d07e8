//! Byte-exact store file I/O
//!
//! Encrypted store contents are arbitrary bytes, so nothing here goes
//! through a text codec.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::format::EMPTY_LIST;
use crate::error::{Result, VaultError};

/// Read the store file; a missing file reads as the empty list `[]`
pub fn read_store_file(path: &Path) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(contents) => {
            debug!("Read {} bytes from {:?}", contents.len(), path);
            Ok(contents)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No store file at {:?}, starting empty", path);
            Ok(EMPTY_LIST.to_vec())
        }
        Err(e) => Err(VaultError::ReadError(e)),
    }
}

/// Replace the file at `path` with `contents`
///
/// Parent directories are created as needed. The data goes to a sibling
/// temporary file first and is renamed over the target, so the target
/// is never left half-written.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(VaultError::WriteError)?;
    }

    let temp_path = temp_path_for(path);
    if let Err(e) = write_and_sync(&temp_path, contents) {
        let _ = fs::remove_file(&temp_path);
        return Err(VaultError::WriteError(e));
    }
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(VaultError::WriteError(e));
    }

    debug!("Wrote {} bytes to {:?}", contents.len(), path);
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

fn write_and_sync(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
