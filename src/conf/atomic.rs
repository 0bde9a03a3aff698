//! Atomic file replacement.
//!
//! The new contents go to a temporary file in the target's own directory
//! (same filesystem, so `rename(2)` is atomic), get the original's
//! permission bits, and are then renamed over the target.  A reader sees
//! either the old file or the new one, never a mix.

use super::PatchError;
use log::debug;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Replace `target` with `contents`.
///
/// `target` must already exist and should be the resolved (non-symlink)
/// path; renaming over a symlink would replace the link itself.  On any
/// error the temporary file is removed and `target` is left untouched.
pub fn write_atomically(target: &Path, contents: &[u8]) -> Result<(), PatchError> {
    let write_err = |source| PatchError::Write {
        path: target.to_path_buf(),
        source,
    };

    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "monitors.conf".into());
    let permissions = fs::metadata(target).map_err(write_err)?.permissions();

    // Dropping `tmp` on any early return deletes the temp file.
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{}.tmp.", file_name))
        .tempfile_in(dir)
        .map_err(write_err)?;
    debug!("writing {} bytes to {}", contents.len(), tmp.path().display());

    tmp.write_all(contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    fs::set_permissions(tmp.path(), permissions).map_err(write_err)?;

    tmp.persist(target).map_err(|e| write_err(e.error))?;
    debug!("renamed temp file over {}", target.display());
    Ok(())
}
