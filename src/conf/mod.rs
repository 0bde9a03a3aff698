//! Persisting a monitor's scale to Hyprland's `monitors.conf`.
//!
//! [`ConfPatcher`] ties the pieces together: it makes sure the file exists,
//! follows symlinks to the real file, edits it through the
//! [`document`] model and persists the result with
//! [`atomic::write_atomically`].

pub mod atomic;
pub mod document;

use crate::scale::format_scale;
use document::{Document, Edit};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors from reading or rewriting the configuration file.
///
/// None of these leave a partially written file behind.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("cannot create {}: {source}", .path.display())]
    Prepare { path: PathBuf, source: io::Error },
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("atomic write to {} failed: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Edits the scale entries of one configuration file.
#[derive(Debug, Clone)]
pub struct ConfPatcher {
    path: PathBuf,
}

impl ConfPatcher {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The configured (possibly symlinked) path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `scale` as `monitor`'s scale.
    ///
    /// Idempotent: when the file already says `scale`, nothing is written.
    pub fn apply_scale(&self, monitor: &str, scale: f64) -> Result<Edit, PatchError> {
        self.ensure_exists()?;

        let real = fs::canonicalize(&self.path).map_err(|source| PatchError::Read {
            path: self.path.clone(),
            source,
        })?;
        if real != self.path {
            debug!("{} resolves to {}", self.path.display(), real.display());
        }

        let text = fs::read_to_string(&real).map_err(|source| PatchError::Read {
            path: real.clone(),
            source,
        })?;

        let mut doc = Document::parse(&text);
        let edit = doc.set_scale(monitor, &format_scale(scale));
        let rendered = doc.to_string();
        debug!("{}: {:?} for {}", real.display(), edit, monitor);

        if rendered == text {
            debug!("{} already up to date", real.display());
            return Ok(edit);
        }
        atomic::write_atomically(&real, rendered.as_bytes())?;
        Ok(edit)
    }

    /// Create the file (and its parent directories) if it is missing.
    fn ensure_exists(&self) -> Result<(), PatchError> {
        if self.path.exists() {
            return Ok(());
        }
        let prepare_err = |source| PatchError::Prepare {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(prepare_err)?;
        }
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(prepare_err)?;
        debug!("created empty {}", self.path.display());
        Ok(())
    }
}
