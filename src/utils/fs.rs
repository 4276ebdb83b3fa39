//! Output tree writes: artifacts, copies, and the pre-build wipe.

use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Whether a write touched the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    Unchanged,
}

/// Write `contents` to `path`, creating parent directories.
///
/// A file already holding identical bytes is left untouched, so recompiling a
/// page only rewrites the artifacts whose content moved.
pub fn write_artifact(path: &Path, contents: &[u8]) -> Result<WriteStatus> {
    if fs::read(path).is_ok_and(|existing| existing == contents) {
        return Ok(WriteStatus::Unchanged);
    }

    ensure_parent(path)?;
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(WriteStatus::Written)
}

/// Copy `from` to `to` byte-for-byte, creating parent directories.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    ensure_parent(to)?;
    fs::copy(from, to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

/// Remove the whole output tree if it exists.
pub fn remove_output(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    fs::remove_dir_all(dir)
        .with_context(|| format!("Failed to clear output directory: {}", dir.display()))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
