use super::Session;
use crate::utils::category::is_script;
use crate::utils::fs::copy_file;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Copy a native file to the mirrored path under the output tree.
///
/// Scripts are also scanned for npm references; the copy is verbatim either
/// way.
pub fn process_native(path: &Path, session: &Session) -> Result<()> {
    let build = &session.config().build;
    let rel_path = path
        .strip_prefix(&build.src)
        .with_context(|| format!("{} is outside the source tree", path.display()))?;

    copy_file(path, &build.dist.join(rel_path))?;

    if is_script(path) {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        session.npm().resolve(&String::from_utf8_lossy(&bytes));
    }

    Ok(())
}
