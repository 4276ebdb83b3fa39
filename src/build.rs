//! Full build orchestration.
//!
//! # Architecture
//!
//! ```text
//! build()
//!     │
//!     ├── remove_output()     ──► wipe dist (errors logged, not fatal)
//!     │
//!     ├── collect_all_files() ──► walk src, hidden entries pruned
//!     │
//!     └── par_iter dispatch() ──► compile pages / copy native files
//! ```

use crate::{
    compiler::{Outcome, Session, Trigger, dispatch},
    log,
    utils::{category::is_hidden, fs::remove_output},
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Per-outcome counts of one build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub compiled: usize,
    pub copied: usize,
    pub failed: usize,
}

impl BuildSummary {
    fn record(mut self, outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Compiled | Outcome::Recompiled { .. } => self.compiled += 1,
            Outcome::Copied => self.copied += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Untracked | Outcome::Ignored => {}
        }
        self
    }
}

/// Wipe the output tree and dispatch every source file.
///
/// Per-file failures are logged and counted; they never abort the build.
pub fn build(session: &Session) -> BuildSummary {
    let config = session.config();
    let build = &config.build;

    if build.dist.exists() {
        let rel = build.dist.strip_prefix(config.get_root()).unwrap_or(build.dist.as_path());
        log!("clean"; "{}", rel.display());
    }
    if let Err(e) = remove_output(&build.dist) {
        log!("error"; "{e:#}");
    }

    let files = collect_all_files(&build.src);
    let summary = files
        .par_iter()
        .map(|path| dispatch(path, session, Trigger::Build))
        .collect::<Vec<_>>()
        .iter()
        .fold(BuildSummary::default(), BuildSummary::record);

    log!("build"; "{} compiled, {} copied, {} failed",
        summary.compiled, summary.copied, summary.failed);

    summary
}

/// Collect every regular file under `dir`, sorted by name, skipping hidden
/// files and directories. Symlinks are followed.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}
