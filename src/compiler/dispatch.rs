//! Route a source path to its handler by file category.
//!
//! | Category | Build            | Watch                         |
//! |----------|------------------|-------------------------------|
//! | Page     | compile          | compile                       |
//! | Native   | copy             | copy                          |
//! | Style    | ignored          | recompile the owning page     |
//! | Unknown  | ignored          | ignored                       |
//!
//! Handler errors are logged here and never propagate: one broken file must
//! not end a build or a watch session.

use super::Session;
use super::assets::process_native;
use super::wpy::process_page;
use crate::log;
use crate::utils::category::{FileCategory, categorize_path, clean_path};
use std::path::{Path, PathBuf};

/// What started a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Full build traversal
    Build,
    /// File system event during a watch session
    Watch,
}

/// Result of dispatching one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Page compiled and written
    Compiled,
    /// Native file copied
    Copied,
    /// Stylesheet fragment changed and its owning page was recompiled
    Recompiled { dependency: PathBuf, document: PathBuf },
    /// Stylesheet fragment no page imports
    Untracked,
    /// Nothing to do for this path
    Ignored,
    /// Handler failed; the error has been logged
    Failed,
}

/// Classify `path` and run its handler.
pub fn dispatch(path: &Path, session: &Session, trigger: Trigger) -> Outcome {
    let path = clean_path(path);

    match (categorize_path(&path), trigger) {
        (FileCategory::Page, _) => {
            log!("compile"; "{}", session.display(&path));
            report(process_page(&path, session), Outcome::Compiled)
        }
        (FileCategory::Native, _) => {
            log!("copy"; "{}", session.display(&path));
            report(process_native(&path, session), Outcome::Copied)
        }
        (FileCategory::Style, Trigger::Watch) => recompile_owner(path, session),
        (FileCategory::Style, Trigger::Build) | (FileCategory::Unknown, _) => Outcome::Ignored,
    }
}

/// Recompile the page that last imported the changed fragment.
fn recompile_owner(dependency: PathBuf, session: &Session) -> Outcome {
    log!("change"; "{}", session.display(&dependency));

    // The read guard must be released before compiling, which writes the table.
    let owner = session.deps().owner_of(&dependency).map(Path::to_path_buf);
    let Some(document) = owner else {
        return Outcome::Untracked;
    };

    log!("compile"; "{}", session.display(&document));
    report(
        process_page(&document, session),
        Outcome::Recompiled {
            dependency,
            document,
        },
    )
}

fn report(result: anyhow::Result<()>, success: Outcome) -> Outcome {
    match result {
        Ok(()) => success,
        Err(e) => {
            log!("error"; "{e:#}");
            Outcome::Failed
        }
    }
}
