//! File category classification for builds and watch mode.
//!
//! Every path under the source tree is routed by its extension:
//!
//! | Category   | Handling                                   | Extensions                       |
//! |------------|--------------------------------------------|----------------------------------|
//! | Page       | split, compile, write four artifacts       | `.wpy`                           |
//! | Native     | copy verbatim (scripts also resolve npm)   | `.js .json .wxml .wxs .wxss`     |
//! | Style      | recompile owning page (watch mode only)    | `.less`                          |
//! | Unknown    | ignored                                    | anything else                    |

use std::{
    env,
    ffi::OsStr,
    path::{Component, Path, PathBuf},
};

/// Extension of single-file pages.
pub const PAGE_EXT: &str = "wpy";
/// Extension of stylesheet fragments pulled in by `@import`.
pub const STYLE_EXT: &str = "less";
/// Extension of native scripts (checked for npm references when copied).
pub const SCRIPT_EXT: &str = "js";
/// Native mini program files copied as-is.
pub const NATIVE_EXTS: &[&str] = &["js", "json", "wxml", "wxs", "wxss"];

/// Category of a source file, used to pick its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// Single-file page (`.wpy`)
    Page,
    /// Native file copied into the output tree
    Native,
    /// Stylesheet fragment, tracked through the dependency table
    Style,
    /// Everything else
    Unknown,
}

/// Categorize a file path by its extension.
pub fn categorize_path(path: &Path) -> FileCategory {
    match path.extension().and_then(OsStr::to_str) {
        Some(PAGE_EXT) => FileCategory::Page,
        Some(STYLE_EXT) => FileCategory::Style,
        Some(ext) if NATIVE_EXTS.contains(&ext) => FileCategory::Native,
        _ => FileCategory::Unknown,
    }
}

/// Check if a path is a native script.
pub fn is_script(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SCRIPT_EXT)
}

/// Check if a file or directory name is hidden (leading `.`).
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// Check if path is a temp/backup file (editor artifacts).
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().unwrap_or_default();
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.to_str().is_some_and(|n| n.ends_with('~'))
        || is_hidden(name)
}

/// Page base name: the file name up to its first `.`.
///
/// `/proj/src/pages/home.page.wpy` → `home`
pub fn page_name(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    name.split('.').next().filter(|n| !n.is_empty())
}

/// Normalize a path to absolute form, resolving symlinks when it exists.
///
/// Used for configured roots; source files go through [`clean_path`].
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Make a path absolute and drop `.`/`..` components without touching the
/// file system.
///
/// Symlinks are kept as they are, so a linked source file stays under the
/// source tree and keys the dependency table by the path it was reached
/// through.
pub fn clean_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}
