//! Stylesheet compilers for the `<style>` section.
//!
//! Both compilers report every file pulled in through `@import`, which feeds
//! the [`DependencyTable`](super::deps::DependencyTable).
//!
//! - [`ImportInliner`]: built-in; inlines local imports, leaves the rest of
//!   the source untouched.
//! - [`CommandStyle`]: external compiler such as `lessc -`, fed on stdin.
//!
//! # Import resolution
//!
//! ```text
//! @import "vars";            → <dir>/vars.less          (inlined once)
//! @import (reference) 'a';   → <dir>/a.less             (tracked, not emitted)
//! @import url("theme.less"); → <dir>/theme.less         (inlined once)
//! @import "base.css";        → kept as written
//! @import "//cdn/x.less";    → kept as written
//! ```

use super::error::CompileError;
use crate::utils::exec;
use crate::utils::category::{STYLE_EXT, clean_path};
use regex::{Captures, Regex};
use rustc_hash::FxHashSet;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

/// Compiled css plus the absolute paths of every imported file, in the
/// order they were first reached.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompiledStyle {
    pub css: String,
    pub imports: Vec<PathBuf>,
}

/// Compiles stylesheet source; `origin` is the file the source came from.
pub trait StyleCompiler: Send + Sync {
    fn compile(&self, source: &str, origin: &Path) -> Result<CompiledStyle, CompileError>;
}

// ============================================================================
// Built-in compiler
// ============================================================================

/// Inlines local `@import`s; each file is emitted at most once.
#[derive(Debug, Default)]
pub struct ImportInliner;

impl StyleCompiler for ImportInliner {
    fn compile(&self, source: &str, origin: &Path) -> Result<CompiledStyle, CompileError> {
        let mut expander = Expander::new(origin, true);
        let css = expander.expand(source, origin)?;
        Ok(CompiledStyle {
            css,
            imports: expander.imports,
        })
    }
}

// ============================================================================
// External compiler
// ============================================================================

/// External stylesheet command reading stdin and writing stdout.
///
/// Runs from the origin's directory so relative imports resolve the same way
/// the built-in compiler resolves them.
#[derive(Debug)]
pub struct CommandStyle {
    command: Vec<String>,
}

impl CommandStyle {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl StyleCompiler for CommandStyle {
    fn compile(&self, source: &str, origin: &Path) -> Result<CompiledStyle, CompileError> {
        let mut expander = Expander::new(origin, false);
        expander.expand(source, origin)?;

        let css = exec::exec_with_input(
            origin.parent(),
            &exec::to_cmd_vec(&self.command),
            &[],
            source,
        )
        .map_err(|e| CompileError::Style(format!("{e:#}")))?;

        Ok(CompiledStyle {
            css,
            imports: expander.imports,
        })
    }
}

// ============================================================================
// Import expansion
// ============================================================================

/// Matches a comment or an `@import` statement. Comments are matched so
/// that imports inside them are skipped.
fn import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r#"(?s)(?P<comment>/\*.*?\*/|//[^\n]*)"#,
            r#"|@import\s*(?:\((?P<options>[^)]*)\)\s*)?(?:url\(\s*)?['"](?P<path>[^'"]+)['"]\s*\)?[^;]*;"#,
        ))
        .unwrap()
    })
}

/// How a single `@import` statement is handled.
#[derive(Debug, PartialEq, Eq)]
enum Import {
    /// Remote or plain css import, left in the output.
    Keep,
    /// Local file, tracked; `emit` is false for `(reference)` imports.
    Local { path: PathBuf, emit: bool },
}

/// Walks `@import` statements recursively, collecting imported files.
struct Expander {
    /// Files already reached (the origin included)
    seen: FxHashSet<PathBuf>,
    imports: Vec<PathBuf>,
    /// Whether imported content is spliced into the output
    inline: bool,
}

impl Expander {
    fn new(origin: &Path, inline: bool) -> Self {
        let mut seen = FxHashSet::default();
        seen.insert(origin.to_path_buf());
        Self {
            seen,
            imports: Vec::new(),
            inline,
        }
    }

    fn expand(&mut self, source: &str, file: &Path) -> Result<String, CompileError> {
        let dir = file.parent().unwrap_or(Path::new(""));
        let mut output = String::with_capacity(source.len());
        let mut last = 0;

        for caps in import_regex().captures_iter(source) {
            let Some(whole) = caps.get(0) else { continue };
            output.push_str(&source[last..whole.start()]);
            last = whole.end();

            if caps.name("comment").is_some() {
                output.push_str(whole.as_str());
                continue;
            }

            match classify(&caps, dir, file)? {
                Import::Keep => output.push_str(whole.as_str()),
                Import::Local { path, emit } => {
                    if !self.seen.insert(path.clone()) {
                        continue;
                    }
                    self.imports.push(path.clone());

                    let content = fs::read_to_string(&path)
                        .map_err(|err| CompileError::Io(path.clone(), err))?;
                    let expanded = self.expand(&content, &path)?;
                    if self.inline && emit {
                        output.push_str(&expanded);
                    }
                }
            }
        }

        output.push_str(&source[last..]);
        Ok(output)
    }
}

/// Decide how an `@import` match is handled, resolving local files.
fn classify(caps: &Captures<'_>, dir: &Path, file: &Path) -> Result<Import, CompileError> {
    let options = caps.name("options").map_or("", |m| m.as_str());
    let reference = caps.name("path").map_or("", |m| m.as_str());
    let has_option = |name: &str| options.split(',').any(|o| o.trim() == name);

    let is_remote = ["http:", "https:", "//"]
        .iter()
        .any(|prefix| reference.starts_with(prefix));
    if is_remote || has_option("css") || Path::new(reference).extension().is_some_and(|e| e == "css") {
        return Ok(Import::Keep);
    }

    let mut path = dir.join(reference);
    if path.extension().is_none() {
        path.set_extension(STYLE_EXT);
    }
    let path = clean_path(&path);
    if !path.is_file() {
        return Err(CompileError::ImportNotFound {
            reference: reference.to_owned(),
            from: file.to_path_buf(),
        });
    }

    Ok(Import::Local {
        path,
        emit: !has_option("reference"),
    })
}
