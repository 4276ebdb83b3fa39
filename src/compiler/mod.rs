//! Compilation of source files into mini program artifacts.
//!
//! - **dispatch**: route a path to its handler by extension
//! - **wpy**: split and compile single-file pages
//! - **assets**: copy native files into the output tree
//! - **npm**: resolve `require('../npm/…')` package references
//! - **style** / **template**: section compilers
//! - **deps**: stylesheet fragment → page table
//!
//! # Build Flow
//!
//! ```text
//! dispatch() ──► wpy::process_page() ──► template / style / npm ──► 4 artifacts
//!     │                                        │
//!     │                                        └──► DependencyTable
//!     └──────► assets::process_native() ──► copy (+ npm)
//! ```

pub mod assets;
pub mod deps;
pub mod dispatch;
pub mod error;
pub mod npm;
pub mod style;
pub mod template;
pub mod wpy;

pub use dispatch::{Outcome, Trigger, dispatch};

use crate::config::ProjectConfig;
use crate::log;
use deps::DependencyTable;
use npm::NpmResolver;
use parking_lot::{RwLock, RwLockReadGuard};
use std::path::{Display, Path, PathBuf};
use style::{CommandStyle, ImportInliner, StyleCompiler};
use template::{CommandTemplate, RawTemplate, TemplateCompiler};

/// State shared by every compilation of one build/watch session.
///
/// Owns the dependency table, so its contents live exactly as long as the
/// session does.
pub struct Session {
    config: ProjectConfig,
    deps: RwLock<DependencyTable>,
    template: Box<dyn TemplateCompiler>,
    style: Box<dyn StyleCompiler>,
    npm: NpmResolver,
}

impl Session {
    /// Create a session with the compilers selected by `[compiler]`.
    pub fn new(config: ProjectConfig) -> Self {
        let template: Box<dyn TemplateCompiler> = if config.compiler.template.is_empty() {
            Box::new(RawTemplate)
        } else {
            Box::new(CommandTemplate::new(config.compiler.template.clone()))
        };
        let style: Box<dyn StyleCompiler> = if config.compiler.style.is_empty() {
            Box::new(ImportInliner)
        } else {
            Box::new(CommandStyle::new(config.compiler.style.clone()))
        };
        Self::with_compilers(config, template, style)
    }

    pub fn with_compilers(
        config: ProjectConfig,
        template: Box<dyn TemplateCompiler>,
        style: Box<dyn StyleCompiler>,
    ) -> Self {
        let npm = NpmResolver::new(&config);
        Self {
            config,
            deps: RwLock::new(DependencyTable::new()),
            template,
            style,
            npm,
        }
    }

    #[inline]
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Read access to the dependency table.
    ///
    /// Keep the guard short-lived; compilations take the write lock.
    #[inline]
    pub fn deps(&self) -> RwLockReadGuard<'_, DependencyTable> {
        self.deps.read()
    }

    #[inline]
    pub fn template(&self) -> &dyn TemplateCompiler {
        self.template.as_ref()
    }

    #[inline]
    pub fn style(&self) -> &dyn StyleCompiler {
        self.style.as_ref()
    }

    #[inline]
    pub fn npm(&self) -> &NpmResolver {
        &self.npm
    }

    /// Record `page` as the owner of each imported fragment.
    pub fn register_imports(&self, page: &Path, imports: &[PathBuf]) {
        let mut deps = self.deps.write();
        for import in imports {
            if let Some(previous) = deps.register(import, page) {
                log!("warn"; "{} now tracked by {} (was {})",
                    self.display(import), self.display(page), self.display(&previous));
            }
        }
    }

    /// Path relative to the source tree, for log display.
    pub fn display<'a>(&self, path: &'a Path) -> Display<'a> {
        path.strip_prefix(&self.config.build.src)
            .unwrap_or(path)
            .display()
    }
}
