//! npm package resolution for scripts.
//!
//! Scripts reference packages as `require('../npm/<name>.js')`. Every such
//! reference is looked up under the modules root and the package entry file
//! is copied to `<dist>/<npm>/<name>.js`.
//!
//! References are found by pattern matching, not parsing: a `require('…')`
//! inside a comment or string counts too.

use crate::config::ProjectConfig;
use crate::log;
use crate::utils::fs::copy_file;
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

fn require_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"require\(['"](.*?)['"]\)"#).unwrap())
}

/// Extract every `require` argument in source order.
pub fn extract_requires(script: &str) -> Vec<&str> {
    require_regex()
        .captures_iter(script)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Package name of a reference: last segment up to its first `.`.
///
/// `../../npm/dayjs.min.js` → `dayjs`
fn package_name(reference: &str) -> Option<&str> {
    let last = reference.rsplit('/').next()?;
    last.split('.').next().filter(|name| !name.is_empty())
}

/// Outcome of resolving one package reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Entry file found and copied to `dest`
    Copied { name: String, dest: PathBuf },
    /// No candidate exists under the modules root
    Missing { reference: String },
    /// Copy of an existing candidate failed (already logged)
    Failed { reference: String },
}

/// Resolves package references against the modules root.
#[derive(Debug, Clone)]
pub struct NpmResolver {
    /// Marker segment, e.g. `/npm/`
    marker: String,
    modules: PathBuf,
    output: PathBuf,
}

impl NpmResolver {
    pub fn new(config: &ProjectConfig) -> Self {
        Self {
            marker: format!("/{}/", config.build.npm),
            modules: config.build.modules.clone(),
            output: config.build.npm_dir(),
        }
    }

    /// Candidate entry files for a package, in lookup order.
    pub fn candidates(&self, name: &str) -> [PathBuf; 3] {
        let dir = self.modules.join(name);
        [
            dir.join("dist").join(format!("{name}.js")),
            dir.join("index.js"),
            dir.join(format!("{name}.js")),
        ]
    }

    /// Resolve every package reference in `script`.
    ///
    /// Failures are logged and never abort the caller.
    pub fn resolve(&self, script: &str) -> Vec<Resolution> {
        extract_requires(script)
            .into_iter()
            .filter(|reference| reference.contains(&self.marker))
            .map(|reference| self.resolve_one(reference))
            .collect()
    }

    fn resolve_one(&self, reference: &str) -> Resolution {
        let missing = || {
            log!("error"; "npm package not found: {reference}");
            Resolution::Missing {
                reference: reference.to_owned(),
            }
        };

        let Some(name) = package_name(reference) else {
            return missing();
        };
        let Some(entry) = self.candidates(name).into_iter().find(|p| p.is_file()) else {
            return missing();
        };

        let dest = self.output.join(format!("{name}.js"));
        match copy_file(&entry, &dest) {
            Ok(()) => {
                log!("npm"; "{name} <- {}", self.display(&entry));
                Resolution::Copied {
                    name: name.to_owned(),
                    dest,
                }
            }
            Err(e) => {
                log!("error"; "{e:#}");
                Resolution::Failed {
                    reference: reference.to_owned(),
                }
            }
        }
    }

    fn display<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.modules).unwrap_or(path).display()
    }
}
