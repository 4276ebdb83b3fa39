//! `[build]` section configuration.
//!
//! Source, output and package directories.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::path::PathBuf;

/// `[build]` section in wpy.toml - build pipeline paths.
///
/// # Example
/// ```toml
/// [build]
/// src = "src"              # Source tree
/// dist = "dist"            # Output tree (wiped on every full build)
/// modules = "node_modules" # Where `/npm/` references are looked up
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (the working directory).
    #[serde(skip)]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Source tree.
    #[serde(default = "defaults::build::src")]
    #[educe(Default = defaults::build::src())]
    pub src: PathBuf,

    /// Output tree.
    #[serde(default = "defaults::build::dist")]
    #[educe(Default = defaults::build::dist())]
    pub dist: PathBuf,

    /// External modules root.
    #[serde(default = "defaults::build::modules")]
    #[educe(Default = defaults::build::modules())]
    pub modules: PathBuf,

    /// Package marker segment, also the package directory under `dist`.
    #[serde(default = "defaults::build::npm")]
    #[educe(Default = defaults::build::npm())]
    pub npm: String,

    /// Directory under `dist` receiving compiled `.wpy` pages.
    #[serde(default = "defaults::build::pages")]
    #[educe(Default = defaults::build::pages())]
    pub pages: String,
}

impl BuildConfig {
    /// Output directory for resolved packages: `<dist>/<npm>`.
    pub fn npm_dir(&self) -> PathBuf {
        self.dist.join(&self.npm)
    }

    /// Output directory for compiled pages: `<dist>/<pages>`.
    pub fn pages_dir(&self) -> PathBuf {
        self.dist.join(&self.pages)
    }
}
