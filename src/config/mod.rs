//! Project configuration management for `wpy.toml`.
//!
//! The file is optional; every field has a default, so a bare project with a
//! `src/` directory builds without one.
//!
//! # Sections
//!
//! | Section      | Purpose                                        |
//! |--------------|------------------------------------------------|
//! | `[build]`    | Source, output and package directories         |
//! | `[compiler]` | External template / stylesheet commands        |
//! | `[watch]`    | Watch session settings (debounce)              |
//!
//! # Example
//!
//! ```toml
//! [build]
//! src = "src"
//! dist = "dist"
//!
//! [compiler]
//! template = ["pug", "--obj", "{context}"]
//!
//! [watch]
//! debounce = 100
//! ```

mod build;
mod compiler;
pub mod defaults;
mod error;
mod watch;

use build::BuildConfig;
use compiler::CompilerConfig;
use error::ConfigError;
use watch::WatchConfig;

use anyhow::{Context, Result, bail};
use educe::Educe;
use serde::Deserialize;
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

/// Config file name looked up in the project root.
pub const CONFIG_FILE: &str = "wpy.toml";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing wpy.toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Build paths
    #[serde(default)]
    pub build: BuildConfig,

    /// Template and stylesheet compilers
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Watch session settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl ProjectConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content).with_context(|| format!("in `{}`", path.display()))
    }

    /// Load `wpy.toml` from `root` (defaults when absent) and resolve every
    /// path against it.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_path_with_root(root);
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);
        self.build.src = Self::normalize_path(&root.join(&self.build.src));
        self.build.dist = Self::normalize_path(&root.join(&self.build.dist));
        self.build.modules = Self::normalize_path(&root.join(&self.build.modules));
        self.build.root = Some(root);
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        crate::utils::category::normalize_path(path)
    }

    /// Validate configuration before a build starts
    pub fn validate(&self) -> Result<()> {
        let src = &self.build.src;
        if !src.exists() {
            bail!(ConfigError::Validation(format!(
                "[build.src] `{}` not found",
                src.display()
            )));
        }
        if !src.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.src] `{}` is not a directory",
                src.display()
            )));
        }

        Self::check_segment("[build.npm]", &self.build.npm)?;
        Self::check_segment("[build.pages]", &self.build.pages)?;

        if !self.compiler.template.is_empty() {
            Self::check_command_installed("[compiler.template]", &self.compiler.template)?;
        }
        if !self.compiler.style.is_empty() {
            Self::check_command_installed("[compiler.style]", &self.compiler.style)?;
        }

        Ok(())
    }

    /// Check that a directory name is a single relative path segment
    fn check_segment(field: &str, value: &str) -> Result<()> {
        let mut components = Path::new(value).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => bail!(ConfigError::Validation(format!(
                "{field} must be a single directory name, got `{value}`"
            ))),
        }
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        let Some(cmd) = command.first() else {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        };

        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = ProjectConfig::from_str("[build\nsrc = \"src\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_str_unknown_section() {
        let result = ProjectConfig::from_str("[serve]\nport = 8080");
        assert!(result.is_err());
    }

    #[test]
    fn test_get_root_default() {
        let config = ProjectConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_load_without_config_file() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.get_root(), root);
        assert_eq!(config.build.src, root.join("src"));
        assert_eq!(config.build.dist, root.join("dist"));
        assert_eq!(config.build.modules, root.join("node_modules"));
        assert!(!root.join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_load_with_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[build]\nsrc = \"app\"\n").unwrap();
        fs::create_dir(dir.path().join("app")).unwrap();

        let config = ProjectConfig::load(dir.path()).unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.build.src, root.join("app"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_src() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("[build.src]"));
    }

    #[test]
    fn test_validate_src_is_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("src"), "").unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nested_npm_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[build]\nnpm = \"a/b\"\n").unwrap();

        let config = ProjectConfig::load(dir.path()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("[build.npm]"));
    }

    #[test]
    fn test_validate_missing_command() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[compiler]\nstyle = [\"definitely-not-a-real-lessc\"]\n",
        )
        .unwrap();

        let config = ProjectConfig::load(dir.path()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("definitely-not-a-real-lessc"));
    }

    #[test]
    fn test_check_segment() {
        assert!(ProjectConfig::check_segment("[build.npm]", "npm").is_ok());
        assert!(ProjectConfig::check_segment("[build.npm]", "").is_err());
        assert!(ProjectConfig::check_segment("[build.npm]", "../npm").is_err());
        assert!(ProjectConfig::check_segment("[build.npm]", "/npm").is_err());
    }
}
