//! `[compiler]` section configuration.
//!
//! Selects the template and stylesheet compilers. An empty command keeps the
//! built-in compiler.

use super::defaults;
use educe::Educe;
use serde::Deserialize;

/// `[compiler]` section in wpy.toml.
///
/// # Example
/// ```toml
/// [compiler]
/// template = ["pug", "--obj", "{context}"]
/// style = ["lessc", "-"]
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Template command reading markup on stdin and writing wxml on stdout.
    /// `{context}` in an argument is replaced by the JSON render context.
    #[serde(default = "defaults::compiler::template")]
    #[educe(Default = defaults::compiler::template())]
    pub template: Vec<String>,

    /// Stylesheet command reading source on stdin and writing css on stdout.
    #[serde(default = "defaults::compiler::style")]
    #[educe(Default = defaults::compiler::style())]
    pub style: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::ProjectConfig;

    #[test]
    fn test_compiler_config_defaults_to_builtin() {
        let config: ProjectConfig = toml::from_str("[compiler]").unwrap();
        assert!(config.compiler.template.is_empty());
        assert!(config.compiler.style.is_empty());
    }

    #[test]
    fn test_compiler_config_commands() {
        let config: ProjectConfig = toml::from_str(
            r#"
            [compiler]
            template = ["pug", "--obj", "{context}"]
            style = ["lessc", "-"]
        "#,
        )
        .unwrap();

        assert_eq!(config.compiler.template, ["pug", "--obj", "{context}"]);
        assert_eq!(config.compiler.style, ["lessc", "-"]);
    }
}
