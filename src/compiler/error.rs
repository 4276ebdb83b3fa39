//! Compilation error types.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while turning one source file into artifacts.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("malformed page markup: {0}")]
    Markup(String),

    #[error("unclosed <{0}> section")]
    Unclosed(&'static str),

    #[error("template compilation failed\n{0}")]
    Template(String),

    #[error("stylesheet compilation failed\n{0}")]
    Style(String),

    #[error("cannot resolve @import `{reference}` in `{}`", from.display())]
    ImportNotFound { reference: String, from: PathBuf },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}
