//! Template compilers for the `<template>` section.
//!
//! - [`RawTemplate`]: the section already holds wxml; passed through.
//! - [`CommandTemplate`]: an external compiler such as `pug`, fed on stdin.

use super::error::CompileError;
use crate::utils::exec;
use serde_json::Value;
use std::ffi::OsString;

/// Placeholder replaced by the JSON render context in command arguments.
const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Renders template source into wxml.
pub trait TemplateCompiler: Send + Sync {
    fn render(&self, source: &str, context: &Value) -> Result<String, CompileError>;
}

/// Markup that needs no compilation.
#[derive(Debug, Default)]
pub struct RawTemplate;

impl TemplateCompiler for RawTemplate {
    fn render(&self, source: &str, _context: &Value) -> Result<String, CompileError> {
        Ok(source.to_owned())
    }
}

/// External template command reading stdin and writing stdout.
#[derive(Debug)]
pub struct CommandTemplate {
    command: Vec<String>,
}

impl CommandTemplate {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// Command line with `{context}` substituted.
    fn command_line(&self, context: &Value) -> Vec<OsString> {
        let context = context.to_string();
        self.command
            .iter()
            .map(|arg| OsString::from(arg.replace(CONTEXT_PLACEHOLDER, &context)))
            .collect()
    }
}

impl TemplateCompiler for CommandTemplate {
    fn render(&self, source: &str, context: &Value) -> Result<String, CompileError> {
        exec::exec_with_input(None, &self.command_line(context), &[], source)
            .map_err(|e| CompileError::Template(format!("{e:#}")))
    }
}
