//! Single-file page (`.wpy`) compilation.
//!
//! A page bundles four top-level sections:
//!
//! ```text
//! <template> … </template>   → <name>.wxml  (template compiler)
//! <script>   … </script>     → <name>.js    (verbatim, npm resolved)
//! <style>    … </style>      → <name>.wxss  (stylesheet compiler)
//! <config>   … </config>     → <name>.json  (verbatim)
//! ```
//!
//! Sections are matched by tag name only; their order in the file does not
//! matter and repeated sections are concatenated in document order. A
//! missing section is an empty string. Artifacts are written only once every
//! step succeeded, so a failing page keeps its previous output.

use super::Session;
use super::error::CompileError;
use crate::log;
use crate::utils::category::page_name;
use crate::utils::fs::{WriteStatus, write_artifact};
use anyhow::{Context, Result, anyhow};
use quick_xml::{Reader, events::Event, name::QName};
use serde_json::json;
use std::{fs, path::Path};

// ============================================================================
// Sections
// ============================================================================

/// Top-level section tags of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionTag {
    Template,
    Script,
    Style,
    Config,
}

impl SectionTag {
    pub const ALL: [Self; 4] = [Self::Template, Self::Script, Self::Style, Self::Config];

    fn from_name(name: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.name().as_bytes() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Script => "script",
            Self::Style => "style",
            Self::Config => "config",
        }
    }

    /// Output extension of the artifact built from this section.
    pub const fn output_ext(self) -> &'static str {
        match self {
            Self::Template => "wxml",
            Self::Script => "js",
            Self::Style => "wxss",
            Self::Config => "json",
        }
    }

    /// Raw-text sections end at the first matching close tag; their content
    /// is never parsed as markup.
    const fn is_raw(self) -> bool {
        !matches!(self, Self::Template)
    }
}

/// The four section bodies of a page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Sections {
    pub template: String,
    pub script: String,
    pub style: String,
    pub config: String,
}

impl Sections {
    pub fn get(&self, tag: SectionTag) -> &str {
        match tag {
            SectionTag::Template => &self.template,
            SectionTag::Script => &self.script,
            SectionTag::Style => &self.style,
            SectionTag::Config => &self.config,
        }
    }

    fn get_mut(&mut self, tag: SectionTag) -> &mut String {
        match tag {
            SectionTag::Template => &mut self.template,
            SectionTag::Script => &mut self.script,
            SectionTag::Style => &mut self.style,
            SectionTag::Config => &mut self.config,
        }
    }
}

/// Split page source into its sections.
pub fn split(source: &str) -> Result<Sections, CompileError> {
    let mut sections = Sections::default();
    let mut offset = 0;

    // A raw section is cut out textually, then reading restarts after it.
    'restart: while offset < source.len() {
        let rest = &source[offset..];
        let mut reader = Reader::from_str(rest);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.allow_dangling_amp = true;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| CompileError::Markup(e.to_string()))?;

            match event {
                Event::Start(start) => {
                    let name = start.name().as_ref().to_vec();
                    let tag = SectionTag::from_name(&name);
                    let body_start = reader.buffer_position() as usize;

                    match tag {
                        Some(tag) if tag.is_raw() => {
                            let (body, consumed) = raw_body(rest, body_start, tag)?;
                            sections.get_mut(tag).push_str(body);
                            offset += consumed;
                            continue 'restart;
                        }
                        _ => {
                            let span = reader
                                .read_to_end(QName(&name))
                                .map_err(|e| CompileError::Markup(e.to_string()))?;
                            if let Some(tag) = tag {
                                let body = &rest[span.start as usize..span.end as usize];
                                sections.get_mut(tag).push_str(body);
                            }
                        }
                    }
                }
                Event::Eof => break 'restart,
                _ => {}
            }
        }
    }

    Ok(sections)
}

/// Body of a raw section starting at `body_start`, and the byte length
/// consumed up to and including its close tag.
fn raw_body(rest: &str, body_start: usize, tag: SectionTag) -> Result<(&str, usize), CompileError> {
    let close = format!("</{}", tag.name());
    let body_len = rest[body_start..]
        .find(&close)
        .ok_or(CompileError::Unclosed(tag.name()))?;
    let close_start = body_start + body_len;
    let close_len = rest[close_start..]
        .find('>')
        .ok_or(CompileError::Unclosed(tag.name()))?;

    Ok((&rest[body_start..close_start], close_start + close_len + 1))
}

// ============================================================================
// Page pipeline
// ============================================================================

/// A page after compilation, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPage {
    pub name: String,
    pub sections: Sections,
}

/// Split and compile one page, registering its stylesheet imports.
pub fn compile_page(path: &Path, session: &Session) -> Result<CompiledPage> {
    let name = page_name(path)
        .ok_or_else(|| anyhow!("Invalid page name: {}", path.display()))?
        .to_owned();
    let source =
        fs::read_to_string(path).map_err(|err| CompileError::Io(path.to_path_buf(), err))?;
    let mut sections = split(&source)?;

    if !sections.script.is_empty() {
        session.npm().resolve(&sections.script);
    }

    if !sections.template.is_empty() {
        sections.template = session.template().render(&sections.template, &json!({}))?;
    }

    if !sections.style.is_empty() {
        let compiled = session.style().compile(&sections.style, path)?;
        session.register_imports(path, &compiled.imports);
        sections.style = compiled.css;
    }

    Ok(CompiledPage { name, sections })
}

/// Write the four artifacts of a compiled page.
///
/// Returns how many files actually changed on disk.
pub fn write_page(page: &CompiledPage, session: &Session) -> Result<usize> {
    let dir = session.config().build.pages_dir();
    let mut written = 0;

    for tag in SectionTag::ALL {
        let dest = dir.join(format!("{}.{}", page.name, tag.output_ext()));
        if write_artifact(&dest, page.sections.get(tag).as_bytes())? == WriteStatus::Written {
            written += 1;
        }
    }

    Ok(written)
}

/// Compile a page and write its artifacts.
pub fn process_page(path: &Path, session: &Session) -> Result<()> {
    let page = compile_page(path, session)
        .with_context(|| format!("Failed to compile {}", session.display(path)))?;
    let written = write_page(&page, session)?;
    if written < SectionTag::ALL.len() {
        log!("compile"; "{}: {written} of {} outputs changed", page.name, SectionTag::ALL.len());
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
