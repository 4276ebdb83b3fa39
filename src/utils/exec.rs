//! External command execution utilities.
//!
//! Runs template/stylesheet compilers that read source on stdin and write
//! their result to stdout. Warnings on stderr are logged; a failing command
//! is reported with its stderr.

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::OsString,
    io::Write,
    path::Path,
    process::{Command, Output, Stdio},
    sync::OnceLock,
    thread,
};

// ============================================================================
// Command Execution
// ============================================================================

/// Run `cmd args..`, feed `input` on stdin and return stdout as text.
///
/// # Errors
/// Returns error if the command cannot be spawned, exits with non-zero
/// status, or prints non-UTF-8 output.
pub fn exec_with_input(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
    input: &str,
) -> Result<String> {
    let (name, mut command) = prepare(root, cmd, args)?;

    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn `{name}`"))?;

    // Feed stdin from a separate thread so a large output cannot deadlock
    // against a child still waiting for input.
    let mut stdin = child.stdin.take().context("Failed to acquire stdin")?;
    let input = input.to_owned();
    let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

    let output = child
        .wait_with_output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    let written = writer.join();

    // A failing command usually closes stdin early; report its stderr first.
    log_output(&name, &output)?;
    match written {
        Ok(result) => result.with_context(|| format!("Failed to write stdin of `{name}`"))?,
        Err(_) => anyhow::bail!("Failed to join stdin writer of `{name}`"),
    }

    String::from_utf8(output.stdout).with_context(|| format!("`{name}` printed non-UTF-8 output"))
}

/// Prepare a Command from components.
fn prepare(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let name = cmd
        .first()
        .and_then(|s| s.to_str())
        .context("Empty command")?
        .to_owned();

    let mut command = Command::new(&cmd[0]);
    command.args(&cmd[1..]).args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

/// Convert a configured command (`["lessc", "-"]`) to `OsString`s.
pub fn to_cmd_vec(cmd: &[String]) -> Vec<OsString> {
    cmd.iter().map(OsString::from).collect()
}

// ============================================================================
// Output Filtering
// ============================================================================

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}

/// Non-empty stderr lines with ANSI colors removed.
fn stderr_lines(output: &Output) -> Vec<String> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr
        .lines()
        .map(|line| strip_ansi(line).trim().to_owned())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Fail on a non-zero exit, otherwise log stderr as warnings.
fn log_output(name: &str, output: &Output) -> Result<()> {
    if !output.status.success() {
        anyhow::bail!(format_error(name, output));
    }

    // On success stdout is the result; only stderr (warnings) is logged
    let warnings = stderr_lines(output);
    if !warnings.is_empty() {
        log!(name; "{}", warnings.join("\n"));
    }

    Ok(())
}

fn format_error(name: &str, output: &Output) -> String {
    let mut msg = format!("Command `{name}` failed with {}", output.status);
    for line in stderr_lines(output) {
        msg.push('\n');
        msg.push_str(&line);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================
