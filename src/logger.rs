//! Logging utilities with colored, timestamped output.
//!
//! Every line has the shape `[HH:MM:SS] [category] message`:
//!
//! ```ignore
//! log!("compile"; "{}", relative.display());
//! log!("error"; "{:#}", err);
//! ```

use chrono::Local;
use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

// ============================================================================
// Layout Constants
// ============================================================================
//
// Line format: "[12:34:56] [category] message"
//               ^--------^ ^--------^
//               timestamp  prefix

/// Length of brackets around a name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after a bracketed block: "[category] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;
/// Display length of `HH:MM:SS`
const TIMESTAMP_LEN: usize = 8;

/// Calculate total prefix length (timestamp and category) for a category name.
#[inline]
const fn calc_prefix_len(category_len: usize) -> usize {
    TIMESTAMP_LEN + category_len + 2 * (BRACKET_LEN + SPACE_AFTER_PREFIX)
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored category prefix.
///
/// # Usage
/// ```ignore
/// log!("category"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored category prefix.
///
/// Long single-line messages are truncated to the terminal width; multi-line
/// messages (compiler diagnostics) are printed whole.
pub fn log(category: &str, message: &str) {
    let prefix = colorize_prefix(category, &category.to_ascii_lowercase());
    let timestamp = format!("[{}]", now()).dimmed();
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();

    let message = if message.contains('\n') {
        message
    } else {
        let max_msg_len = width.saturating_sub(calc_prefix_len(category.len()));
        truncate_str(message, max_msg_len)
    };

    writeln!(stdout, "{timestamp} {prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a category prefix.
#[inline]
fn colorize_prefix(category: &str, category_lower: &str) -> ColoredString {
    let prefix = format!("[{category}]");
    match category_lower {
        "compile" | "build" => prefix.bright_green().bold(),
        "copy" => prefix.bright_yellow().bold(),
        "change" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_magenta().bold(),
        "clean" => prefix.magenta().bold(),
        "npm" => prefix.bright_cyan().bold(),
        "warn" => prefix.yellow().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.white().bold(),
    }
}

/// Current local time as `HH:MM:SS`.
fn now() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Tests
// ============================================================================
