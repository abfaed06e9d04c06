//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro for output that only appears with `--verbose`
//! - `status_success` / `status_warning` for timestamped command outcomes
//!
//! Everything goes to stderr so `htmlcomb combine -o -` can keep stdout
//! for the document itself.
//!
//! # Example
//!
//! ```ignore
//! log!("serve"; "http://{}", addr);
//! debug!("serve"; "GET {} -> {}", path, status);
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use std::{
    io::{Write, stderr},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut out = stderr().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" => prefix.bright_blue().bold().to_string(),
        "combine" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        "warning" => prefix.bright_magenta().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Status lines
// ============================================================================

/// Get current time formatted as HH:MM:SS (UTC)
fn now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Format a status line: `[HH:MM:SS] <symbol> message`.
fn status_line(symbol: &str, message: &str) -> String {
    let timestamp = format!("[{}]", now()).dimmed().to_string();
    if symbol.is_empty() {
        format!("{timestamp} {message}")
    } else {
        format!("{timestamp} {symbol} {message}")
    }
}

fn print_status(line: &str) {
    let mut out = stderr().lock();
    writeln!(out, "{line}").ok();
    out.flush().ok();
}

/// Success message (✓ prefix, green).
pub fn status_success(message: &str) {
    print_status(&status_line(&"✓".green().to_string(), message));
}

/// Warning message (⚠ prefix, yellow).
pub fn status_warning(message: &str) {
    print_status(&status_line(&"⚠".yellow().to_string(), message));
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_has_timestamp() {
        owo_colors::set_override(false);
        let line = status_line("", "combined 3 files");
        assert!(line.starts_with('['));
        assert!(line.ends_with("] combined 3 files"));
        assert_eq!(line.find(']'), Some(9));
    }

    #[test]
    fn test_status_line_with_symbol() {
        owo_colors::set_override(false);
        let line = status_line("✓", "saved");
        assert!(line.ends_with("✓ saved"));
    }

    #[test]
    fn test_colorize_prefix_plain() {
        owo_colors::set_override(false);
        assert_eq!(colorize_prefix("serve", "serve"), "[serve]");
        assert_eq!(colorize_prefix("Registry", "registry"), "[Registry]");
    }
}
