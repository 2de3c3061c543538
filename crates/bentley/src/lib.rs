//! ## Features
//!
//! - Prefixed level logging (info, warn, error, debug, success, verbose)
//! - Multi-line message support with consistent formatting
//! - Banner displays for stage headings (announce, spotlight, flourish, showstopper)
//! - Fixed-width preview tables for tabular records
//! - All output to stderr so stdout stays free for command results
//!
//! ## Usage
//!
//! Level functions take a `&str`; the exported macros accept `format!` arguments:
//!
//! ```
//! bentley::info!("collected {} records", 12);
//! bentley::warn!("page {} skipped", 3);
//! ```

use colored::*;

pub mod table;

pub use table::{render_table, table};

/// Log levels understood by [`emit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Verbose,
  Info,
  Warn,
  Error,
  Debug,
  Success,
}

impl Level {
  /// Short tag printed inside the prefix brackets
  pub fn tag(&self) -> &'static str {
    match self {
      Level::Verbose => "verb",
      Level::Info => "info",
      Level::Warn => "warn",
      Level::Error => "error",
      Level::Debug => "debug",
      Level::Success => "sccs",
    }
  }

  fn color(&self) -> Color {
    match self {
      Level::Verbose => Color::Cyan,
      Level::Info => Color::Blue,
      Level::Warn => Color::Yellow,
      Level::Error => Color::Red,
      Level::Debug => Color::Magenta,
      Level::Success => Color::Green,
    }
  }
}

/// Core output function, one stderr line per message line
pub fn log(message: &str) {
  for line in message.lines() {
    eprintln!("{line}");
  }
}

/// Build the padded, colored `[tag]` prefix for a level
pub fn prefix(level: Level) -> String {
  let tag = level.tag();
  let pad = 7usize.saturating_sub(tag.len() + 2);
  format!("[{}]{:<pad$}", tag.color(level.color()).bold(), "")
}

/// Write a message at the given level, prefixing every line
pub fn emit(level: Level, message: &str) {
  let prefix = prefix(level);
  for line in message.lines() {
    log(&format!("{prefix} {line}"));
  }
}

pub fn verbose(message: &str) {
  emit(Level::Verbose, message);
}

/// General progress information
pub fn info(message: &str) {
  emit(Level::Info, message);
}

/// Something was skipped or degraded but the run continues
pub fn warn(message: &str) {
  emit(Level::Warn, message);
}

pub fn error(message: &str) {
  emit(Level::Error, message);
}

pub fn debug(message: &str) {
  emit(Level::Debug, message);
}

pub fn success(message: &str) {
  emit(Level::Success, message);
}

/// Create a banner line of the specified length and character
pub fn banner_line(length: usize, char: char) -> String {
  char.to_string().repeat(length)
}

/// Display a message framed by two banner lines
pub fn as_banner<F>(log_fn: F, message: &str, width: Option<usize>, border_char: Option<char>)
where
  F: Fn(&str),
{
  let banner = banner_line(width.unwrap_or(50), border_char.unwrap_or('='));

  log_fn(&banner);
  log_fn(message);
  log_fn(&banner);
}

/// Stage heading
pub fn announce(message: &str) {
  as_banner(|msg| log(&msg.blue().bold().to_string()), message, Some(50), Some('-'));
}

pub fn spotlight(message: &str) {
  as_banner(|msg| log(&msg.yellow().bold().to_string()), message, Some(40), Some('*'));
}

/// Run finished
pub fn flourish(message: &str) {
  as_banner(|msg| log(&msg.green().bold().to_string()), message, Some(45), Some('~'));
}

/// Fatal condition, the run stops here
pub fn showstopper(message: &str) {
  as_banner(|msg| log(&msg.bright_red().bold().to_string()), message, Some(60), Some('*'));
}

#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => {
    $crate::info(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! warn {
  ($($arg:tt)*) => {
    $crate::warn(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => {
    $crate::error(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! verbose {
  ($($arg:tt)*) => {
    $crate::verbose(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! debug {
  ($($arg:tt)*) => {
    $crate::debug(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => {
    $crate::success(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! announce {
  ($($arg:tt)*) => {
    $crate::announce(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! spotlight {
  ($($arg:tt)*) => {
    $crate::spotlight(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! flourish {
  ($($arg:tt)*) => {
    $crate::flourish(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! showstopper {
  ($($arg:tt)*) => {
    $crate::showstopper(&format!($($arg)*))
  };
}
