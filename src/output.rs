//! Terminal output with verbosity levels and a machine-readable JSON mode.
//!
//! In JSON mode stdout carries machine-readable output only; progress and
//! informational lines are suppressed and warnings/errors go to stderr.
//! Verbosity: default shows `info`, `-v` adds `verbose`, `-v -v` adds
//! `silly` (full diagnostic detail).

use colored::Colorize;

/// Verbosity threshold for human output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Verbose,
    Silly,
}

/// Shared output handle, cloned into handler invocations.
#[derive(Debug, Clone)]
pub struct Output {
    /// Stdout is reserved for machine-readable JSON.
    pub json: bool,
    pub level: Level,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            json: false,
            level: Level::Info,
        }
    }
}

impl Output {
    pub fn new(json: bool, verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::Info,
            1 => Level::Verbose,
            _ => Level::Silly,
        };
        Self { json, level }
    }

    /// Primary human output line. Suppressed in JSON mode.
    pub fn info(&self, msg: &str) {
        if !self.json {
            println!("{}", msg);
        }
    }

    /// Progress/diagnostic line on stderr, shown with `-v` and above.
    pub fn verbose(&self, msg: &str) {
        if self.level >= Level::Verbose {
            eprintln!("[nimbus] {}", msg);
        }
    }

    /// Full-detail diagnostic line, shown with `-v -v`.
    pub fn silly(&self, msg: &str) {
        if self.level >= Level::Silly {
            eprintln!("[nimbus] {}", msg);
        }
    }

    pub fn warn(&self, msg: &str) {
        eprintln!("{} {}", "[nimbus][warn]".yellow(), msg);
    }

    /// Errors are always shown, even in JSON mode.
    pub fn error(&self, msg: &str) {
        eprintln!("{} {}", "[nimbus][error]".red(), msg);
    }

    /// Help text always goes to stdout, regardless of mode.
    pub fn help(&self, msg: &str) {
        println!("{}", msg);
    }

    /// Machine-readable result on stdout (pretty-printed).
    pub fn data(&self, value: &serde_json::Value) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => self.error(&format!("failed to serialize output: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Output::new(false, 0).level, Level::Info);
        assert_eq!(Output::new(false, 1).level, Level::Verbose);
        assert_eq!(Output::new(false, 2).level, Level::Silly);
        assert_eq!(Output::new(false, 7).level, Level::Silly);
    }

    #[test]
    fn test_json_mode_flag() {
        assert!(Output::new(true, 0).json);
        assert!(!Output::new(false, 0).json);
    }
}
