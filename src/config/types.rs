//! Core configuration types.
//! - Config holds session defaults and logging settings.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::archive::ArchiveFormat;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Warnings and errors (default)
    #[default]
    Normal,
    /// One line per completed operation
    Info,
    /// Per-entry decisions
    Debug,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [LogLevel::Quiet, LogLevel::Normal, LogLevel::Info, LogLevel::Debug];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Case-insensitive; also accepts the tracing names (error, warn, trace).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        let alias = match s.as_str() {
            "error" | "none" => "quiet",
            "warn" => "normal",
            "verbose" => "info",
            "trace" => "debug",
            other => other,
        };
        Self::ALL.into_iter().find(|l| l.as_str() == alias)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown log level '{}' (expected quiet, normal, info or debug)", s.trim()))
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    /// Session force default used when a call does not say
    pub default_force: bool,
    /// Copy timestamps onto copied files (permission bits are always copied)
    pub preserve_metadata: bool,
    /// Format used by `archive` when none is given
    pub archive_format: ArchiveFormat,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_names_round_trip() {
        for lvl in LogLevel::ALL {
            assert_eq!(lvl.to_string().parse::<LogLevel>().unwrap(), lvl);
        }
        assert_eq!(LogLevel::parse(" TRACE "), Some(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
