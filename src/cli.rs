//! CLI definition and parsing.
//! Defines Args (global flags + one subcommand per operation) and parse().
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - --force / --no-force set the per-call force flag; without either the
//!   configured default applies.

use clap::{Args as ClapArgs, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::archive::ArchiveFormat;
use crate::config::types::{Config, LogLevel};
use crate::force::ForceMode;

/// Merge-aware copy, move, paste, delete and archive operations.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Merge-aware file relocation (copy, move, paste, archive)")]
pub struct Args {
    /// Replace root entries of a different type instead of failing.
    #[arg(long, global = true, conflicts_with = "no_force")]
    pub force: bool,

    /// Never replace root entries of a different type, whatever the config says.
    #[arg(long, global = true)]
    pub no_force: bool,

    /// Copy timestamps onto copied files; permission bits are always copied.
    #[arg(long, global = true)]
    pub preserve_metadata: bool,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true, value_parser = clap::value_parser!(LogLevel))]
    pub log_level: Option<LogLevel>,

    /// Also write logs to this file.
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Emit logs in structured JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Archive format for `archive` (tar, tar-gz, zip or jar).
    #[arg(long, global = true, value_parser = clap::value_parser!(ArchiveFormat))]
    pub format: Option<ArchiveFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Merge the contents of SRC into the existing directory DST.
    Merge {
        #[arg(value_hint = ValueHint::DirPath)]
        src: PathBuf,
        #[arg(value_hint = ValueHint::DirPath)]
        dst: PathBuf,
        /// Move entries instead of copying them (SRC is removed when emptied).
        #[arg(long = "move")]
        move_: bool,
    },
    /// Copy SRC to DST (or into DST with --into); existing folders are merged.
    Clone(Relocate),
    /// Move SRC to DST (or into DST with --into), renaming when possible.
    Move(Relocate),
    /// Mark ITEMS and paste them into DST.
    Paste {
        #[arg(value_hint = ValueHint::DirPath)]
        dst: PathBuf,
        #[arg(required = true, value_hint = ValueHint::AnyPath)]
        items: Vec<PathBuf>,
        /// Move the items instead of copying them.
        #[arg(long)]
        cut: bool,
        /// Keep folder structure for items found under ROOT.
        #[arg(long, value_hint = ValueHint::DirPath)]
        root: Option<PathBuf>,
    },
    /// Delete files and folders (folders recursively).
    Delete {
        #[arg(required = true, value_hint = ValueHint::AnyPath)]
        paths: Vec<PathBuf>,
    },
    /// Give each path the new final name NAME (same folder).
    Rename {
        name: String,
        /// Only rename paths whose whole name matches PATTERN; NAME may use `$1` or `${group}`.
        #[arg(long, value_name = "PATTERN")]
        regex: Option<String>,
        #[arg(required = true, value_hint = ValueHint::AnyPath)]
        paths: Vec<PathBuf>,
    },
    /// Replace every literal occurrence of OLD with NEW inside the files.
    Replace {
        old: String,
        new: String,
        /// Treat OLD as a regex over UTF-8 text; NEW may use `$1` or `${group}`.
        #[arg(long)]
        regex: bool,
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        paths: Vec<PathBuf>,
    },
    /// Pack every file under SRC into an archive placed in DST.
    Archive {
        #[arg(value_hint = ValueHint::DirPath)]
        src: PathBuf,
        #[arg(value_hint = ValueHint::AnyPath)]
        dst: PathBuf,
        /// Treat DST as the archive path instead of the folder to put it in.
        #[arg(long)]
        exact: bool,
        /// Delete SRC after the archive is in place.
        #[arg(long)]
        remove_src: bool,
    },
    /// Unpack ARCHIVE and merge its content into DST.
    Extract {
        #[arg(value_hint = ValueHint::FilePath)]
        archive: PathBuf,
        #[arg(value_hint = ValueHint::DirPath)]
        dst: PathBuf,
        /// Delete ARCHIVE after a complete success.
        #[arg(long)]
        remove_archive: bool,
    },
    /// Print the config file location and the effective settings, then exit.
    PrintConfig,
    /// Write a commented template config file at the config location.
    InitConfig,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct Relocate {
    #[arg(value_hint = ValueHint::AnyPath)]
    pub src: PathBuf,
    #[arg(value_hint = ValueHint::AnyPath)]
    pub dst: PathBuf,
    /// Treat DST as a folder and place SRC inside it.
    #[arg(long)]
    pub into: bool,
}

impl Args {
    /// Per-call force flag from --force / --no-force.
    pub fn force_mode(&self) -> ForceMode {
        if self.force {
            ForceMode::On
        } else if self.no_force {
            ForceMode::Off
        } else {
            ForceMode::Unset
        }
    }

    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(path) = &self.log_file {
            cfg.log_file = Some(path.clone());
        }
        if self.preserve_metadata {
            cfg.preserve_metadata = true;
        }
        if let Some(format) = self.format {
            cfg.archive_format = format;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
