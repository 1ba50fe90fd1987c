//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a commented template on request.
//! - Unknown XML fields are rejected so typos surface instead of being ignored.

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::CONFIG_ENV;
use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use crate::archive::ArchiveFormat;
use crate::platform::{set_dir_mode_0700, write_config_secure_new_0600};

/// Struct mirroring the XML config. Values are kept as text and trimmed before parsing.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename = "config", deny_unknown_fields)]
struct XmlConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    default_force: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preserve_metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    archive_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_file: Option<String>,
}

fn parse_bool(field: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => bail!("invalid boolean for <{field}>: '{other}'"),
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

// Map XmlConfig -> Config; missing fields keep their defaults.
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();
    if let Some(s) = non_empty(parsed.default_force.as_deref()) {
        cfg.default_force = parse_bool("default_force", s)?;
    }
    if let Some(s) = non_empty(parsed.preserve_metadata.as_deref()) {
        cfg.preserve_metadata = parse_bool("preserve_metadata", s)?;
    }
    if let Some(s) = non_empty(parsed.archive_format.as_deref()) {
        cfg.archive_format = s.parse::<ArchiveFormat>().map_err(|e| anyhow!(e))?;
    }
    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
    }
    cfg.log_file = non_empty(parsed.log_file.as_deref()).map(PathBuf::from);
    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents).with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid value in config xml '{}'", path.display()))
}

/// `$RELOCATOR_CONFIG` (a file, or a directory holding `config.xml`) or the platform default.
pub fn config_path() -> Option<PathBuf> {
    match env::var_os(CONFIG_ENV) {
        Some(raw) if !raw.is_empty() => {
            let p = PathBuf::from(raw);
            Some(if p.is_dir() { p.join("config.xml") } else { p })
        }
        _ => default_config_path(),
    }
}

/// Effective configuration: an explicit `$RELOCATOR_CONFIG` must exist and parse;
/// the default location is optional.
pub fn load_config() -> Result<Config> {
    let explicit = env::var_os(CONFIG_ENV).is_some_and(|v| !v.is_empty());
    let Some(path) = config_path() else {
        debug!("no config location available; using defaults");
        return Ok(Config::default());
    };
    if !path.exists() {
        if explicit {
            bail!("{CONFIG_ENV} points at '{}', which does not exist", path.display());
        }
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(Config::default());
    }
    let cfg = load_config_from_xml_path(&path)?;
    debug!(path = %path.display(), "loaded config");
    Ok(cfg)
}

/// Render a Config as XML (the same shape `load_config_from_xml_path` reads).
pub fn to_xml(cfg: &Config) -> Result<String> {
    let xml = XmlConfig {
        default_force: Some(cfg.default_force.to_string()),
        preserve_metadata: Some(cfg.preserve_metadata.to_string()),
        archive_format: Some(cfg.archive_format.to_string()),
        log_level: Some(cfg.log_level.to_string()),
        log_file: cfg.log_file.as_ref().map(|p| p.display().to_string()),
    };
    quick_xml::se::to_string(&xml).context("serialize config")
}

/// Create a commented template config file. Refuses symlinked ancestors and existing files.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!("refusing to create config: an ancestor of {} is a symlink", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create '{}'", parent.display()))?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/relocator.log".into());
    let content = format!(
        "<!--\n  relocator configuration (XML)\n\n    default_force      -> replace root entries of a different type (true/false)\n    preserve_metadata  -> copy timestamps onto copied files (permission bits always follow)\n    archive_format     -> tar | tar-gz | zip | jar\n    log_level          -> quiet | normal | info | debug\n    log_file           -> optional log file (leave empty to disable)\n\n  CLI flags override these values.\n-->\n<config>\n  <default_force>false</default_force>\n  <preserve_metadata>false</preserve_metadata>\n  <archive_format>tar-gz</archive_format>\n  <log_level>normal</log_level>\n  <log_file></log_file>\n  <!-- e.g. {suggested_log} -->\n</config>\n"
    );
    write_config_secure_new_0600(path, content.as_bytes())?;
    info!(path = %path.display(), "created template config");
    Ok(())
}
