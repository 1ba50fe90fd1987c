//! Application orchestrator.
//! Loads/merges config, initializes logging, runs the requested operation on a
//! session and turns its failure list into user-facing lines and an exit code.

use anyhow::{Result, bail};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error};

use relocator::cli::{Args, Command};
use relocator::config::{CONFIG_ENV, Config, config_path, create_template_config, load_config, to_xml};
use relocator::output as out;
use relocator::{ForceMode, RelocateError, Session};

use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<ExitCode> {
    // Config commands run before logging init.
    match &args.command {
        Command::PrintConfig => return print_config(&args),
        Command::InitConfig => return init_config(),
        _ => {}
    }

    let mut cfg = load_config().inspect_err(|e| out::print_error(&format!("Failed to load config: {e:#}")))?;
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(cfg.log_level, cfg.log_file.as_deref(), args.json)
        .inspect_err(|e| out::print_error(&format!("Failed to initialize logging: {e}")))?;
    debug!(?args, "starting relocator");

    let session = Session::from_config(&cfg);
    let result = execute(&session, &cfg, &args.command, args.force_mode());
    if let Err(e) = &result {
        match e.downcast_ref::<RelocateError>() {
            Some(re) => error!(code = re.code(), kind = %re.kind(), error = %re, "operation failed"),
            None => error!(error = ?e, "operation failed"),
        }
    }

    // Flush file logs before exit.
    drop(guard);
    result
}

fn execute(session: &Session, cfg: &Config, command: &Command, force: ForceMode) -> Result<ExitCode> {
    match command {
        Command::Merge { src, dst, move_ } => {
            session.merge(src, dst, *move_, force)?;
            Ok(report(session, &format!("Merged '{}' into '{}'", src.display(), dst.display())))
        }
        Command::Clone(r) => {
            let placed = session.clone(&r.src, &r.dst, r.into, force)?;
            Ok(report(session, &arrow("Copied", &r.src, &placed)))
        }
        Command::Move(r) => {
            let placed = session.move_(&r.src, &r.dst, r.into, force)?;
            Ok(report(session, &arrow("Moved", &r.src, &placed)))
        }
        Command::Paste { dst, items, cut, root } => {
            if *cut {
                session.cut(items);
            } else {
                session.copy(items);
            }
            session.paste(dst, root.as_deref(), force);
            Ok(report(session, &format!("Pasted {} item(s) into '{}'", items.len(), dst.display())))
        }
        Command::Delete { paths } => {
            session.delete(paths);
            Ok(report(session, &format!("Deleted {} path(s)", paths.len())))
        }
        Command::Rename { name, regex, paths } => {
            if let [single] = paths.as_slice() {
                let renamed = match regex {
                    Some(pattern) => session.rename_regex(single, pattern, name)?,
                    None => session.rename(single, name)?,
                };
                if renamed == *single {
                    out::print_info(&format!("'{}' left as is", single.display()));
                } else {
                    out::print_user(&arrow("Renamed", single, &renamed));
                }
                return Ok(ExitCode::SUCCESS);
            }
            let renamed = match regex {
                Some(pattern) => session.rename_all_regex(paths, pattern, name)?,
                None => session.rename_all(paths, name)?,
            };
            for (old, new) in paths.iter().zip(&renamed) {
                if old != new {
                    out::print_user(&arrow("Renamed", old, new));
                }
            }
            Ok(report(session, &format!("Renamed {} path(s)", paths.len())))
        }
        Command::Replace { old, new, regex, paths } => {
            if *regex {
                session.replace_all_regex(paths, old, new)?;
            } else {
                session.replace_all(paths, old.as_bytes(), new.as_bytes())?;
            }
            Ok(report(session, &format!("Replaced content in {} file(s)", paths.len())))
        }
        Command::Archive { src, dst, exact, remove_src } => {
            let archive = session.archive(src, dst, cfg.archive_format, !*exact, *remove_src, force)?;
            Ok(report(session, &arrow("Archived", src, &archive)))
        }
        Command::Extract { archive, dst, remove_archive } => {
            session.extract(archive, dst, *remove_archive, force)?;
            Ok(report(session, &format!("Extracted '{}' into '{}'", archive.display(), dst.display())))
        }
        Command::PrintConfig | Command::InitConfig => bail!("config commands are handled before dispatch"),
    }
}

fn arrow(verb: &str, from: &Path, to: &Path) -> String {
    format!("{verb} '{}' -> '{}'", from.display(), to.display())
}

/// Print the last failure list; success line and exit code follow from it.
fn report(session: &Session, done: &str) -> ExitCode {
    let failures = session.failed();
    for rec in &failures {
        if rec.kind.is_informational() {
            out::print_warn(&rec.to_string());
        } else {
            out::print_error(&rec.to_string());
        }
    }
    if relocator::is_success(&failures) {
        out::print_success(done);
        ExitCode::SUCCESS
    } else {
        out::print_error(&format!("{} entr{} failed", failures.len(), if failures.len() == 1 { "y" } else { "ies" }));
        ExitCode::FAILURE
    }
}

fn print_config(args: &Args) -> Result<ExitCode> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit): {}", Path::new(&explicit).display()));
    }
    match config_path() {
        Some(p) if p.exists() => out::print_info(&format!("Config file: {}", p.display())),
        Some(p) => out::print_info(&format!("Config file: {} (not present; run `relocator init-config` to create it)", p.display())),
        None => out::print_warn("Could not determine a config file location"),
    }
    let mut cfg = load_config()?;
    args.apply_overrides(&mut cfg);
    out::print_user(&to_xml(&cfg)?);
    Ok(ExitCode::SUCCESS)
}

fn init_config() -> Result<ExitCode> {
    let Some(path) = config_path() else {
        bail!("could not determine a config file location; set {CONFIG_ENV}");
    };
    if path.exists() {
        out::print_info(&format!("A config file already exists at {}", path.display()));
        return Ok(ExitCode::SUCCESS);
    }
    create_template_config(&path)?;
    out::print_success(&format!("A template config was written to: {}", path.display()));
    Ok(ExitCode::SUCCESS)
}
