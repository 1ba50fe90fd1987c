//! Delete, rename and in-file replace, single and batched.
//! Single-target variants return errors; batched variants record failures and keep going.
//! Rename and replace also come in regex flavours (`regex` syntax, `$1` / `${name}`
//! expansion in the replacement).

use anyhow::Result;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::atomic::try_atomic_move;
use super::classify::{EntryKind, classify};
use super::helpers::io_error_with_help;
use super::tree::remove_entry;
use super::util::unique_hidden_path;
use crate::errors::RelocateError;
use crate::failures::{FailureList, FailureRecord};

/// Remove a file, link or whole directory tree.
pub fn delete_path(path: &Path) -> Result<()> {
    match classify(path) {
        EntryKind::Absent => Err(RelocateError::NotFound(path.to_path_buf()).into()),
        kind => {
            remove_entry(path, kind)?;
            debug!(path = %path.display(), kind = kind.describe(), "deleted");
            Ok(())
        }
    }
}

pub fn delete_paths(paths: &[PathBuf]) -> FailureList {
    let mut failures = FailureList::new();
    for p in paths {
        if let Err(err) = delete_path(p) {
            warn!(path = %p.display(), error = %err, "delete failed");
            failures.push(FailureRecord::from_error(p, classify(p).is_dir(), &err));
        }
    }
    failures
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(RelocateError::Usage(format!("'{name}' is not a plain file name")).into());
    }
    Ok(())
}

/// Give `src` the new final component `name`, staying in the same folder.
/// An existing entry with that name is never overwritten.
pub fn rename_path(src: &Path, name: &str) -> Result<PathBuf> {
    check_name(name)?;
    if !classify(src).exists() {
        return Err(RelocateError::NotFound(src.to_path_buf()).into());
    }
    let target = match src.parent() {
        Some(p) => p.join(name),
        None => PathBuf::from(name),
    };
    if target == src {
        return Ok(target);
    }
    if classify(&target).exists() {
        return Err(io_error_with_help("rename", &target)(io::ErrorKind::AlreadyExists.into()));
    }
    fs::rename(src, &target).map_err(io_error_with_help("rename", src))?;
    debug!(src = %src.display(), dst = %target.display(), "renamed");
    Ok(target)
}

/// Batched rename. Failed items keep their original path in the returned list.
pub fn rename_paths(paths: &[PathBuf], name: &str) -> Result<(Vec<PathBuf>, FailureList)> {
    check_name(name)?;
    let mut out = Vec::with_capacity(paths.len());
    let mut failures = FailureList::new();
    for p in paths {
        match rename_path(p, name) {
            Ok(new) => out.push(new),
            Err(err) => {
                warn!(path = %p.display(), error = %err, "rename failed");
                failures.push(FailureRecord::from_error(p, classify(p).is_dir(), &err));
                out.push(p.clone());
            }
        }
    }
    Ok((out, failures))
}

/// Compile `pattern` so it only matches a whole string.
pub fn full_match(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| RelocateError::Usage(format!("invalid pattern: {e}")).into())
}

/// Compile `pattern` for searching inside text.
pub fn search_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| RelocateError::Usage(format!("invalid pattern: {e}")).into())
}

/// Rename `src` when its final component matches `re` as a whole; `name` may refer
/// to capture groups. A name that does not match leaves `src` untouched and is
/// returned as is. Build `re` with [`full_match`].
pub fn rename_matching(src: &Path, re: &Regex, name: &str) -> Result<PathBuf> {
    if !classify(src).exists() {
        return Err(RelocateError::NotFound(src.to_path_buf()).into());
    }
    let Some(current) = src.file_name().and_then(|n| n.to_str()) else {
        debug!(path = %src.display(), "name is not UTF-8; left as is");
        return Ok(src.to_path_buf());
    };
    let caps = match re.captures(current) {
        Some(c) if c.get(0).is_some_and(|m| m.start() == 0 && m.end() == current.len()) => c,
        _ => return Ok(src.to_path_buf()),
    };
    let mut expanded = String::new();
    caps.expand(name, &mut expanded);
    rename_path(src, &expanded)
}

/// Batched [`rename_matching`]. Failed items keep their original path.
pub fn rename_paths_matching(paths: &[PathBuf], re: &Regex, name: &str) -> (Vec<PathBuf>, FailureList) {
    let mut out = Vec::with_capacity(paths.len());
    let mut failures = FailureList::new();
    for p in paths {
        match rename_matching(p, re, name) {
            Ok(new) => out.push(new),
            Err(err) => {
                warn!(path = %p.display(), error = %err, "rename failed");
                failures.push(FailureRecord::from_error(p, classify(p).is_dir(), &err));
                out.push(p.clone());
            }
        }
    }
    (out, failures)
}

/// Replace every non-overlapping occurrence of `old` with `new`, scanning left to right.
pub fn replace_bytes(haystack: &[u8], old: &[u8], new: &[u8]) -> (Vec<u8>, usize) {
    if old.is_empty() {
        return (haystack.to_vec(), 0);
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut count = 0;
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(old) {
            out.extend_from_slice(new);
            i += old.len();
            count += 1;
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    (out, count)
}

/// Literal replacement inside one file. Returns the number of replacements made.
pub fn replace_in_file(path: &Path, old: &[u8], new: &[u8]) -> Result<usize> {
    if old.is_empty() {
        return Err(RelocateError::Usage("search pattern must not be empty".into()).into());
    }
    check_regular_file(path)?;

    let data = fs::read(path).map_err(io_error_with_help("read", path))?;
    let (updated, count) = replace_bytes(&data, old, new);
    if count == 0 {
        return Ok(0);
    }
    rewrite_file(path, &updated)?;
    debug!(path = %path.display(), count, "replaced content");
    Ok(count)
}

/// Regex replacement inside one UTF-8 text file. Returns the number of matches replaced.
pub fn replace_regex_in_file(path: &Path, re: &Regex, new: &str) -> Result<usize> {
    check_regular_file(path)?;
    let text = fs::read_to_string(path).map_err(io_error_with_help("read text", path))?;
    let count = re.find_iter(&text).count();
    if count == 0 {
        return Ok(0);
    }
    let updated = re.replace_all(&text, new);
    rewrite_file(path, updated.as_bytes())?;
    debug!(path = %path.display(), count, "replaced content");
    Ok(count)
}

pub fn replace_regex_in_files(paths: &[PathBuf], re: &Regex, new: &str) -> FailureList {
    let mut failures = FailureList::new();
    for p in paths {
        if let Err(err) = replace_regex_in_file(p, re, new) {
            warn!(path = %p.display(), error = %err, "replace failed");
            failures.push(FailureRecord::from_error(p, classify(p).is_dir(), &err));
        }
    }
    failures
}

fn check_regular_file(path: &Path) -> Result<()> {
    match classify(path) {
        EntryKind::File => {}
        EntryKind::Absent => return Err(RelocateError::NotFound(path.to_path_buf()).into()),
        EntryKind::Directory => return Err(io_error_with_help("replace in", path)(io::ErrorKind::IsADirectory.into())),
        EntryKind::Symlink => {
            return Err(RelocateError::Usage(format!("'{}' is a symlink; replace works on regular files", path.display())).into());
        }
    }
    Ok(())
}

/// Swap `path`'s content for `data` through a temp file and a rename; permissions are kept.
fn rewrite_file(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = unique_hidden_path(dir, "replace");
    let written = fs::write(&tmp, data)
        .and_then(|()| fs::metadata(path))
        .and_then(|meta| fs::set_permissions(&tmp, meta.permissions()));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(io_error_with_help("write replacement", path)(e));
    }
    if let Err(e) = try_atomic_move(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

pub fn replace_in_files(paths: &[PathBuf], old: &[u8], new: &[u8]) -> Result<FailureList> {
    if old.is_empty() {
        return Err(RelocateError::Usage("search pattern must not be empty".into()).into());
    }
    let mut failures = FailureList::new();
    for p in paths {
        if let Err(err) = replace_in_file(p, old, new) {
            warn!(path = %p.display(), error = %err, "replace failed");
            failures.push(FailureRecord::from_error(p, classify(p).is_dir(), &err));
        }
    }
    Ok(failures)
}
