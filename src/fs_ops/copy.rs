//! Safe file copy:
//! - Copies to a hidden temp file in the destination directory
//! - Gives the temp file the source's permission bits (and timestamps when asked)
//! - Atomically renames temp -> dest, replacing an existing file or symlink there

use anyhow::Result;
use std::fs;
use std::path::Path;

use super::atomic::try_atomic_move;
use super::helpers::io_error_with_help;
use super::{io_copy, metadata, util};

pub fn safe_copy_and_rename(src: &Path, dest: &Path) -> Result<()> {
    safe_copy_and_rename_with_metadata(src, dest, false)
}

/// Like `safe_copy_and_rename`; `preserve` also carries atime/mtime over.
pub fn safe_copy_and_rename_with_metadata(src: &Path, dest: &Path, preserve: bool) -> Result<()> {
    let dest_dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let tmp_path = util::unique_hidden_path(dest_dir, "tmp");
    let staged = io_copy::copy_streaming(src, &tmp_path)
        .and_then(|_| fs::metadata(src))
        .and_then(|meta| {
            metadata::copy_permissions(&tmp_path, &meta)?;
            if preserve {
                metadata::preserve_timestamps(&tmp_path, &meta);
            }
            Ok(())
        });
    if let Err(e) = staged {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_error_with_help("copy file", src)(e));
    }

    if let Err(e) = try_atomic_move(&tmp_path, dest) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}
