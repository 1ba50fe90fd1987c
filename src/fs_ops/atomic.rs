//! Rename helpers.
//! - `try_atomic_move` renames with context-rich errors and best-effort fsyncs the
//!   destination directory on Unix.
//! - On Windows an existing destination *file* is removed first (MoveFile does not overwrite).

use anyhow::Result;
use std::fs;
use std::path::Path;

use super::helpers::io_error_with_help;

pub fn try_atomic_move(src: &Path, dst: &Path) -> Result<()> {
    #[cfg(windows)]
    {
        if dst.is_file() {
            if let Err(e) = fs::remove_file(dst) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(io_error_with_help("remove existing destination before rename", dst)(e));
                }
            }
        }
    }

    fs::rename(src, dst).map_err(io_error_with_help("rename into place", dst))?;

    #[cfg(unix)]
    {
        if let Some(parent) = dst.parent() {
            let _ = super::util::fsync_dir(parent);
        }
    }

    Ok(())
}
