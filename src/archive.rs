//! Directory <-> tar / tar.gz / zip archives.
//!
//! The codec work is done by `tar`, `flate2` and `zip`. A jar is a zip under
//! another extension. Archives are always built or
//! unpacked inside a scratch directory and then handed to the relocator, so the
//! destination sees a single move or merge.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::RelocateError;
use crate::failures::FailureList;
use crate::fs_ops::{EntryKind, MergeOptions, classify, delete_path, io_error_with_help, move_entry, resolve};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// Local file header, or the end record of an empty zip.
const ZIP_MAGIC: [[u8; 4]; 2] = [*b"PK\x03\x04", *b"PK\x05\x06"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFormat {
    Tar,
    #[default]
    TarGz,
    Zip,
    Jar,
}

impl ArchiveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Jar => "jar",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar-gz",
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Jar => "jar",
        })
    }
}

impl FromStr for ArchiveFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tar" => Ok(ArchiveFormat::Tar),
            "tar-gz" | "tar.gz" | "targz" | "tgz" | "gz" => Ok(ArchiveFormat::TarGz),
            "zip" => Ok(ArchiveFormat::Zip),
            "jar" => Ok(ArchiveFormat::Jar),
            other => Err(format!("unknown archive format '{other}' (expected tar, tar-gz, zip or jar)")),
        }
    }
}

/// `<dir name>.<ext>` for the archive of `src_dir`.
pub fn archive_name(src_dir: &Path, format: ArchiveFormat) -> Result<String> {
    let abs = resolve(src_dir);
    let stem = abs
        .file_name()
        .ok_or_else(|| RelocateError::Usage(format!("cannot name an archive for '{}'", src_dir.display())))?;
    Ok(format!("{}.{}", stem.to_string_lossy(), format.extension()))
}

/// Write every file (and link) under `src_dir` into a new archive at `out`,
/// named relative to `src_dir`. Directories without files add nothing.
/// Returns the number of entries written.
pub fn pack(src_dir: &Path, out: &Path, format: ArchiveFormat) -> Result<u64> {
    let file = File::create(out).map_err(io_error_with_help("create archive", out))?;
    let writer = BufWriter::new(file);
    let count = match format {
        ArchiveFormat::Tar => {
            let mut builder = tar::Builder::new(writer);
            let n = append_files(&mut builder, src_dir)?;
            builder
                .into_inner()
                .and_then(|mut w| w.flush())
                .map_err(io_error_with_help("finish archive", out))?;
            n
        }
        ArchiveFormat::TarGz => {
            let mut builder = tar::Builder::new(GzEncoder::new(writer, Compression::default()));
            let n = append_files(&mut builder, src_dir)?;
            builder
                .into_inner()
                .and_then(|enc| enc.finish())
                .and_then(|mut w| w.flush())
                .map_err(io_error_with_help("finish archive", out))?;
            n
        }
        ArchiveFormat::Zip | ArchiveFormat::Jar => {
            let mut zip = ZipWriter::new(writer);
            let n = append_zip_entries(&mut zip, src_dir)?;
            zip.finish()
                .with_context(|| format!("finish archive '{}'", out.display()))?
                .flush()
                .map_err(io_error_with_help("finish archive", out))?;
            n
        }
    };
    debug!(src = %src_dir.display(), archive = %out.display(), entries = count, %format, "archive packed");
    Ok(count)
}

fn append_files<W: Write>(builder: &mut tar::Builder<W>, src_dir: &Path) -> Result<u64> {
    builder.follow_symlinks(false);
    let mut count = 0;
    for entry in WalkDir::new(src_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk '{}'", src_dir.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let rel = entry.path().strip_prefix(src_dir)?;
        builder
            .append_path_with_name(entry.path(), rel)
            .map_err(io_error_with_help("add to archive", entry.path()))?;
        count += 1;
    }
    Ok(count)
}

/// Zip entry names always use `/`.
fn zip_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn append_zip_entries<W: Write + Seek>(zip: &mut ZipWriter<W>, src_dir: &Path) -> Result<u64> {
    let base = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0;
    for entry in WalkDir::new(src_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk '{}'", src_dir.display()))?;
        let ft = entry.file_type();
        if ft.is_dir() {
            continue;
        }
        let path = entry.path();
        let name = zip_name(path.strip_prefix(src_dir)?);
        if ft.is_symlink() {
            let target = std::fs::read_link(path).map_err(io_error_with_help("read link", path))?;
            zip.add_symlink(name, target.to_string_lossy(), base)
                .with_context(|| format!("add to archive '{}'", path.display()))?;
        } else {
            let meta = entry.metadata().with_context(|| format!("stat '{}'", path.display()))?;
            zip.start_file(name, base.unix_permissions(file_mode(&meta)))
                .with_context(|| format!("add to archive '{}'", path.display()))?;
            let mut file = File::open(path).map_err(io_error_with_help("open file", path))?;
            io::copy(&mut file, zip).map_err(io_error_with_help("add to archive", path))?;
        }
        count += 1;
    }
    Ok(count)
}

#[cfg(unix)]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    if meta.permissions().readonly() { 0o444 } else { 0o644 }
}

/// Sniff the magic bytes: gzip, then zip; anything else is treated as plain tar.
/// A jar cannot be told apart from a zip and comes back as `Zip`.
pub fn detect_format(archive: &Path) -> Result<ArchiveFormat> {
    let mut head = [0u8; 4];
    let mut f = File::open(archive).map_err(io_error_with_help("open archive", archive))?;
    let mut n = 0;
    while n < head.len() {
        match f.read(&mut head[n..]).map_err(io_error_with_help("read archive", archive))? {
            0 => break,
            k => n += k,
        }
    }
    Ok(if n >= 2 && head[..2] == GZIP_MAGIC {
        ArchiveFormat::TarGz
    } else if n == 4 && ZIP_MAGIC.contains(&head) {
        ArchiveFormat::Zip
    } else {
        ArchiveFormat::Tar
    })
}

/// Unpack `archive` into the existing directory `into`.
pub fn unpack(archive: &Path, into: &Path) -> Result<ArchiveFormat> {
    let format = detect_format(archive)?;
    let reader = BufReader::new(File::open(archive).map_err(io_error_with_help("open archive", archive))?);
    match format {
        ArchiveFormat::Tar => tar::Archive::new(reader)
            .unpack(into)
            .map_err(io_error_with_help("unpack archive", archive))?,
        ArchiveFormat::TarGz => tar::Archive::new(GzDecoder::new(reader))
            .unpack(into)
            .map_err(io_error_with_help("unpack archive", archive))?,
        ArchiveFormat::Zip | ArchiveFormat::Jar => ZipArchive::new(reader)
            .and_then(|mut zip| zip.extract(into))
            .with_context(|| format!("unpack archive '{}'", archive.display()))?,
    }
    debug!(archive = %archive.display(), dest = %into.display(), %format, "archive unpacked");
    Ok(format)
}

fn scratch_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix(".relocator-archive-")
        .tempdir()
        .context("create scratch directory")
}

/// Archive `src_dir` and place the result at `dst/<name>.<ext>` (into) or `dst`.
#[allow(clippy::too_many_arguments)]
pub fn archive_dir(
    src_dir: &Path,
    dst: &Path,
    format: ArchiveFormat,
    into: bool,
    remove_src: bool,
    force: bool,
    opts: MergeOptions,
) -> Result<PathBuf> {
    if classify(src_dir) != EntryKind::Directory {
        return Err(RelocateError::NotADirectory(src_dir.to_path_buf()).into());
    }
    let name = archive_name(src_dir, format)?;
    let target = if into { dst.join(&name) } else { dst.to_path_buf() };
    if !force && classify(&target).is_dir() {
        return Err(RelocateError::TypeConflict {
            dest: target,
            reason: "cannot write an archive where a directory exists".into(),
        }
        .into());
    }

    let scratch = scratch_dir()?;
    let built = scratch.path().join(&name);
    pack(src_dir, &built, format)?;
    let placed = move_entry(&built, &target, false, true, opts)?;

    if remove_src {
        delete_path(src_dir)?;
    }
    info!(src = %src_dir.display(), archive = %placed.path.display(), %format, "archive created");
    Ok(placed.path)
}

/// Unpack `archive` and move/merge its content into `dst`.
/// Entry-level problems come back as failures; the archive is only removed
/// (when asked) after a complete success.
pub fn extract_archive(archive: &Path, dst: &Path, remove_archive: bool, force: bool, opts: MergeOptions) -> Result<FailureList> {
    match classify(archive) {
        EntryKind::File => {}
        EntryKind::Absent => return Err(RelocateError::NotFound(archive.to_path_buf()).into()),
        kind => {
            return Err(RelocateError::Usage(format!("'{}' is a {}, not an archive file", archive.display(), kind.describe())).into());
        }
    }
    if !force && classify(dst) == EntryKind::File {
        return Err(RelocateError::TypeConflict {
            dest: dst.to_path_buf(),
            reason: "cannot extract an archive onto a file".into(),
        }
        .into());
    }

    let scratch = scratch_dir()?;
    let payload = scratch.path().join("payload");
    std::fs::create_dir(&payload).map_err(io_error_with_help("create directory", &payload))?;
    unpack(archive, &payload)?;

    let placed = move_entry(&payload, dst, false, force, opts)?;
    if remove_archive && placed.success() {
        delete_path(archive)?;
    }
    info!(archive = %archive.display(), dst = %placed.path.display(), failures = placed.failures.len(), "archive extracted");
    Ok(placed.failures)
}
