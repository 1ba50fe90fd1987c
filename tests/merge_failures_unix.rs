#![cfg(target_os = "linux")]

use relocator::{FailureKind, ForceMode, Session};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::tempdir;

fn running_as_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

fn set_mode(p: &Path, mode: u32) {
    let mut perms = fs::metadata(p).unwrap().permissions();
    perms.set_mode(mode);
    fs::set_permissions(p, perms).unwrap();
}

fn write(p: &Path, body: &str) {
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, body).unwrap();
}

/// An unreadable subdirectory is recorded; its siblings are still merged.
#[test]
fn unreadable_subdirectory_is_recorded_and_siblings_merge() {
    if running_as_root() {
        eprintln!("skipping: running as root");
        return;
    }
    let td = tempdir().expect("tempdir");
    let src = td.path().join("src");
    let dst = td.path().join("dst");
    write(&src.join("a.txt"), "a");
    write(&src.join("locked/inner.txt"), "i");
    write(&src.join("z.txt"), "z");
    fs::create_dir_all(dst.join("locked")).unwrap();
    set_mode(&src.join("locked"), 0o000);

    let s = Session::new();
    let ok = s.merge(&src, &dst, false, ForceMode::Unset).unwrap();
    let failed = s.failed();

    set_mode(&src.join("locked"), 0o755);

    assert!(!ok);
    let rec = failed
        .iter()
        .find(|r| r.path.ends_with("locked"))
        .unwrap_or_else(|| panic!("no record for the locked dir: {failed:?}"));
    assert!(rec.is_dir);
    assert_eq!(rec.kind, FailureKind::PermissionDenied);
    assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
    assert_eq!(fs::read_to_string(dst.join("z.txt")).unwrap(), "z");
    assert!(!dst.join("locked/inner.txt").exists());
}

/// Everything moved but the emptied source could not be removed: still a success.
#[test]
fn undeletable_emptied_source_is_cleanup_only() {
    if running_as_root() {
        eprintln!("skipping: running as root");
        return;
    }
    let td = tempdir().expect("tempdir");
    let parent = td.path().join("parent");
    let src = parent.join("src");
    let dst = td.path().join("dst");
    write(&src.join("a.txt"), "a");
    write(&src.join("sub/b.txt"), "b");
    fs::create_dir_all(&dst).unwrap();
    set_mode(&parent, 0o555);

    let s = Session::new();
    let ok = s.merge(&src, &dst, true, ForceMode::Unset).unwrap();
    let failed = s.failed();

    set_mode(&parent, 0o755);

    assert!(ok, "{failed:?}");
    assert_eq!(failed.len(), 1, "{failed:?}");
    assert_eq!(failed[0].kind, FailureKind::Cleanup);
    assert_eq!(failed[0].path, src);
    assert!(src.is_dir());
    assert_eq!(fs::read_dir(&src).unwrap().count(), 0);
    assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
    assert_eq!(fs::read_to_string(dst.join("sub/b.txt")).unwrap(), "b");
}

/// A move out of a nested source that fails part-way puts the leftovers back at
/// the source path instead of under a hidden name in the destination.
#[test]
fn failed_nested_move_restores_source_path() {
    if running_as_root() {
        eprintln!("skipping: running as root");
        return;
    }
    let td = tempdir().expect("tempdir");
    let dst = td.path().join("dst");
    let src = dst.join("nested");
    write(&src.join("n.txt"), "n");
    write(&src.join("locked/inner.txt"), "i");
    fs::create_dir_all(dst.join("locked")).unwrap();
    set_mode(&src.join("locked"), 0o000);

    let s = Session::new();
    let ok = s.merge(&src, &dst, true, ForceMode::Unset).unwrap();
    let failed = s.failed();

    let restored_locked = src.join("locked");
    if restored_locked.exists() {
        set_mode(&restored_locked, 0o755);
    }

    assert!(!ok);
    assert!(failed.iter().any(|r| r.kind == FailureKind::PermissionDenied), "{failed:?}");
    assert_eq!(fs::read_to_string(dst.join("n.txt")).unwrap(), "n");
    assert!(!src.join("n.txt").exists());
    assert_eq!(fs::read_to_string(src.join("locked/inner.txt")).unwrap(), "i");
    let leftovers: Vec<_> = fs::read_dir(&dst)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(".relocator"))
        .collect();
    assert!(leftovers.is_empty(), "scratch left behind: {leftovers:?}");
}
