use relocator::{FailureKind, ForceMode, Session, error_kind};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(p: &Path, body: &str) {
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, body).unwrap();
}

fn read(p: &Path) -> String {
    fs::read_to_string(p).unwrap()
}

#[test]
fn merge_overwrites_leaves_and_keeps_destination_only_entries() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let dst = td.path().join("dst");
    write(&src.join("x.txt"), "hi");
    write(&src.join("sub/y.txt"), "bye");
    write(&dst.join("x.txt"), "old");
    write(&dst.join("z.txt"), "keep");

    let s = Session::new();
    assert!(s.merge(&src, &dst, false, ForceMode::Unset).unwrap());
    assert!(s.failed().is_empty());
    assert_eq!(read(&dst.join("x.txt")), "hi");
    assert_eq!(read(&dst.join("z.txt")), "keep");
    assert_eq!(read(&dst.join("sub/y.txt")), "bye");
    // copy mode leaves the source alone
    assert_eq!(read(&src.join("x.txt")), "hi");
}

#[test]
fn merge_twice_with_force_is_idempotent() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let dst = td.path().join("dst");
    write(&src.join("a/b/c.txt"), "c");
    write(&src.join("top.txt"), "t");
    fs::create_dir_all(&dst).unwrap();

    let s = Session::new();
    assert!(s.merge(&src, &dst, false, ForceMode::On).unwrap());
    assert!(s.merge(&src, &dst, false, ForceMode::On).unwrap());
    assert!(s.failed().is_empty());
    assert_eq!(read(&dst.join("a/b/c.txt")), "c");
    assert_eq!(read(&dst.join("top.txt")), "t");
}

#[test]
fn move_merge_removes_emptied_source() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let dst = td.path().join("dst");
    write(&src.join("sub/y.txt"), "bye");
    write(&dst.join("sub/other.txt"), "other");

    let s = Session::new();
    assert!(s.merge(&src, &dst, true, ForceMode::Unset).unwrap());
    assert!(!src.exists());
    assert_eq!(read(&dst.join("sub/y.txt")), "bye");
    assert_eq!(read(&dst.join("sub/other.txt")), "other");
}

#[test]
fn nested_type_conflict_is_overwritten_even_with_force_off() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let dst = td.path().join("dst");
    write(&src.join("thing"), "now a file");
    write(&src.join("folder/inner.txt"), "inner");
    write(&dst.join("thing/deep.txt"), "was a dir");
    write(&dst.join("folder"), "was a file");

    let s = Session::new();
    assert!(s.merge(&src, &dst, false, ForceMode::Off).unwrap());
    assert!(dst.join("thing").is_file());
    assert_eq!(read(&dst.join("thing")), "now a file");
    assert_eq!(read(&dst.join("folder/inner.txt")), "inner");
}

#[test]
fn destination_inside_source_is_rejected_untouched() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let inner = src.join("inner");
    write(&src.join("a.txt"), "a");
    fs::create_dir_all(&inner).unwrap();

    let s = Session::new();
    let err = s.merge(&src, &inner, false, ForceMode::On).unwrap_err();
    assert_eq!(error_kind(&err), FailureKind::AncestorConflict);
    assert!(!inner.join("a.txt").exists());
    assert_eq!(read(&src.join("a.txt")), "a");
}

#[test]
fn source_inside_destination_move_detaches_then_merges() {
    let td = tempdir().unwrap();
    let dst = td.path().join("dst");
    let src = dst.join("nested");
    write(&src.join("n.txt"), "n");
    write(&src.join("deeper/d.txt"), "d");
    write(&dst.join("keep.txt"), "k");

    let s = Session::new();
    assert!(s.merge(&src, &dst, true, ForceMode::Unset).unwrap());
    assert!(!src.exists());
    assert_eq!(read(&dst.join("n.txt")), "n");
    assert_eq!(read(&dst.join("deeper/d.txt")), "d");
    assert_eq!(read(&dst.join("keep.txt")), "k");
    let leftovers: Vec<_> = fs::read_dir(&dst)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(".relocator"))
        .collect();
    assert!(leftovers.is_empty(), "scratch left behind: {leftovers:?}");
}

#[test]
fn source_inside_destination_copy_restores_source() {
    let td = tempdir().unwrap();
    let dst = td.path().join("dst");
    let src = dst.join("nested");
    write(&src.join("n.txt"), "n");

    let s = Session::new();
    assert!(s.merge(&src, &dst, false, ForceMode::Unset).unwrap());
    assert_eq!(read(&src.join("n.txt")), "n");
    assert_eq!(read(&dst.join("n.txt")), "n");
}

#[test]
fn merge_requires_two_directories() {
    let td = tempdir().unwrap();
    let dir = td.path().join("dir");
    let file = td.path().join("file");
    fs::create_dir(&dir).unwrap();
    fs::write(&file, "f").unwrap();

    let s = Session::new();
    let err = s.merge(&file, &dir, false, ForceMode::On).unwrap_err();
    assert_eq!(error_kind(&err), FailureKind::NotADirectory);
    let err = s.merge(&dir, td.path().join("missing"), false, ForceMode::On).unwrap_err();
    assert_eq!(error_kind(&err), FailureKind::NotADirectory);
    assert!(s.merge(&dir, &dir, true, ForceMode::Unset).unwrap());
    assert!(dir.is_dir());
}
