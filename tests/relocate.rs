use relocator::{FailureKind, ForceMode, Session, error_kind};
use std::fs;
use tempfile::tempdir;

#[test]
fn move_dir_into_folder_on_one_volume_renames() {
    let td = tempdir().unwrap();
    let src = td.path().join("album");
    fs::create_dir_all(src.join("disc1")).unwrap();
    fs::write(src.join("disc1/track.flac"), "audio").unwrap();
    let dst = td.path().join("library");
    fs::create_dir(&dst).unwrap();

    let s = Session::new();
    let placed = s.move_(&src, &dst, true, ForceMode::Unset).unwrap();
    assert_eq!(placed, dst.join("album"));
    assert!(!src.exists());
    assert_eq!(fs::read_to_string(placed.join("disc1/track.flac")).unwrap(), "audio");
    assert!(s.failed().is_empty());
}

#[test]
fn move_onto_existing_dir_merges_and_removes_source() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let dst = td.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&dst).unwrap();
    fs::write(src.join("new.txt"), "new").unwrap();
    fs::write(dst.join("old.txt"), "old").unwrap();

    let s = Session::new();
    let placed = s.move_(&src, &dst, false, ForceMode::Unset).unwrap();
    assert_eq!(placed, dst);
    assert!(!src.exists());
    assert!(dst.join("new.txt").is_file());
    assert!(dst.join("old.txt").is_file());
}

#[test]
fn clone_onto_itself_is_a_no_op() {
    let td = tempdir().unwrap();
    let f = td.path().join("same.txt");
    fs::write(&f, "same").unwrap();

    let s = Session::new();
    let placed = s.clone(&f, &f, false, ForceMode::On).unwrap();
    assert_eq!(placed, f);
    assert_eq!(fs::read_to_string(&f).unwrap(), "same");
    let placed = s.clone(&f, td.path(), true, ForceMode::On).unwrap();
    assert_eq!(placed, f);
}

#[test]
fn root_errors_are_typed() {
    let td = tempdir().unwrap();
    let dir = td.path().join("dir");
    fs::create_dir(&dir).unwrap();
    let file = td.path().join("file");
    fs::write(&file, "f").unwrap();

    let s = Session::new();
    let err = s.clone(td.path().join("missing"), &dir, true, ForceMode::On).unwrap_err();
    assert_eq!(error_kind(&err), FailureKind::NotFound);

    let err = s.clone(&dir, dir.join("child"), false, ForceMode::On).unwrap_err();
    assert_eq!(error_kind(&err), FailureKind::AncestorConflict);

    let err = s.move_(&file, &dir, false, ForceMode::Off).unwrap_err();
    assert_eq!(error_kind(&err), FailureKind::TypeConflict);
    assert!(dir.is_dir());
    assert!(file.is_file());

    s.move_(&file, &dir, false, ForceMode::On).unwrap();
    assert!(dir.is_file());
    assert!(!file.exists());
}

#[test]
fn clone_overwrites_file_and_keeps_source() {
    let td = tempdir().unwrap();
    let src = td.path().join("a.txt");
    let dst = td.path().join("b.txt");
    fs::write(&src, "fresh").unwrap();
    fs::write(&dst, "stale").unwrap();

    let s = Session::new();
    s.clone(&src, &dst, false, ForceMode::Off).unwrap();
    assert_eq!(fs::read_to_string(&dst).unwrap(), "fresh");
    assert_eq!(fs::read_to_string(&src).unwrap(), "fresh");
}

#[cfg(unix)]
#[test]
fn clone_and_move_into_symlinked_folder_land_in_link_target() {
    let td = tempdir().unwrap();
    let real = td.path().join("real");
    fs::create_dir(&real).unwrap();
    let link = td.path().join("link");
    std::os::unix::fs::symlink(&real, &link).unwrap();
    let a = td.path().join("a.txt");
    let b = td.path().join("b.txt");
    fs::write(&a, "a").unwrap();
    fs::write(&b, "b").unwrap();

    let s = Session::new();
    let placed = s.clone(&a, &link, true, ForceMode::Off).unwrap();
    assert_eq!(placed, link.join("a.txt"));
    s.move_(&b, &link, true, ForceMode::On).unwrap();

    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(real.join("a.txt")).unwrap(), "a");
    assert_eq!(fs::read_to_string(real.join("b.txt")).unwrap(), "b");
    assert!(!b.exists());
}

#[cfg(unix)]
#[test]
fn paste_into_symlinked_folder_keeps_the_link() {
    let td = tempdir().unwrap();
    let real = td.path().join("real");
    fs::create_dir(&real).unwrap();
    let link = td.path().join("link");
    std::os::unix::fs::symlink(&real, &link).unwrap();
    let item = td.path().join("item.txt");
    fs::write(&item, "i").unwrap();

    let s = Session::new();
    s.copy(&item);
    assert!(s.paste(&link, None, ForceMode::On));
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(real.join("item.txt")).unwrap(), "i");
}

#[cfg(unix)]
#[test]
fn clone_keeps_permission_bits_without_preserve_metadata() {
    use std::os::unix::fs::PermissionsExt;
    let td = tempdir().unwrap();
    let script = td.path().join("run.sh");
    fs::write(&script, "#!/bin/sh\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    let out = td.path().join("out");

    let s = Session::new();
    assert!(!s.preserve_metadata());
    let placed = s.clone(&script, &out, true, ForceMode::Unset).unwrap();
    assert_eq!(fs::metadata(&placed).unwrap().permissions().mode() & 0o777, 0o755);

    // overwriting an existing file carries the mode too
    fs::write(out.join("other.sh"), "old").unwrap();
    s.clone(&script, out.join("other.sh"), false, ForceMode::Unset).unwrap();
    assert_eq!(fs::metadata(out.join("other.sh")).unwrap().permissions().mode() & 0o777, 0o755);
}
