use relocator::{ClipboardMode, FailureKind, ForceMode, PathArg};
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use std::thread;
use tempfile::tempdir;

#[test]
#[serial]
fn cut_replaces_a_cut_extends() {
    let td = tempdir().unwrap();
    let a = td.path().join("a");
    let b = td.path().join("b");
    let c = td.path().join("c");

    relocator::cut(&[a.clone(), b.clone()]);
    relocator::cut(&c);
    assert_eq!(relocator::marked().items(), &[c.clone()]);
    assert_eq!(relocator::marked().mode(), Some(ClipboardMode::Cut));

    relocator::unmark();
    relocator::a_cut(&[a.clone(), b.clone()]).unwrap();
    relocator::a_cut(&c).unwrap();
    assert_eq!(relocator::marked().items(), &[a, b, c]);

    relocator::unmark();
    assert!(relocator::marked().is_empty());
    assert_eq!(relocator::marked().mode(), None);
}

#[test]
#[serial]
fn nested_arguments_flatten_and_dedup() {
    let td = tempdir().unwrap();
    let a = td.path().join("a");
    let b = td.path().join("b");
    let nested = vec![
        PathArg::from(a.clone()),
        PathArg::from(vec![PathArg::from(b.clone()), PathArg::from(a.clone())]),
    ];
    relocator::copy(&nested);
    assert_eq!(relocator::marked().items(), &[a, b]);
    assert_eq!(relocator::marked().mode(), Some(ClipboardMode::Copy));
    relocator::unmark();
}

#[test]
#[serial]
fn paste_moves_items_and_always_empties_clipboard() {
    let td = tempdir().unwrap();
    let one = td.path().join("one.txt");
    let two = td.path().join("two");
    fs::write(&one, "1").unwrap();
    fs::create_dir(&two).unwrap();
    fs::write(two.join("inner.txt"), "2").unwrap();
    let gone = td.path().join("gone.txt");
    let dst = td.path().join("dst");

    relocator::cut(&vec![one.clone(), two.clone(), gone]);
    assert!(relocator::paste(&dst, None, ForceMode::Unset));
    assert!(relocator::marked().is_empty());
    assert!(relocator::failed().is_empty());
    assert!(!one.exists());
    assert!(!two.exists());
    assert_eq!(fs::read_to_string(dst.join("one.txt")).unwrap(), "1");
    assert_eq!(fs::read_to_string(dst.join("two/inner.txt")).unwrap(), "2");

    // empty clipboard: nothing to do, still a success
    assert!(relocator::paste(&dst, None, ForceMode::Unset));
}

#[test]
#[serial]
fn failed_is_stable_and_scoped_to_the_thread() {
    let td = tempdir().unwrap();
    let missing = td.path().join("missing");

    assert!(!relocator::delete(&missing));
    let mine = relocator::failed();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].kind, FailureKind::NotFound);
    assert_eq!(mine[0].path, missing);
    assert_eq!(relocator::failed(), mine);

    let me = thread::current().id();
    let other = thread::spawn(move || {
        let before = relocator::failed_for(me);
        let f = tempdir().unwrap();
        let p: PathBuf = f.path().join("real");
        fs::write(&p, "x").unwrap();
        assert!(relocator::delete(&p));
        (before.len(), relocator::failed().len())
    })
    .join()
    .unwrap();
    assert_eq!(other, (1, 0));
    // the other thread's call did not touch this thread's list
    assert_eq!(relocator::failed(), mine);

    let real = td.path().join("real");
    fs::write(&real, "r").unwrap();
    assert!(relocator::delete(&real));
    assert!(relocator::failed().is_empty());
    assert_eq!(mine.len(), 1);
}

#[test]
#[serial]
fn force_session_restores_previous_default() {
    assert!(!relocator::default_force());
    {
        let _outer = relocator::force_session(true);
        assert!(relocator::default_force());
        {
            let _inner = relocator::force_session(false);
            assert!(!relocator::default_force());
        }
        assert!(relocator::default_force());
    }
    assert!(!relocator::default_force());
}
