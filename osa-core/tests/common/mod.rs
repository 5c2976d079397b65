//! Behavior every `Os` implementation must share.
//!
//! Each check gets an implementation and an existing, empty directory to
//! work in, so the same suite runs against memory and a host temp dir.

use osa_core::{ErrorKind, Os};

fn at(root: &str, name: &str) -> String {
    format!("{}/{}", root, name)
}

fn names(os: &dyn Os, dir: &str) -> Vec<String> {
    os.read_dir(dir)
        .unwrap()
        .into_iter()
        .map(|entry| entry.name)
        .collect()
}

pub fn mkdir_then_stat(os: &mut dyn Os, root: &str) {
    let dir = at(root, "new");
    os.mkdir(&dir, 0o700).unwrap();

    let info = os.stat(&dir).unwrap();
    assert!(info.is_dir);
    assert_eq!(info.name, "new");
    assert_eq!(info.size, 0);
}

pub fn mkdir_errors(os: &mut dyn Os, root: &str) {
    let dir = at(root, "dup");
    os.mkdir(&dir, 0o700).unwrap();
    assert!(os.mkdir(&dir, 0o700).unwrap_err().is_exist());

    let err = os.mkdir(&at(root, "missing/child"), 0o700).unwrap_err();
    assert!(err.is_not_exist());
    assert!(!err.is_exist());
}

pub fn mkdir_all_blocked_by_file(os: &mut dyn Os, root: &str) {
    os.mkdir_all(&at(root, "a/b/c"), 0o700).unwrap();
    os.mkdir_all(&at(root, "a/b"), 0o700).unwrap();
    assert!(os.stat(&at(root, "a/b/c")).unwrap().is_dir);

    os.write_file(&at(root, "a/file"), b"", 0o600).unwrap();
    let err = os.mkdir_all(&at(root, "a/file/x/y"), 0o700).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotDirectory));
}

pub fn write_read_round_trip(os: &mut dyn Os, root: &str) {
    let file = at(root, "data.bin");
    os.write_file(&file, &[0, 159, 146, 150, 255], 0o600).unwrap();
    assert_eq!(os.read_file(&file).unwrap(), [0, 159, 146, 150, 255]);
    assert_eq!(os.stat(&file).unwrap().size, 5);

    os.write_file(&file, b"", 0o600).unwrap();
    assert!(os.read_file(&file).unwrap().is_empty());

    let err = os.write_file(&at(root, "nope/file"), b"x", 0o600).unwrap_err();
    assert!(err.is_not_exist());
}

pub fn files_and_dirs_do_not_swap(os: &mut dyn Os, root: &str) {
    let dir = at(root, "dir");
    os.mkdir(&dir, 0o700).unwrap();

    let err = os.write_file(&dir, b"x", 0o600).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFile));
    let err = os.read_file(&dir).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFile));
    assert!(os.stat(&dir).unwrap().is_dir);
}

pub fn read_dir_sorted(os: &mut dyn Os, root: &str) {
    os.write_file(&at(root, "zeta"), b"z", 0o600).unwrap();
    os.mkdir(&at(root, "beta"), 0o700).unwrap();
    os.write_file(&at(root, "alpha"), b"abc", 0o600).unwrap();

    assert_eq!(names(os, root), ["alpha", "beta", "zeta"]);

    let entries = os.read_dir(root).unwrap();
    assert_eq!(entries[0].size, 3);
    assert!(entries[1].is_dir);
    assert_eq!(entries[1].size, 0);

    assert!(os.read_dir(&at(root, "missing")).unwrap_err().is_not_exist());
    assert_eq!(
        os.read_dir(&at(root, "zeta")).unwrap_err().kind(),
        Some(ErrorKind::NotDirectory)
    );
}

pub fn rename_semantics(os: &mut dyn Os, root: &str) {
    let a = at(root, "a");
    let b = at(root, "b");
    os.write_file(&a, b"dataA", 0o600).unwrap();
    os.write_file(&b, b"dataB", 0o600).unwrap();

    // Existing files are replaced
    os.rename(&a, &b).unwrap();
    assert!(os.stat(&a).unwrap_err().is_not_exist());
    assert_eq!(os.read_file(&b).unwrap(), b"dataA");

    // Existing directories are not
    let dir = at(root, "dir");
    os.mkdir(&dir, 0o700).unwrap();
    assert!(os.rename(&b, &dir).unwrap_err().is_exist());
    assert_eq!(os.read_file(&b).unwrap(), b"dataA");

    assert!(os.rename(&a, &at(root, "c")).unwrap_err().is_not_exist());
}

pub fn rename_moves_children(os: &mut dyn Os, root: &str) {
    os.mkdir_all(&at(root, "old/sub"), 0o700).unwrap();
    os.write_file(&at(root, "old/sub/f"), b"kept", 0o600).unwrap();

    os.rename(&at(root, "old"), &at(root, "new")).unwrap();
    assert!(os.stat(&at(root, "old")).unwrap_err().is_not_exist());
    assert_eq!(os.read_file(&at(root, "new/sub/f")).unwrap(), b"kept");

    let err = os
        .rename(&at(root, "new"), &at(root, "new/sub/inside"))
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::OperationFailed));
    assert!(os.stat(&at(root, "new/sub")).unwrap().is_dir);
}

pub fn remove_semantics(os: &mut dyn Os, root: &str) {
    let full = at(root, "full");
    os.mkdir_all(&at(root, "full/sub"), 0o700).unwrap();
    os.write_file(&at(root, "full/sub/f"), b"", 0o600).unwrap();
    os.write_file(&at(root, "file"), b"", 0o600).unwrap();

    let err = os.remove(&full).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotEmpty));
    assert!(os.remove(&at(root, "missing")).unwrap_err().is_not_exist());

    os.remove(&at(root, "file")).unwrap();
    os.remove_all(&full).unwrap();
    assert!(os.stat(&full).unwrap_err().is_not_exist());

    os.remove_all(&at(root, "missing/deeper")).unwrap();
}

pub fn mkdir_temp_distinct(os: &mut dyn Os, root: &str) {
    let mut seen = Vec::new();
    for _ in 0..5 {
        let dir = os.mkdir_temp(root, "prefix").unwrap();
        assert!(dir.starts_with(&at(root, "prefix")), "{}", dir);
        assert!(os.stat(&dir).unwrap().is_dir);
        assert!(!seen.contains(&dir));
        seen.push(dir);
    }

    let err = os.mkdir_temp(root, "bad/pattern").unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::OperationFailed));
}

pub fn open_partial_reads(os: &mut dyn Os, root: &str) {
    let file = at(root, "nine");
    os.write_file(&file, b"some data", 0o600).unwrap();

    let mut handle = os.open(&file).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(handle.read(&mut buf).unwrap(), 4);
    assert_eq!(&buf, b"some");
    assert_eq!(handle.read(&mut buf).unwrap(), 4);
    assert_eq!(&buf, b" dat");
    assert_eq!(handle.read(&mut buf).unwrap(), 1);
    assert_eq!(buf[0], b'a');
    assert!(handle.read(&mut buf).unwrap_err().is_eof());

    let info = handle.stat().unwrap();
    assert_eq!(info.name, "nine");
    assert_eq!(info.size, 9);

    handle.close().unwrap();
    assert!(handle.close().is_err());
    assert!(handle.read(&mut buf).is_err());
    assert!(matches!(os.open(&at(root, "missing")), Err(e) if e.is_not_exist()));
}

pub fn open_dir_paginates(os: &mut dyn Os, root: &str) {
    for name in ["e", "c", "a", "d", "b"] {
        os.write_file(&at(root, name), b"", 0o600).unwrap();
    }

    let mut handle = os.open(root).unwrap();
    assert!(handle.stat().unwrap().is_dir);

    let mut paged = Vec::new();
    for n in [2, 1, 5] {
        paged.extend(handle.read_dir(n).unwrap().into_iter().map(|e| e.name));
    }
    assert_eq!(paged, ["a", "b", "c", "d", "e"]);
    assert!(handle.read_dir(1).unwrap_err().is_eof());
    assert!(handle.read_dir(0).unwrap().is_empty());

    let err = handle.read(&mut [0u8; 4]).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFile));

    handle.close().unwrap();
    assert!(handle.read_dir(0).is_err());
}
