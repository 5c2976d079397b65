//! Property tests for the in-memory filesystem.

use std::collections::BTreeSet;

use osa_core::{MemOs, Os};
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,12}".prop_filter("not a dot entry", |n| n != "." && n != "..")
}

proptest! {
    #[test]
    fn write_then_read_returns_same_bytes(
        file in name(),
        data in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let mut os = MemOs::new();
        let path = format!("/temp/{}", file);
        os.write_file(&path, &data, 0o600).unwrap();

        prop_assert_eq!(os.read_file(&path).unwrap(), data.clone());
        prop_assert_eq!(os.stat(&path).unwrap().size, data.len() as u64);
    }

    #[test]
    fn listing_is_sorted_and_complete(names in proptest::collection::btree_set(name(), 0..20)) {
        let mut os = MemOs::new();
        for (i, n) in names.iter().enumerate() {
            let path = format!("/temp/{}", n);
            if i % 2 == 0 {
                os.mkdir(&path, 0o700).unwrap();
            } else {
                os.write_file(&path, n.as_bytes(), 0o600).unwrap();
            }
        }

        let listed: Vec<String> = os.read_dir("/temp").unwrap().into_iter().map(|e| e.name).collect();
        let expected: Vec<String> = names.iter().cloned().collect();
        prop_assert_eq!(listed, expected);
    }

    #[test]
    fn paged_listing_matches_full_listing(
        names in proptest::collection::btree_set(name(), 1..25),
        pages in proptest::collection::vec(1usize..6, 1..30),
    ) {
        let mut os = MemOs::new();
        for n in &names {
            os.write_file(&format!("/temp/{}", n), b"", 0o600).unwrap();
        }
        let full = os.read_dir("/temp").unwrap();

        let mut handle = os.open("/temp").unwrap();
        let mut paged = Vec::new();
        for n in pages.iter().copied().chain(std::iter::repeat(3)) {
            match handle.read_dir(n) {
                Ok(chunk) => {
                    prop_assert!(chunk.len() <= n);
                    paged.extend(chunk);
                }
                Err(err) => {
                    prop_assert!(err.is_eof());
                    break;
                }
            }
        }
        prop_assert_eq!(paged, full);
    }

    #[test]
    fn temp_dirs_are_distinct(count in 1usize..40, prefix in "[a-z]{1,6}") {
        let mut os = MemOs::new();
        let mut seen = BTreeSet::new();
        for _ in 0..count {
            let dir = os.mkdir_temp("/temp", &prefix).unwrap();
            let expected_prefix = format!("/temp/{}", prefix);
            prop_assert!(dir.starts_with(&expected_prefix));
            prop_assert!(seen.insert(dir));
        }
        prop_assert_eq!(os.read_dir("/temp").unwrap().len(), count);
    }

    #[test]
    fn rename_moves_content(from in name(), to in name(), data in "[ -~]{0,64}") {
        prop_assume!(from != to);
        let mut os = MemOs::new();
        let (old, new) = (format!("/temp/{}", from), format!("/temp/{}", to));
        os.write_file(&old, data.as_bytes(), 0o600).unwrap();

        os.rename(&old, &new).unwrap();
        prop_assert!(os.stat(&old).unwrap_err().is_not_exist());
        prop_assert_eq!(os.read_file(&new).unwrap(), data.as_bytes().to_vec());
    }
}
