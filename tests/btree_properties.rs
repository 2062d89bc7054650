//! Property tests for the B-tree behind the table.

use std::collections::BTreeSet;

use pagedb::{Error, Row, Table, TableConfig};
use proptest::prelude::*;
use tempfile::tempdir;

fn user(id: u32) -> Row {
    Row::new(id, format!("u{}", id), format!("{}@example.com", id))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Any set of unique keys, inserted in any order, scans back sorted.
    #[test]
    fn prop_scan_is_sorted(keys in proptest::collection::hash_set(any::<u32>(), 0..300)) {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("prop.db")).unwrap();

        for &key in &keys {
            table.insert(&user(key)).unwrap();
        }

        let expected: Vec<u32> = keys.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let scanned: Vec<u32> = table.select_all().unwrap().iter().map(|row| row.id).collect();
        prop_assert_eq!(scanned, expected);
    }

    /// Re-inserting any existing key is rejected and changes nothing.
    #[test]
    fn prop_duplicates_rejected(keys in proptest::collection::vec(0u32..64, 1..200)) {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("prop.db")).unwrap();
        let mut seen = BTreeSet::new();

        for key in keys {
            let result = table.insert(&user(key));
            if seen.insert(key) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(matches!(result, Err(Error::DuplicateKey(k)) if k == key));
            }
        }

        let scanned: Vec<u32> = table.select_all().unwrap().iter().map(|row| row.id).collect();
        prop_assert_eq!(scanned, seen.into_iter().collect::<Vec<_>>());
    }

    /// Everything inserted before close is found after reopen.
    #[test]
    fn prop_persistence(keys in proptest::collection::hash_set(0u32..10_000, 1..150)) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prop.db");
        let config = TableConfig::default();

        let mut table = Table::open_with_config(&path, config).unwrap();
        for &key in &keys {
            table.insert(&user(key)).unwrap();
        }
        table.close().unwrap();

        let mut table = Table::open_with_config(&path, config).unwrap();
        for &key in &keys {
            prop_assert_eq!(table.find(key).unwrap(), Some(user(key)));
        }
        prop_assert_eq!(table.select_all().unwrap().len(), keys.len());
    }
}
