//! # Dupe Module
//!
//! Partitions images into groups that share an identical fingerprint.
//!
//! Only exact fingerprint equality groups images; there is no transitive
//! "A is close to B is close to C" merging. Groups of one are dropped.

use super::ImageRecord;
use crate::core::hasher::Fingerprint;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Images sharing one fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// The shared fingerprint
    pub fingerprint: Fingerprint,
    /// Member paths in first-seen order, each at most once
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Number of members beyond the first
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }
}

/// Group candidates by identical fingerprint.
///
/// Groups come out in the order their fingerprint was first seen; a path
/// seen twice counts once.
pub fn group_duplicates<I>(candidates: I) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = ImageRecord>,
{
    let mut index: HashMap<Fingerprint, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut members: Vec<HashSet<PathBuf>> = Vec::new();

    for ImageRecord { path, fingerprint } in candidates {
        let slot = match index.get(&fingerprint) {
            Some(&slot) => slot,
            None => {
                index.insert(fingerprint.clone(), groups.len());
                groups.push(DuplicateGroup {
                    fingerprint,
                    paths: Vec::new(),
                });
                members.push(HashSet::new());
                groups.len() - 1
            }
        };

        if members[slot].insert(path.clone()) {
            groups[slot].paths.push(path);
        }
    }

    let groups: Vec<DuplicateGroup> = groups.into_iter().filter(|g| g.paths.len() > 1).collect();
    tracing::debug!(groups = groups.len(), "grouped duplicates");
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::Algorithm;

    fn record(path: &str, hex: u16) -> ImageRecord {
        ImageRecord {
            path: PathBuf::from(path),
            fingerprint: Fingerprint::new(Algorithm::Ahash, hex.to_be_bytes().to_vec(), 16),
        }
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(group_duplicates(Vec::new()).is_empty());
    }

    #[test]
    fn five_image_example_yields_one_group() {
        let groups = group_duplicates(vec![
            record("A", 0xfff7),
            record("B", 0x0001),
            record("C", 0x1234),
            record("D", 0xfff7),
            record("E", 0xfff6),
        ]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].fingerprint.to_hex(), "fff7");
        assert_eq!(groups[0].paths, vec![PathBuf::from("A"), PathBuf::from("D")]);
    }

    #[test]
    fn all_unique_gives_no_groups() {
        let groups = group_duplicates(vec![record("A", 1), record("B", 2), record("C", 3)]);
        assert!(groups.is_empty());
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let groups = group_duplicates(vec![
            record("A", 9),
            record("B", 4),
            record("C", 4),
            record("D", 9),
            record("E", 9),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].fingerprint, record("x", 9).fingerprint);
        assert_eq!(groups[0].paths.len(), 3);
        assert_eq!(groups[1].paths, vec![PathBuf::from("B"), PathBuf::from("C")]);
        assert_eq!(groups[0].duplicate_count(), 2);
    }

    #[test]
    fn same_path_twice_is_not_a_duplicate() {
        let groups = group_duplicates(vec![record("A", 5), record("A", 5)]);
        assert!(groups.is_empty());
    }

    #[test]
    fn every_member_shares_the_key() {
        let input = vec![
            record("A", 7),
            record("B", 7),
            record("C", 8),
            record("D", 8),
        ];
        let lookup: HashMap<PathBuf, Fingerprint> = input
            .iter()
            .map(|r| (r.path.clone(), r.fingerprint.clone()))
            .collect();

        for group in group_duplicates(input) {
            assert!(group.paths.len() >= 2);
            for path in &group.paths {
                assert_eq!(lookup[path], group.fingerprint);
            }
        }
    }

    #[test]
    fn different_algorithms_never_group() {
        let a = record("A", 3);
        let b = ImageRecord {
            path: PathBuf::from("B"),
            fingerprint: Fingerprint::new(Algorithm::Dhash, 3u16.to_be_bytes().to_vec(), 16),
        };

        assert!(group_duplicates(vec![a, b]).is_empty());
    }
}
