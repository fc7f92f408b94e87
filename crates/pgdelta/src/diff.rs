//! Identity-keyed set diffing between two catalog snapshots.

use indexmap::IndexMap;

/// A modified object, carrying both versions.
///
/// Keeping the pair together means downstream phases never have to look
/// the previous version back up in the source map.
#[derive(Debug, Clone)]
pub struct ModifiedPair<T> {
    /// The version in the source snapshot.
    pub from: T,
    /// The version in the target snapshot.
    pub target: T,
}

/// The four-way partition of two identity-keyed maps.
///
/// Every key of either input lands in exactly one bucket. Iteration
/// order follows the target map for `added`, `modified` and
/// `unmodified`, and the source map for `removed`.
#[derive(Debug, Clone)]
pub struct Differences<T> {
    /// Present only in the target.
    pub added: IndexMap<String, T>,
    /// Present only in the source.
    pub removed: IndexMap<String, T>,
    /// Present in both with unequal content.
    pub modified: IndexMap<String, ModifiedPair<T>>,
    /// Present in both with equal content.
    pub unmodified: IndexMap<String, T>,
}

impl<T> Default for Differences<T> {
    fn default() -> Self {
        Self {
            added: IndexMap::new(),
            removed: IndexMap::new(),
            modified: IndexMap::new(),
            unmodified: IndexMap::new(),
        }
    }
}

impl<T> Differences<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Partition `target` against `source` by identity key.
///
/// Works for any value with equality; column maps are diffed with this
/// too, not just full schema objects.
pub fn differences<T: Clone + PartialEq>(
    source: &IndexMap<String, T>,
    target: &IndexMap<String, T>,
) -> Differences<T> {
    let mut out = Differences::default();

    for (key, value) in target {
        match source.get(key) {
            None => {
                out.added.insert(key.clone(), value.clone());
            }
            Some(previous) if previous == value => {
                out.unmodified.insert(key.clone(), value.clone());
            }
            Some(previous) => {
                out.modified.insert(
                    key.clone(),
                    ModifiedPair {
                        from: previous.clone(),
                        target: value.clone(),
                    },
                );
            }
        }
    }

    for (key, value) in source {
        if !target.contains_key(key) {
            out.removed.insert(key.clone(), value.clone());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgdelta_db_schema::{SchemaDef, SchemaObject};
    use proptest::prelude::*;

    fn schemas(names: &[&str]) -> IndexMap<String, SchemaDef> {
        names
            .iter()
            .map(|n| {
                let s = SchemaDef::new(*n);
                (s.identity(), s)
            })
            .collect()
    }

    #[test]
    fn test_identical_maps_have_no_differences() {
        let a = schemas(&["public", "audit"]);
        let diff = differences(&a, &a.clone());
        assert!(diff.is_empty());
        assert_eq!(diff.unmodified.len(), 2);
    }

    #[test]
    fn test_added_and_removed() {
        let source = schemas(&["public", "legacy"]);
        let target = schemas(&["public", "audit"]);
        let diff = differences(&source, &target);
        assert_eq!(diff.added.keys().collect::<Vec<_>>(), vec!["\"audit\""]);
        assert_eq!(diff.removed.keys().collect::<Vec<_>>(), vec!["\"legacy\""]);
        assert_eq!(diff.unmodified.keys().collect::<Vec<_>>(), vec!["\"public\""]);
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn test_modified_carries_both_versions() {
        use pgdelta_db_schema::Extension;

        let mut source = IndexMap::new();
        let old = Extension::new("citext", "public", "1.5");
        source.insert(old.identity(), old);

        let mut target = IndexMap::new();
        let new = Extension::new("citext", "public", "1.6");
        target.insert(new.identity(), new);

        let diff = differences(&source, &target);
        let pair = &diff.modified["\"citext\""];
        assert_eq!(pair.from.version, "1.5");
        assert_eq!(pair.target.version, "1.6");
    }

    proptest! {
        // Every key of either input lands in exactly one bucket.
        #[test]
        fn prop_partition_is_total_and_disjoint(
            source_names in proptest::collection::hash_set("[a-z]{1,6}", 0..8),
            target_names in proptest::collection::hash_set("[a-z]{1,6}", 0..8),
        ) {
            let source: IndexMap<String, SchemaDef> = source_names
                .iter()
                .map(|n| {
                    let s = SchemaDef::new(n.clone());
                    (s.identity(), s)
                })
                .collect();
            let target: IndexMap<String, SchemaDef> = target_names
                .iter()
                .map(|n| {
                    let s = SchemaDef::new(n.clone());
                    (s.identity(), s)
                })
                .collect();

            let diff = differences(&source, &target);

            prop_assert_eq!(
                diff.added.len() + diff.modified.len() + diff.unmodified.len(),
                target.len()
            );
            prop_assert_eq!(
                diff.removed.len() + diff.modified.len() + diff.unmodified.len(),
                source.len()
            );
            for key in diff.added.keys() {
                prop_assert!(!source.contains_key(key) && target.contains_key(key));
            }
            for key in diff.removed.keys() {
                prop_assert!(source.contains_key(key) && !target.contains_key(key));
            }
            for key in diff.unmodified.keys() {
                prop_assert!(source.contains_key(key) && target.contains_key(key));
            }
        }
    }
}
