use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use super::request::CachedResponse;

type Partition = Arc<DashMap<String, CachedResponse>>;

/// Named caches, shared by every router generation.
///
/// Partition names are full names such as `fsd-static-v1`; [`CacheNames`]
/// builds them from a prefix, a logical partition and a version.
#[derive(Debug, Default)]
pub struct CacheStorage {
    partitions: DashMap<String, Partition>,
}

/// Entry count of one partition, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionInfo {
    pub name: String,
    pub entries: usize,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a partition, creating it if missing.
    fn open(&self, name: &str) -> Partition {
        self.partitions
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(DashMap::new()))
            .clone()
    }

    pub fn lookup(&self, name: &str, key: &str) -> Option<CachedResponse> {
        let partition = self.partitions.get(name)?.clone();
        let entry = partition.get(key).map(|r| r.clone());
        entry
    }

    pub fn store(&self, name: &str, key: &str, response: CachedResponse) {
        self.open(name).insert(key.to_string(), response);
    }

    pub fn has_partition(&self, name: &str) -> bool {
        self.partitions.contains_key(name)
    }

    /// Remove a whole partition. Returns whether it existed.
    pub fn delete(&self, name: &str) -> bool {
        self.partitions.remove(name).is_some()
    }

    /// Partition names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.partitions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn info(&self) -> Vec<PartitionInfo> {
        let mut info: Vec<PartitionInfo> = self
            .partitions
            .iter()
            .map(|e| PartitionInfo {
                name: e.key().clone(),
                entries: e.value().len(),
            })
            .collect();
        info.sort_by(|a, b| a.name.cmp(&b.name));
        info
    }
}

/// Builds versioned partition names: `{prefix}-{partition}-{version}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    prefix: String,
    version: String,
}

impl CacheNames {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn full(&self, partition: &str) -> String {
        format!("{}-{}-{}", self.prefix, partition, self.version)
    }

    /// Whether `name` is exactly `{prefix}-{partition}-{other version}` for
    /// one of the given logical partitions.
    pub fn is_stale(&self, name: &str, partitions: &[&str]) -> bool {
        partitions.iter().any(|partition| {
            name.strip_prefix(&format!("{}-{}-", self.prefix, partition))
                .is_some_and(|version| !version.is_empty() && !version.contains('-') && version != self.version)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_lookup_are_per_partition() {
        let storage = CacheStorage::new();
        storage.store("fsd-static-v1", "http://x/a.js", CachedResponse::new(200, vec![], "a"));

        assert!(storage.lookup("fsd-static-v1", "http://x/a.js").is_some());
        assert!(storage.lookup("fsd-pages-v1", "http://x/a.js").is_none());
        assert!(storage.lookup("fsd-static-v1", "http://x/b.js").is_none());
    }

    #[test]
    fn info_counts_entries() {
        let storage = CacheStorage::new();
        storage.store("b", "1", CachedResponse::new(200, vec![], ""));
        storage.store("a", "1", CachedResponse::new(200, vec![], ""));
        storage.store("a", "2", CachedResponse::new(200, vec![], ""));

        assert_eq!(
            storage.info(),
            vec![
                PartitionInfo { name: "a".into(), entries: 2 },
                PartitionInfo { name: "b".into(), entries: 1 },
            ]
        );
        assert!(storage.delete("a"));
        assert!(!storage.delete("a"));
        assert_eq!(storage.names(), vec!["b"]);
    }

    #[test]
    fn names_are_versioned() {
        let names = CacheNames::new("fsd", "v2");
        assert_eq!(names.full("static"), "fsd-static-v2");
        assert!(names.is_stale("fsd-static-v1", &["static"]));
        assert!(!names.is_stale("fsd-static-v2", &["static"]));
        assert!(!names.is_stale("other-static-v1", &["static"]));
    }

    #[test]
    fn unknown_partitions_sharing_the_prefix_are_not_stale() {
        let names = CacheNames::new("fsd", "v2");
        let partitions = ["static", "pages"];

        assert!(!names.is_stale("fsd-admin-pages-v9", &partitions));
        assert!(!names.is_stale("fsd-images-v1", &partitions));
        assert!(!names.is_stale("fsd-static-", &partitions));
        assert!(!names.is_stale("fsd-pages-v1-backup", &partitions));
        assert!(names.is_stale("fsd-pages-v1", &partitions));
    }
}
