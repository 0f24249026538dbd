//! Persistence of compiled rules
//!
//! The engine only needs two operations from its storage backend: load a
//! portable tree by rule name and store one under a new name. How they are
//! backed (relational, document, memory) is up to the implementation.

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::warn;

use crate::error::{Result, RuleEngineError};
use crate::rule::portable::{self, PortableTree};

/// Storage backend for compiled rules, keyed by rule name
pub trait RuleStore: Send + Sync {
    /// Load the portable tree stored under `name`
    fn load_tree_by_name(&self, name: &str) -> Result<PortableTree>;

    /// Store a portable tree under `name`; names are unique
    fn store_tree(&self, name: &str, tree: &PortableTree) -> Result<()>;
}

/// In-memory store keeping each tree as its serialized JSON text
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: RwLock<AHashMap<String, String>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Stored rule names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rules.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl RuleStore for MemoryRuleStore {
    fn load_tree_by_name(&self, name: &str) -> Result<PortableTree> {
        let rules = self.rules.read();
        let Some(json) = rules.get(name) else {
            warn!(rule_name = name, "rule not found");
            return Err(RuleEngineError::RuleNotFound(name.to_string()));
        };
        portable::portable_from_json(json)
    }

    fn store_tree(&self, name: &str, tree: &PortableTree) -> Result<()> {
        if name.trim().is_empty() {
            return Err(RuleEngineError::StorageError(
                "rule name must not be empty".to_string(),
            ));
        }

        let json = serde_json::to_string(tree)
            .map_err(|e| RuleEngineError::StorageError(e.to_string()))?;

        let mut rules = self.rules.write();
        if rules.contains_key(name) {
            return Err(RuleEngineError::StorageError(format!(
                "rule already exists: {}",
                name
            )));
        }
        rules.insert(name.to_string(), json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{parse, to_portable};

    #[test]
    fn test_store_and_load() {
        let store = MemoryRuleStore::new();
        let ast = parse("age > 18").unwrap();
        let tree = to_portable(Some(&ast));

        store.store_tree("adults", &tree).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load_tree_by_name("adults").unwrap(), tree);
    }

    #[test]
    fn test_store_null_tree() {
        let store = MemoryRuleStore::new();
        store.store_tree("anything", &None).unwrap();
        assert_eq!(store.load_tree_by_name("anything").unwrap(), None);
    }

    #[test]
    fn test_load_missing() {
        let store = MemoryRuleStore::new();
        assert_eq!(
            store.load_tree_by_name("nope").unwrap_err(),
            RuleEngineError::RuleNotFound("nope".to_string())
        );
    }

    #[test]
    fn test_duplicate_and_blank_names() {
        let store = MemoryRuleStore::new();
        let tree = to_portable(Some(&parse("a > 1").unwrap()));

        store.store_tree("r1", &tree).unwrap();
        assert!(matches!(
            store.store_tree("r1", &tree).unwrap_err(),
            RuleEngineError::StorageError(_)
        ));
        assert!(matches!(
            store.store_tree("  ", &tree).unwrap_err(),
            RuleEngineError::StorageError(_)
        ));
        assert_eq!(store.names(), vec!["r1"]);
    }
}
