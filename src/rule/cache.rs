//! Rule parsing cache - rule text to parsed tree, with fast hashing
//!
//! Results never depend on the cache state; it only skips repeated parsing.

use crate::error::Result;
use crate::record::Record;
use crate::rule::ast::ExpressionNode;
use crate::rule::parser;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

pub const DEFAULT_CACHE_CAPACITY: usize = 2048;

/// Global rule cache with fast hashing (ahash)
static RULE_CACHE: Lazy<RwLock<AHashMap<String, ExpressionNode>>> =
    Lazy::new(|| RwLock::new(AHashMap::with_capacity(DEFAULT_CACHE_CAPACITY)));

static CACHE_ENABLED: AtomicBool = AtomicBool::new(true);
static CACHE_CAPACITY: AtomicUsize = AtomicUsize::new(DEFAULT_CACHE_CAPACITY);

/// Apply cache settings; shrinking below the current size clears the cache
pub fn configure(enabled: bool, capacity: usize) {
    CACHE_ENABLED.store(enabled, Ordering::Relaxed);
    CACHE_CAPACITY.store(capacity, Ordering::Relaxed);

    let mut cache = RULE_CACHE.write();
    if !enabled || cache.len() > capacity {
        cache.clear();
    }
}

/// Get or parse a rule string, using the cache for repeated rules
///
/// Parse errors are returned as-is and never cached.
#[inline]
pub fn get_or_parse(rule: &str) -> Result<ExpressionNode> {
    if !CACHE_ENABLED.load(Ordering::Relaxed) {
        return parser::parse(rule);
    }

    // Fast path: check read lock first
    {
        let cache = RULE_CACHE.read();
        if let Some(ast) = cache.get(rule) {
            return Ok(ast.clone());
        }
    }

    // Slow path: parse and cache
    let ast = parser::parse(rule)?;
    debug!(rule, "rule cache miss");

    let capacity = CACHE_CAPACITY.load(Ordering::Relaxed);
    if capacity > 0 {
        let mut cache = RULE_CACHE.write();
        if cache.len() >= capacity {
            cache.clear();
        }
        cache.insert(rule.to_string(), ast.clone());
    }

    Ok(ast)
}

/// Check a rule text against a record, using the cached tree
///
/// Blank text is the always-true tree.
#[inline]
pub fn check_rule_text(rule: &str, record: &Record) -> Result<bool> {
    if rule.trim().is_empty() {
        return Ok(true);
    }

    let ast = get_or_parse(rule)?;
    ast.evaluate(record)
}

/// Clear the rule cache
pub fn clear_cache() {
    let mut cache = RULE_CACHE.write();
    cache.clear();
}

/// Number of cached rules
pub fn cache_size() -> usize {
    let cache = RULE_CACHE.read();
    cache.len()
}
