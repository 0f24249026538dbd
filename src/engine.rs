//! Rule engine operations
//!
//! Stateless operations on rule text and portable trees, plus the named-rule
//! operations backed by a [`RuleStore`].

use tracing::{debug, info, instrument};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::record::Record;
use crate::rule::{
    self, combine, conjoin, fields_of, from_portable, to_portable, ExpressionNode, PortableTree,
};
use crate::store::RuleStore;

/// Parse one rule and produce its tree together with its portable form
pub fn parse_rule(text: &str) -> Result<(ExpressionNode, PortableTree)> {
    let root = rule::get_or_parse(text)?;
    let tree = to_portable(Some(&root));
    Ok((root, tree))
}

/// Combine rules under the majority-vote operator (pairwise reduction)
pub fn combine_rules<S: AsRef<str>>(rules: &[S]) -> Result<(ExpressionNode, PortableTree)> {
    let root = combine(rules)?;
    let tree = to_portable(Some(&root));
    Ok((root, tree))
}

/// Combine rules with AND, folding left to right
pub fn conjoin_rules<S: AsRef<str>>(rules: &[S]) -> Result<(ExpressionNode, PortableTree)> {
    let root = conjoin(rules)?;
    let tree = to_portable(Some(&root));
    Ok((root, tree))
}

/// Evaluate a portable tree against a record
pub fn evaluate_portable(tree: PortableTree, record: &Record) -> Result<bool> {
    let root = from_portable(tree)?;
    rule::evaluate(root.as_ref(), record)
}

/// Fields referenced by a portable tree
pub fn fields_of_portable(tree: PortableTree) -> Result<Vec<String>> {
    let root = from_portable(tree)?;
    Ok(fields_of(root.as_ref()))
}

/// Named-rule engine over a storage backend
pub struct RuleEngine<S: RuleStore> {
    store: S,
    config: EngineConfig,
}

impl<S: RuleStore> RuleEngine<S> {
    /// Create an engine and apply its cache settings
    pub fn new(store: S, config: EngineConfig) -> Self {
        config.apply();
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Compile a rule and store it under `name`
    #[instrument(skip_all, fields(rule_name = %name))]
    pub fn create_rule(&self, name: &str, text: &str) -> Result<ExpressionNode> {
        let (root, tree) = parse_rule(text)?;
        self.store.store_tree(name, &tree)?;
        info!("rule created");
        Ok(root)
    }

    /// Load a stored rule's tree
    pub fn load_rule(&self, name: &str) -> Result<Option<ExpressionNode>> {
        from_portable(self.store.load_tree_by_name(name)?)
    }

    /// Evaluate a stored rule against a record
    #[instrument(skip_all, fields(rule_name = %name))]
    pub fn evaluate_rule(&self, name: &str, record: &Record) -> Result<bool> {
        let tree = self.store.load_tree_by_name(name)?;
        let result = evaluate_portable(tree, record)?;
        debug!(result, "rule evaluated");
        Ok(result)
    }

    /// Fields a stored rule depends on
    #[instrument(skip_all, fields(rule_name = %name))]
    pub fn rule_fields(&self, name: &str) -> Result<Vec<String>> {
        fields_of_portable(self.store.load_tree_by_name(name)?)
    }
}
