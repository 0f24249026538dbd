//! Combining several rules into one tree
//!
//! Two strategies exist and are kept apart on purpose:
//!
//! - [`combine`]: majority-vote operator with pairwise queue reduction.
//! - [`conjoin`]: always AND, strict left fold.
//!
//! Either fails with `RuleTooDeep` when the result would exceed
//! [`MAX_RULE_DEPTH`].

use std::collections::VecDeque;

use tracing::debug;

use crate::error::{Result, RuleEngineError};
use crate::rule::ast::{ExpressionNode, LogicalOp, MAX_RULE_DEPTH};
use crate::rule::cache::get_or_parse;

/// Join two subtrees whose heights are already known
fn join(
    kind: LogicalOp,
    (left, left_depth): (ExpressionNode, usize),
    (right, right_depth): (ExpressionNode, usize),
) -> Result<(ExpressionNode, usize)> {
    let depth = left_depth.max(right_depth) + 1;
    if depth > MAX_RULE_DEPTH {
        return Err(RuleEngineError::RuleTooDeep {
            depth,
            max: MAX_RULE_DEPTH,
        });
    }
    Ok((ExpressionNode::operator(kind, left, right), depth))
}

fn parse_with_depth(rule: &str) -> Result<(ExpressionNode, usize)> {
    let tree = get_or_parse(rule)?;
    let depth = tree.depth();
    Ok((tree, depth))
}

/// Pick the combining operator by counting the raw substrings "AND" and
/// "OR" across all rule texts. Ties go to AND.
///
/// Counting is on text, not trees: `ORDER > 1` counts one "OR".
pub fn majority_operator<S: AsRef<str>>(rules: &[S]) -> LogicalOp {
    let (and_count, or_count) = rules.iter().fold((0, 0), |(and, or), rule| {
        let rule = rule.as_ref();
        (and + rule.matches("AND").count(), or + rule.matches("OR").count())
    });

    if and_count >= or_count {
        LogicalOp::And
    } else {
        LogicalOp::Or
    }
}

/// Combine rules under the majority-vote operator
///
/// Reduction order: pop the first two trees, join them, push the result to
/// the back; repeat until one tree remains. For `[a, b, c]` this yields
/// `c OP (a OP b)`, for `[a, b, c, d]` it yields `(a OP b) OP (c OP d)`.
pub fn combine<S: AsRef<str>>(rules: &[S]) -> Result<ExpressionNode> {
    if rules.is_empty() {
        return Err(RuleEngineError::NoRulesToCombine);
    }

    let mut queue = rules
        .iter()
        .map(|rule| parse_with_depth(rule.as_ref()))
        .collect::<Result<VecDeque<_>>>()?;

    let kind = majority_operator(rules);
    debug!(rules = rules.len(), operator = %kind, "combining rules by majority vote");

    loop {
        match (queue.pop_front(), queue.pop_front()) {
            (Some(left), Some(right)) => queue.push_back(join(kind, left, right)?),
            (Some((root, _)), None) => return Ok(root),
            (None, _) => return Err(RuleEngineError::NoRulesToCombine),
        }
    }
}

/// Combine rules with AND, folding strictly left to right:
/// `[a, b, c]` becomes `(a AND b) AND c`
pub fn conjoin<S: AsRef<str>>(rules: &[S]) -> Result<ExpressionNode> {
    let mut trees = rules.iter().map(|rule| parse_with_depth(rule.as_ref()));

    let first = trees.next().ok_or(RuleEngineError::NoRulesToCombine)??;
    debug!(rules = rules.len(), "conjoining rules");

    let (root, _) = trees.try_fold(first, |acc, tree| join(LogicalOp::And, acc, tree?))?;
    Ok(root)
}
