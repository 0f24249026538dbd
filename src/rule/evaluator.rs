//! Rule evaluator

use std::cmp::Ordering;

use crate::error::{Result, RuleEngineError};
use crate::record::{Record, RuntimeValue};
use crate::rule::ast::{Comparator, Condition, ExpressionNode, Literal, LogicalOp};

/// Evaluate a tree against a record; the absent tree matches everything
pub fn evaluate(root: Option<&ExpressionNode>, record: &Record) -> Result<bool> {
    match root {
        None => Ok(true),
        Some(node) => node.evaluate(record),
    }
}

impl ExpressionNode {
    /// Evaluate this subtree against a record
    ///
    /// AND / OR short-circuit; a missing field on the skipped side is not
    /// reported.
    pub fn evaluate(&self, record: &Record) -> Result<bool> {
        match self {
            ExpressionNode::Operand(cond) => {
                let value = record
                    .get(cond.field())
                    .ok_or_else(|| RuleEngineError::MissingField(cond.field().to_string()))?;
                cond.evaluate(value)
            }
            ExpressionNode::Operator { kind, left, right } => match kind {
                LogicalOp::And => Ok(left.evaluate(record)? && right.evaluate(record)?),
                LogicalOp::Or => Ok(left.evaluate(record)? || right.evaluate(record)?),
            },
        }
    }
}

impl Condition {
    /// Test a single value against this condition's literal
    pub fn evaluate(&self, value: &RuntimeValue) -> Result<bool> {
        let ordering = compare(value, self.literal())?;
        Ok(match self.comparator() {
            Comparator::Greater => ordering == Some(Ordering::Greater),
            Comparator::Less => ordering == Some(Ordering::Less),
            Comparator::Equal => ordering == Some(Ordering::Equal),
        })
    }
}

/// Order a runtime value against a literal
///
/// Ints and floats compare numerically with each other, strings compare
/// lexicographically. `None` means unordered (NaN).
fn compare(value: &RuntimeValue, literal: &Literal) -> Result<Option<Ordering>> {
    match (value, literal) {
        (RuntimeValue::Int(v), Literal::Int(l)) => Ok(Some(v.cmp(l))),
        (RuntimeValue::Int(v), Literal::Float(l)) => Ok((*v as f64).partial_cmp(l)),
        (RuntimeValue::Float(v), Literal::Int(l)) => Ok(v.partial_cmp(&(*l as f64))),
        (RuntimeValue::Float(v), Literal::Float(l)) => Ok(v.partial_cmp(l)),
        (RuntimeValue::String(v), Literal::String(l)) => Ok(Some(v.as_str().cmp(l.as_str()))),
        _ => Err(RuleEngineError::TypeMismatch {
            value: value.type_name().to_string(),
            literal: literal.type_name().to_string(),
        }),
    }
}
