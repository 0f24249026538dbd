//! Abstract Syntax Tree for rule expressions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, RuleEngineError};

/// Deepest tree the engine builds or accepts, counting an operand as one
/// level. Also bounds parenthesis nesting in rule text.
///
/// Keeps the portable JSON form under `serde_json`'s nesting limit.
pub const MAX_RULE_DEPTH: usize = 100;

/// AST node for rule expressions
///
/// A tree is identified by its root. The absent root (`None` wherever an
/// `Option<ExpressionNode>` is used) is the "always true" tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    /// Leaf comparison like "age > 18"
    Operand(Condition),
    /// AND / OR over two subtrees
    Operator {
        kind: LogicalOp,
        left: Box<ExpressionNode>,
        right: Box<ExpressionNode>,
    },
}

impl ExpressionNode {
    pub fn operand(condition: Condition) -> Self {
        ExpressionNode::Operand(condition)
    }

    pub fn operator(kind: LogicalOp, left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::Operator {
            kind,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::operator(LogicalOp::And, left, right)
    }

    pub fn or(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::operator(LogicalOp::Or, left, right)
    }

    /// Height of the tree; a single operand is 1
    pub fn depth(&self) -> usize {
        match self {
            ExpressionNode::Operand(_) => 1,
            ExpressionNode::Operator { left, right, .. } => left.depth().max(right.depth()) + 1,
        }
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionNode::Operand(cond) => write!(f, "{}", cond),
            ExpressionNode::Operator { kind, left, right } => {
                write!(f, "({} {} {})", left, kind, right)
            }
        }
    }
}

/// Logical operators joining two subtrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }

    /// Keyword lookup; case-sensitive
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "AND" => Some(LogicalOp::And),
            "OR" => Some(LogicalOp::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
    /// Equal (=)
    Equal,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Greater => ">",
            Comparator::Less => "<",
            Comparator::Equal => "=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Result<Self> {
        match symbol {
            ">" => Ok(Comparator::Greater),
            "<" => Ok(Comparator::Less),
            "=" => Ok(Comparator::Equal),
            other => Err(RuleEngineError::UnsupportedComparator(other.to_string())),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Literal on the right-hand side of a condition
///
/// Serialized as a bare JSON number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{:?}", v),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}

/// Single comparison, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: String,
    comparator: Comparator,
    literal: Literal,
}

impl Condition {
    pub fn new(field: impl Into<String>, comparator: Comparator, literal: Literal) -> Self {
        Self {
            field: field.into(),
            comparator,
            literal,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    pub fn literal(&self) -> &Literal {
        &self.literal
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.comparator, self.literal)
    }
}
