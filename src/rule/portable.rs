//! Portable (storage-ready) tree form
//!
//! Wire shape, stable because it is persisted:
//!
//! ```json
//! {"node_type": "operator", "left": {..}, "right": {..}, "value": {"kind": "AND"}}
//! {"node_type": "operand", "left": null, "right": null,
//!  "value": {"field": "age", "comparator": ">", "literal": 18}}
//! ```
//!
//! The absent tree is JSON `null`. Records written by the previous backend
//! (`lvariable` / `comparison_type` / `rvalue`, operator `type`) are read
//! through field aliases.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleEngineError};
use crate::rule::ast::{Comparator, Condition, ExpressionNode, Literal, LogicalOp};

pub const NODE_TYPE_OPERAND: &str = "operand";
pub const NODE_TYPE_OPERATOR: &str = "operator";

/// Portable form of a whole tree; `None` is the always-true tree
pub type PortableTree = Option<PortableNode>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableNode {
    pub node_type: String,
    #[serde(default)]
    pub left: Option<Box<PortableNode>>,
    #[serde(default)]
    pub right: Option<Box<PortableNode>>,
    pub value: PortableValue,
}

/// Node payload: a condition record or an operator-kind record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortableValue {
    Condition {
        #[serde(alias = "lvariable")]
        field: String,
        #[serde(alias = "comparison_type")]
        comparator: String,
        #[serde(alias = "rvalue")]
        literal: Literal,
    },
    Operator {
        #[serde(alias = "type")]
        kind: String,
    },
}

impl From<&ExpressionNode> for PortableNode {
    fn from(node: &ExpressionNode) -> Self {
        match node {
            ExpressionNode::Operand(cond) => PortableNode {
                node_type: NODE_TYPE_OPERAND.to_string(),
                left: None,
                right: None,
                value: PortableValue::Condition {
                    field: cond.field().to_string(),
                    comparator: cond.comparator().symbol().to_string(),
                    literal: cond.literal().clone(),
                },
            },
            ExpressionNode::Operator { kind, left, right } => PortableNode {
                node_type: NODE_TYPE_OPERATOR.to_string(),
                left: Some(Box::new(PortableNode::from(left.as_ref()))),
                right: Some(Box::new(PortableNode::from(right.as_ref()))),
                value: PortableValue::Operator {
                    kind: kind.as_str().to_string(),
                },
            },
        }
    }
}

impl TryFrom<PortableNode> for ExpressionNode {
    type Error = RuleEngineError;

    fn try_from(node: PortableNode) -> Result<Self> {
        match (node.node_type.as_str(), node.value) {
            (
                NODE_TYPE_OPERAND,
                PortableValue::Condition {
                    field,
                    comparator,
                    literal,
                },
            ) => {
                if node.left.is_some() || node.right.is_some() {
                    return Err(RuleEngineError::DeserializationError(format!(
                        "operand node '{}' must not have children",
                        field
                    )));
                }
                if field.is_empty() {
                    return Err(RuleEngineError::DeserializationError(
                        "operand node has an empty field name".to_string(),
                    ));
                }
                let comparator = Comparator::from_symbol(&comparator)?;
                Ok(ExpressionNode::operand(Condition::new(
                    field, comparator, literal,
                )))
            }
            (NODE_TYPE_OPERATOR, PortableValue::Operator { kind }) => {
                let kind = LogicalOp::from_keyword(&kind).ok_or_else(|| {
                    RuleEngineError::DeserializationError(format!(
                        "unknown operator kind '{}'",
                        kind
                    ))
                })?;
                let (Some(left), Some(right)) = (node.left, node.right) else {
                    return Err(RuleEngineError::DeserializationError(format!(
                        "{} node must have two children",
                        kind
                    )));
                };
                Ok(ExpressionNode::operator(
                    kind,
                    ExpressionNode::try_from(*left)?,
                    ExpressionNode::try_from(*right)?,
                ))
            }
            (NODE_TYPE_OPERAND | NODE_TYPE_OPERATOR, _) => {
                Err(RuleEngineError::DeserializationError(format!(
                    "{} node has a mismatched value payload",
                    node.node_type
                )))
            }
            (other, _) => Err(RuleEngineError::DeserializationError(format!(
                "unknown node type '{}'",
                other
            ))),
        }
    }
}

/// Convert a tree into its portable form
pub fn to_portable(root: Option<&ExpressionNode>) -> PortableTree {
    root.map(PortableNode::from)
}

/// Rebuild a tree from its portable form, validating its shape
pub fn from_portable(tree: PortableTree) -> Result<Option<ExpressionNode>> {
    tree.map(ExpressionNode::try_from).transpose()
}

/// Serialize a tree to its JSON portable form
pub fn to_json(root: Option<&ExpressionNode>) -> Result<String> {
    Ok(serde_json::to_string(&to_portable(root))?)
}

/// Parse JSON into the portable form without validating node shapes
///
/// Blank input is the absent tree, as written by the previous backend.
pub fn portable_from_json(json: &str) -> Result<PortableTree> {
    if json.trim().is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str(json)?)
}

/// Deserialize a tree from its JSON portable form
pub fn from_json(json: &str) -> Result<Option<ExpressionNode>> {
    from_portable(portable_from_json(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::rule::ast::MAX_RULE_DEPTH;
    use crate::rule::combiner::conjoin;
    use crate::rule::evaluator::evaluate;
    use crate::rule::parser::parse;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let ast = parse("age > 18 AND status = 'active'").unwrap();
        let value: serde_json::Value = serde_json::from_str(&to_json(Some(&ast)).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "node_type": "operator",
                "left": {
                    "node_type": "operand",
                    "left": null,
                    "right": null,
                    "value": {"field": "age", "comparator": ">", "literal": 18}
                },
                "right": {
                    "node_type": "operand",
                    "left": null,
                    "right": null,
                    "value": {"field": "status", "comparator": "=", "literal": "active"}
                },
                "value": {"kind": "AND"}
            })
        );
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let ast = parse("(a > 1 OR b < 2.5) AND c = 'x'").unwrap();
        let json = to_json(Some(&ast)).unwrap();
        assert_eq!(from_json(&json).unwrap(), Some(ast));
    }

    #[test]
    fn test_float_literal_stays_float() {
        let ast = parse("score = 2.0").unwrap();
        let back = from_json(&to_json(Some(&ast)).unwrap()).unwrap().unwrap();
        match back {
            ExpressionNode::Operand(c) => assert_eq!(c.literal(), &Literal::Float(2.0)),
            _ => panic!("Expected operand"),
        }
    }

    #[test]
    fn test_null_tree() {
        assert_eq!(to_json(None).unwrap(), "null");
        assert_eq!(from_json("null").unwrap(), None);
        assert_eq!(from_json("").unwrap(), None);
    }

    #[test]
    fn test_legacy_field_names() {
        let legacy = r#"{
            "node_type": "operator",
            "left": {"node_type": "operand", "left": null, "right": null,
                     "value": {"lvariable": "age", "rvalue": 30, "comparison_type": ">"}},
            "right": {"node_type": "operand", "left": null, "right": null,
                      "value": {"lvariable": "department", "rvalue": "Sales", "comparison_type": "="}},
            "value": {"type": "AND"}
        }"#;
        let ast = from_json(legacy).unwrap().unwrap();
        assert_eq!(ast, parse("age > 30 AND department = 'Sales'").unwrap());

        let record = Record::new().with("age", 35).with("department", "Sales");
        assert!(ast.evaluate(&record).unwrap());
    }

    #[test]
    fn test_unknown_operator_kind() {
        let bad = json!({
            "node_type": "operator",
            "left": {"node_type": "operand", "value": {"field": "a", "comparator": ">", "literal": 1}},
            "right": {"node_type": "operand", "value": {"field": "b", "comparator": ">", "literal": 1}},
            "value": {"kind": "XOR"}
        });
        assert_eq!(
            from_json(&bad.to_string()).unwrap_err(),
            RuleEngineError::DeserializationError("unknown operator kind 'XOR'".to_string())
        );
    }

    #[test]
    fn test_operator_missing_child() {
        let bad = json!({
            "node_type": "operator",
            "left": {"node_type": "operand", "value": {"field": "a", "comparator": ">", "literal": 1}},
            "value": {"kind": "OR"}
        });
        assert!(matches!(
            from_json(&bad.to_string()).unwrap_err(),
            RuleEngineError::DeserializationError(_)
        ));
    }

    #[test]
    fn test_operand_with_children() {
        let leaf = json!({"node_type": "operand", "value": {"field": "a", "comparator": ">", "literal": 1}});
        let bad = json!({
            "node_type": "operand",
            "left": leaf,
            "value": {"field": "b", "comparator": "<", "literal": 2}
        });
        assert!(matches!(
            from_json(&bad.to_string()).unwrap_err(),
            RuleEngineError::DeserializationError(_)
        ));
    }

    #[test]
    fn test_unsupported_comparator() {
        let bad = json!({"node_type": "operand", "value": {"field": "a", "comparator": ">=", "literal": 1}});
        assert_eq!(
            from_json(&bad.to_string()).unwrap_err(),
            RuleEngineError::UnsupportedComparator(">=".to_string())
        );
    }

    #[test]
    fn test_mismatched_payload_and_unknown_node_type() {
        let bad = json!({"node_type": "operand", "value": {"kind": "AND"}});
        assert!(matches!(
            from_json(&bad.to_string()).unwrap_err(),
            RuleEngineError::DeserializationError(_)
        ));

        let bad = json!({"node_type": "leaf", "value": {"kind": "AND"}});
        assert_eq!(
            from_json(&bad.to_string()).unwrap_err(),
            RuleEngineError::DeserializationError("unknown node type 'leaf'".to_string())
        );
    }

    #[test]
    fn test_deepest_trees_reload() {
        let chain = vec!["a > 1"; MAX_RULE_DEPTH].join(" AND ");
        let parsed = parse(&chain).unwrap();
        let conjoined = conjoin(&vec!["b < 2"; MAX_RULE_DEPTH]).unwrap();

        for tree in [parsed, conjoined] {
            assert_eq!(tree.depth(), MAX_RULE_DEPTH);
            let back = from_json(&to_json(Some(&tree)).unwrap()).unwrap();
            assert_eq!(back.as_ref(), Some(&tree));

            let record = Record::new().with("a", 5).with("b", 0);
            assert_eq!(
                evaluate(back.as_ref(), &record).unwrap(),
                tree.evaluate(&record).unwrap()
            );
        }
    }

    #[test]
    fn test_string_literals_needing_escapes() {
        let ast = parse(r#"note = 'say "hi" \ bye' OR city = 'new york'"#).unwrap();
        let json = to_json(Some(&ast)).unwrap();
        assert!(json.contains(r#"say \"hi\" \\ bye"#));
        assert_eq!(from_json(&json).unwrap(), Some(ast));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            from_json("{not json").unwrap_err(),
            RuleEngineError::DeserializationError(_)
        ));
    }
}
