//! Field extraction

use crate::rule::ast::ExpressionNode;

/// Field names referenced by a tree's leaves, in pre-order (node, left,
/// right), duplicates kept. The absent tree references nothing.
pub fn fields_of(root: Option<&ExpressionNode>) -> Vec<String> {
    let mut fields = Vec::new();
    if let Some(node) = root {
        collect(node, &mut fields);
    }
    fields
}

fn collect(node: &ExpressionNode, fields: &mut Vec<String>) {
    match node {
        ExpressionNode::Operand(cond) => fields.push(cond.field().to_string()),
        ExpressionNode::Operator { left, right, .. } => {
            collect(left, fields);
            collect(right, fields);
        }
    }
}
