//! Recursive-descent rule parser
//!
//! Grammar:
//!
//! ```text
//! expression := term ( ("AND" | "OR") term )*
//! term       := "(" expression ")" | condition
//! condition  := IDENT comparator value
//! comparator := ">" | "<" | "="
//! value      := INTEGER | FLOAT | STRING
//! ```
//!
//! AND and OR share one precedence level and fold left-associatively, so
//! `a > 1 AND b > 2 OR c > 3` is `(a > 1 AND b > 2) OR c > 3`.
//!
//! Both the tree height and the parenthesis nesting are capped at
//! [`MAX_RULE_DEPTH`].

use crate::error::{Result, RuleEngineError};
use crate::rule::ast::{Comparator, Condition, ExpressionNode, Literal, LogicalOp, MAX_RULE_DEPTH};
use crate::rule::tokenizer::tokenize;

const SYMBOLS: [&str; 11] = ["(", ")", "=", ">", "<", "!", "=>", "<=", ">=", "&&", "||"];

/// Parse a rule string into an AST
pub fn parse(rule: &str) -> Result<ExpressionNode> {
    let tokens = tokenize(rule)?;
    parse_tokens(&tokens)
}

/// Parse an already tokenized rule
///
/// The whole token sequence must form one expression; leftovers are a
/// `SyntaxError` at the first unconsumed token.
pub fn parse_tokens(tokens: &[&str]) -> Result<ExpressionNode> {
    if tokens.is_empty() {
        return Err(RuleEngineError::EmptyRule);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
    };
    let (root, _) = parser.parse_expression()?;

    if let Some(token) = parser.peek() {
        return Err(RuleEngineError::syntax(
            parser.pos,
            format!("unexpected token '{}'", token),
        ));
    }

    Ok(root)
}

struct Parser<'t, 'a> {
    tokens: &'t [&'a str],
    pos: usize,
    /// Open parentheses around the current position
    nesting: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next_token(&mut self, expected: &str) -> Result<&'a str> {
        let token = self.peek().ok_or_else(|| {
            RuleEngineError::syntax(self.pos, format!("expected {}, found end of rule", expected))
        })?;
        self.pos += 1;
        Ok(token)
    }

    /// Returns the subtree together with its height
    fn parse_expression(&mut self) -> Result<(ExpressionNode, usize)> {
        let (mut node, mut depth) = self.parse_term()?;

        while let Some(kind) = self.peek().and_then(LogicalOp::from_keyword) {
            let operator_pos = self.pos;
            self.pos += 1;
            let (right, right_depth) = self.parse_term()?;

            depth = depth.max(right_depth) + 1;
            if depth > MAX_RULE_DEPTH {
                return Err(RuleEngineError::syntax(
                    operator_pos,
                    format!("rule nests deeper than {} levels", MAX_RULE_DEPTH),
                ));
            }
            node = ExpressionNode::operator(kind, node, right);
        }

        Ok((node, depth))
    }

    fn parse_term(&mut self) -> Result<(ExpressionNode, usize)> {
        if self.peek() != Some("(") {
            return Ok((self.parse_condition()?, 1));
        }

        if self.nesting >= MAX_RULE_DEPTH {
            return Err(RuleEngineError::syntax(
                self.pos,
                format!("parentheses nest deeper than {} levels", MAX_RULE_DEPTH),
            ));
        }
        self.nesting += 1;
        self.pos += 1;

        let term = self.parse_expression()?;
        match self.peek() {
            Some(")") => {
                self.pos += 1;
                self.nesting -= 1;
                Ok(term)
            }
            Some(token) => Err(RuleEngineError::syntax(
                self.pos,
                format!("expected ')', found '{}'", token),
            )),
            None => Err(RuleEngineError::syntax(
                self.pos,
                "expected ')', found end of rule",
            )),
        }
    }

    fn parse_condition(&mut self) -> Result<ExpressionNode> {
        let field_pos = self.pos;
        let field = self.next_token("field name")?;
        if !is_identifier(field) {
            return Err(RuleEngineError::syntax(
                field_pos,
                format!("expected field name, found '{}'", field),
            ));
        }

        let comparator_pos = self.pos;
        let symbol = self.next_token("comparator")?;
        let comparator = Comparator::from_symbol(symbol).map_err(|_| {
            RuleEngineError::syntax(comparator_pos, format!("unsupported comparator '{}'", symbol))
        })?;

        let value_pos = self.pos;
        let value = self.next_token("value")?;
        let literal = parse_literal(value, value_pos)?;

        Ok(ExpressionNode::operand(Condition::new(field, comparator, literal)))
    }
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_');
    starts_ok
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && LogicalOp::from_keyword(token).is_none()
}

/// Infer a literal's type from its lexical shape
fn parse_literal(token: &str, position: usize) -> Result<Literal> {
    if let Some(inner) = token
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return Ok(Literal::String(inner.to_string()));
    }

    if SYMBOLS.contains(&token) {
        return Err(RuleEngineError::syntax(
            position,
            format!("expected value, found '{}'", token),
        ));
    }

    let unsigned = token.strip_prefix('-').unwrap_or(token);
    if is_digits(unsigned) {
        return token.parse::<i64>().map(Literal::Int).map_err(|_| {
            RuleEngineError::syntax(position, format!("integer literal out of range: {}", token))
        });
    }

    if let Some((whole, fraction)) = unsigned.split_once('.') {
        if !fraction.contains('.') && is_digits(&format!("{}{}", whole, fraction)) {
            return match token.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Literal::Float(value)),
                Ok(_) => Err(RuleEngineError::syntax(
                    position,
                    format!("float literal out of range: {}", token),
                )),
                Err(_) => Err(RuleEngineError::syntax(
                    position,
                    format!("invalid float literal: {}", token),
                )),
            };
        }
    }

    Ok(Literal::String(token.to_string()))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
