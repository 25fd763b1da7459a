//! Operator table: pure binary predicates over an extracted field value and a
//! cast operand.
//!
//! An absent field never errors. Positive operators are false on it, negated
//! ones true. Ill-typed pairs report [`Mismatch`]; the evaluator turns that
//! into "no match" for the record.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use immosieve_core::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    EqCi,
    Ne,
    NeCi,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Contains,
    NotContains,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operator {op} cannot compare {left} with {right}")]
pub struct Mismatch {
    pub op: &'static str,
    pub left: &'static str,
    pub right: &'static str,
}

/// How a token found in a filter leaf resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Op(Operator),
    /// Recognised token without an implementation.
    Unimplemented,
}

/// Every token the leaf splitter recognises. Longer spellings come first so
/// that the leftmost match is also the longest one.
pub const TOKENS: &[(&str, TokenKind)] = &[
    (">>=", TokenKind::Op(Operator::Ge)),
    ("<<=", TokenKind::Op(Operator::Le)),
    ("==", TokenKind::Op(Operator::Eq)),
    ("!=", TokenKind::Op(Operator::Ne)),
    ("%=", TokenKind::Op(Operator::EqCi)),
    ("!%", TokenKind::Op(Operator::NeCi)),
    ("~=", TokenKind::Unimplemented),
    ("!~", TokenKind::Unimplemented),
    ("<=", TokenKind::Op(Operator::Le)),
    (">=", TokenKind::Op(Operator::Ge)),
    ("<<", TokenKind::Op(Operator::Lt)),
    (">>", TokenKind::Op(Operator::Gt)),
    ("<", TokenKind::Op(Operator::Lt)),
    (">", TokenKind::Op(Operator::Gt)),
    ("∈", TokenKind::Op(Operator::In)),
    ("∉", TokenKind::Op(Operator::NotIn)),
    ("∋", TokenKind::Op(Operator::Contains)),
    ("∌", TokenKind::Op(Operator::NotContains)),
];

impl Operator {
    /// Canonical spelling.
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::EqCi => "%=",
            Operator::Ne => "!=",
            Operator::NeCi => "!%",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "∈",
            Operator::NotIn => "∉",
            Operator::Contains => "∋",
            Operator::NotContains => "∌",
        }
    }

    /// Operators whose operand must be a list literal.
    pub fn wants_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    fn negated(&self) -> bool {
        matches!(
            self,
            Operator::Ne | Operator::NeCi | Operator::NotIn | Operator::NotContains
        )
    }

    pub fn apply(&self, field: Option<&Value>, operand: &Value) -> Result<bool, Mismatch> {
        let Some(field) = field else {
            return Ok(self.negated());
        };
        let mismatch = || Mismatch {
            op: self.token(),
            left: field.type_name(),
            right: operand.type_name(),
        };
        match self {
            Operator::Eq => Ok(field.loose_eq(operand)),
            Operator::Ne => Ok(!field.loose_eq(operand)),
            Operator::EqCi => eq_ci(field, operand).ok_or_else(mismatch),
            Operator::NeCi => eq_ci(field, operand).map(|b| !b).ok_or_else(mismatch),
            Operator::Lt => field.compare(operand).map(|o| o.is_lt()).ok_or_else(mismatch),
            Operator::Le => field.compare(operand).map(|o| o.is_le()).ok_or_else(mismatch),
            Operator::Gt => field.compare(operand).map(|o| o.is_gt()).ok_or_else(mismatch),
            Operator::Ge => field.compare(operand).map(|o| o.is_ge()).ok_or_else(mismatch),
            Operator::In => member(field, operand).ok_or_else(mismatch),
            Operator::NotIn => member(field, operand).map(|b| !b).ok_or_else(mismatch),
            // same test as `in`, arguments swapped
            Operator::Contains => member(operand, field).ok_or_else(mismatch),
            Operator::NotContains => member(operand, field).map(|b| !b).ok_or_else(mismatch),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

fn eq_ci(a: &Value, b: &Value) -> Option<bool> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.to_lowercase() == y.to_lowercase()),
        _ => None,
    }
}

/// `needle` in `haystack`: list membership, or substring for two strings.
fn member(needle: &Value, haystack: &Value) -> Option<bool> {
    match (needle, haystack) {
        (_, Value::List(items)) => Some(items.iter().any(|item| needle.loose_eq(item))),
        (Value::Str(n), Value::Str(h)) => Some(h.contains(n.as_str())),
        _ => None,
    }
}
