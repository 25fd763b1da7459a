//! Typed values and the raw-string caster.
//!
//! Query strings carry every operand as text. `cast` turns that text into a
//! [`Value`] once, at plan time, so per-record evaluation never parses.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Str(String),
    List(Vec<Value>),
}

/// Explicit cast targets a field descriptor may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Int,
    Float,
    Bool,
    Date,
    Str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot cast \"{raw}\" to {target:?}")]
pub struct CastError {
    pub raw: String,
    pub target: ValueType,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Date(_) => "date",
            Value::Str(_) => "str",
            Value::List(_) => "list",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Equality across the numeric tower; other kinds compare only with
    /// themselves. Lists compare element-wise.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            _ => false,
        }
    }

    /// Ordering for values of ordered, mutually compatible kinds.
    ///
    /// Returns `None` for booleans, lists, and mixed kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S")),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v.and_time(chrono::NaiveTime::MIN))
    }
}

/// Cast a raw query token.
///
/// With a target the type's constructor is applied and may fail. Without one
/// the caster tries list, integer, float, boolean, and ISO-8601 date in that
/// order and falls back to the raw string, so it never fails.
pub fn cast(raw: &str, target: Option<ValueType>) -> Result<Value, CastError> {
    match target {
        Some(t) => cast_to(raw, t),
        None => Ok(infer(raw)),
    }
}

fn cast_to(raw: &str, target: ValueType) -> Result<Value, CastError> {
    let fail = || CastError {
        raw: raw.to_string(),
        target,
    };
    match target {
        ValueType::Str => Ok(Value::Str(raw.to_string())),
        ValueType::Int => raw.trim().parse::<i64>().map(Value::Int).map_err(|_| fail()),
        ValueType::Float => parse_float(raw.trim()).map(Value::Float).ok_or_else(fail),
        ValueType::Bool => parse_bool(raw.trim()).map(Value::Bool).ok_or_else(fail),
        ValueType::Date => parse_date(raw.trim()).map(Value::Date).ok_or_else(fail),
    }
}

fn infer(raw: &str) -> Value {
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        if inner.trim().is_empty() {
            return Value::List(Vec::new());
        }
        // One level only: list items never become lists themselves.
        return Value::List(inner.split(';').map(|item| infer_scalar(item.trim())).collect());
    }
    infer_scalar(raw)
}

fn infer_scalar(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if let Some(f) = parse_float(raw) {
        return Value::Float(f);
    }
    if let Some(b) = parse_bool(raw) {
        return Value::Bool(b);
    }
    if let Some(d) = parse_date(raw) {
        return Value::Date(d);
    }
    Value::Str(raw.to_string())
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// ISO-8601 date or date-time. Offsets are dropped after conversion to the
/// wall-clock time they were written in.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d.and_time(chrono::NaiveTime::MIN));
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local())
}
