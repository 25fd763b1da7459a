//! Filter expressions: `field OP value` leaves joined by AND / OR / NOT.
//!
//! Parsing runs in three passes over the untrusted string:
//! 1. lex into words, parentheses, and connectives;
//! 2. enforce the [`QueryConfig`] bounds on that token stream, so an oversized
//!    filter is rejected as a security breach before anything else is checked;
//! 3. recursive descent (NOT binds tighter than AND, AND tighter than OR),
//!    resolving each leaf against the field registry and casting its operand.
//!
//! The resulting [`Expr`] is immutable and evaluated once per record.
//!
//! Connectives are `and`, `or`, `not` (any case) or `&&`, `||`, `!`.
//! Whitespace inside a leaf is allowed (`zimmer >= 3`); values containing
//! whitespace or connective words must be quoted (`ort == "Bad Nenndorf"`).

use std::fmt;

use serde::Serialize;

use immosieve_core::config::QueryConfig;
use immosieve_core::error::{Error, Result};
use immosieve_core::record::RealEstate;
use immosieve_core::value::{cast, Value};

use crate::ops::{Operator, TokenKind, TOKENS};
use crate::registry::{lookup, FieldDescriptor};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Empty filter: admits everything.
    True,
    Leaf(Leaf),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaf {
    pub field: &'static FieldDescriptor,
    pub op: Operator,
    /// Operand as written, without surrounding quotes.
    pub raw: String,
    pub operand: Value,
}

impl Leaf {
    /// Broken accessors abort the query; ill-typed comparisons only fail the
    /// leaf.
    pub fn evaluate(&self, record: &RealEstate) -> Result<bool> {
        let value = self.field.extract(record).map_err(|_e| {
            #[cfg(feature = "tracing")]
            tracing::warn!(field = self.field.name, error = %_e, "field accessor failed");
            self.sieving_error()
        })?;
        match self.op.apply(value.as_ref(), &self.operand) {
            Ok(hit) => Ok(hit),
            Err(_mismatch) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(field = self.field.name, %_mismatch, "leaf type mismatch");
                Ok(false)
            }
        }
    }

    fn sieving_error(&self) -> Error {
        Error::Sieving {
            field: self.field.name.to_string(),
            operator: self.op.token().to_string(),
            value: self.raw.clone(),
        }
    }
}

impl Expr {
    pub fn evaluate(&self, record: &RealEstate) -> Result<bool> {
        match self {
            Expr::True => Ok(true),
            Expr::Leaf(leaf) => leaf.evaluate(record),
            Expr::Not(inner) => Ok(!inner.evaluate(record)?),
            Expr::And(items) => {
                for item in items {
                    if !item.evaluate(record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Or(items) => {
                for item in items {
                    if item.evaluate(record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    pub fn is_trivial(&self) -> bool {
        matches!(self, Expr::True)
    }

    /// All leaves, left to right.
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
        match self {
            Expr::True => {}
            Expr::Leaf(leaf) => out.push(leaf),
            Expr::Not(inner) => inner.collect_leaves(out),
            Expr::And(items) | Expr::Or(items) => {
                for item in items {
                    item.collect_leaves(out);
                }
            }
        }
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw.chars().any(char::is_whitespace) {
            write!(f, "{} {} \"{}\"", self.field.name, self.op, self.raw)
        } else {
            write!(f, "{} {} {}", self.field.name, self.op, self.raw)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, items: &[Expr], sep: &str| -> fmt::Result {
            f.write_str("(")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", sep)?;
                }
                write!(f, "{}", item)?;
            }
            f.write_str(")")
        };
        match self {
            Expr::True => f.write_str("TRUE"),
            Expr::Leaf(leaf) => write!(f, "{}", leaf),
            Expr::Not(inner) => write!(f, "NOT {}", inner),
            Expr::And(items) => join(f, items, "AND"),
            Expr::Or(items) => join(f, items, "OR"),
        }
    }
}

/// Parse and validate a filter string.
///
/// An empty or all-whitespace filter yields [`Expr::True`].
pub fn parse_filter(src: &str, cfg: &QueryConfig) -> Result<Expr> {
    let cfg = &cfg.clone().clamped();
    if src.len() > cfg.max_filter_len {
        return Err(Error::SecurityBreach(format!(
            "filter is {} bytes long, limit is {}",
            src.len(),
            cfg.max_filter_len
        )));
    }
    let tokens = lex(src)?;
    if tokens.is_empty() {
        return Ok(Expr::True);
    }
    check_bounds(&tokens, cfg)?;

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth: cfg.max_filter_depth,
    };
    let expr = parser.parse_or()?;
    if let Some(tok) = parser.peek() {
        return Err(Error::MalformedFilter(format!("unexpected {}", tok.describe())));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(leaves = expr.leaves().len(), "parsed filter");

    Ok(expr)
}

// ----- lexer -----

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    /// Consecutive non-connective words, joined by single spaces.
    Fragment { text: String, words: usize },
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::And => "AND".into(),
            Token::Or => "OR".into(),
            Token::Not => "NOT".into(),
            Token::Fragment { text, .. } => format!("condition '{}'", text),
        }
    }
}

fn lex(src: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = src.chars().collect();
    let mut raw: Vec<Token> = Vec::new();
    let mut word = String::new();
    let mut quote: Option<char> = None;
    let mut brackets = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if let Some(q) = quote {
            word.push(c);
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '"' | '\'' if opens_quote(&word, brackets > 0) => {
                quote = Some(c);
                word.push(c);
            }
            '[' => {
                brackets += 1;
                word.push(c);
            }
            ']' => {
                brackets = brackets.saturating_sub(1);
                word.push(c);
            }
            _ if brackets > 0 => word.push(c),
            c if c.is_whitespace() => flush_word(&mut word, &mut raw),
            '(' | ')' => {
                flush_word(&mut word, &mut raw);
                raw.push(if c == '(' { Token::LParen } else { Token::RParen });
            }
            '&' if next == Some('&') => {
                flush_word(&mut word, &mut raw);
                raw.push(Token::And);
                i += 1;
            }
            '|' if next == Some('|') => {
                flush_word(&mut word, &mut raw);
                raw.push(Token::Or);
                i += 1;
            }
            // a `!` opening a word negates, unless it starts `!=`, `!%`, `!~`
            '!' if word.is_empty() && !matches!(next, Some('=' | '%' | '~')) => {
                raw.push(Token::Not);
            }
            _ => word.push(c),
        }
        i += 1;
    }

    if let Some(q) = quote {
        return Err(Error::MalformedFilter(format!("unterminated {} quote", q)));
    }
    if brackets > 0 {
        return Err(Error::MalformedFilter("unterminated list literal".into()));
    }
    flush_word(&mut word, &mut raw);

    // merge adjacent words into one leaf fragment
    let mut tokens: Vec<Token> = Vec::with_capacity(raw.len());
    for tok in raw {
        if let Token::Fragment { text: more, words: n } = &tok {
            if let Some(Token::Fragment { text, words }) = tokens.last_mut() {
                text.push(' ');
                text.push_str(more);
                *words += n;
                continue;
            }
        }
        tokens.push(tok);
    }
    Ok(tokens)
}

fn flush_word(word: &mut String, out: &mut Vec<Token>) {
    if word.is_empty() {
        return;
    }
    let w = std::mem::take(word);
    let tok = if w.eq_ignore_ascii_case("and") {
        Token::And
    } else if w.eq_ignore_ascii_case("or") {
        Token::Or
    } else if w.eq_ignore_ascii_case("not") {
        Token::Not
    } else {
        Token::Fragment { text: w, words: 1 }
    };
    out.push(tok);
}

// ----- bounds -----

fn check_bounds(tokens: &[Token], cfg: &QueryConfig) -> Result<()> {
    let mut depth = 0usize;
    let mut max_depth = 0usize;
    let mut not_chain = 0usize;
    let mut leaves = 0usize;

    for tok in tokens {
        match tok {
            Token::LParen => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Fragment { .. } => leaves += 1,
            _ => {}
        }
        not_chain = if *tok == Token::Not { not_chain + 1 } else { 0 };

        if max_depth > cfg.max_filter_depth {
            return Err(Error::SecurityBreach(format!(
                "nesting deeper than {}",
                cfg.max_filter_depth
            )));
        }
        if not_chain > cfg.max_not_chain {
            return Err(Error::SecurityBreach(format!(
                "more than {} consecutive NOTs",
                cfg.max_not_chain
            )));
        }
        if leaves > cfg.max_filter_leaves {
            return Err(Error::SecurityBreach(format!(
                "more than {} conditions",
                cfg.max_filter_leaves
            )));
        }
    }
    Ok(())
}

// ----- parser -----

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::SecurityBreach(format!(
                "nesting deeper than {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut items = vec![self.parse_and()?];
        while self.eat(&Token::Or) {
            items.push(self.parse_and()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Or(items)
        })
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut items = vec![self.parse_not()?];
        while self.eat(&Token::And) {
            items.push(self.parse_not()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::And(items)
        })
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.eat(&Token::Not) {
            self.descend()?;
            let inner = self.parse_not()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                if !self.eat(&Token::RParen) {
                    return Err(Error::MalformedFilter(match self.peek() {
                        Some(tok) => format!("expected ')' but found {}", tok.describe()),
                        None => "missing ')'".into(),
                    }));
                }
                Ok(inner)
            }
            Some(Token::Fragment { text, words }) => parse_leaf(&text, words).map(Expr::Leaf),
            Some(tok) => Err(Error::MalformedFilter(format!(
                "expected a condition but found {}",
                tok.describe()
            ))),
            None => Err(Error::MalformedFilter(
                "expected a condition but the filter ended".into(),
            )),
        }
    }
}

// ----- leaves -----

/// Leftmost operator token outside quotes and list literals.
fn find_operator(text: &str) -> Option<(usize, &'static str, TokenKind)> {
    let mut quote: Option<char> = None;
    let mut brackets = 0usize;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if opens_quote(&text[..i], brackets > 0) => quote = Some(c),
            '[' => brackets += 1,
            ']' => brackets = brackets.saturating_sub(1),
            _ if brackets == 0 => {
                let rest = &text[i..];
                if let Some((tok, kind)) = TOKENS.iter().find(|(tok, _)| rest.starts_with(tok)) {
                    return Some((i, tok, *kind));
                }
            }
            _ => {}
        }
    }
    None
}

/// A quote opens only where an operand (or list item) starts, so that
/// `strasse==O'Brien` stays a plain word.
fn opens_quote(before: &str, in_list: bool) -> bool {
    let before = before.trim_end();
    before.is_empty()
        || (in_list && before.ends_with(|c| c == '[' || c == ';'))
        || TOKENS.iter().any(|(tok, _)| before.ends_with(tok))
}

fn unquote(raw: &str) -> (&str, bool) {
    let mut chars = raw.chars();
    match (chars.next(), chars.next_back()) {
        (Some(a), Some(b)) if a == b && (a == '"' || a == '\'') => (&raw[1..raw.len() - 1], true),
        _ => (raw, false),
    }
}

fn parse_leaf(text: &str, words: usize) -> Result<Leaf> {
    let Some((at, tok, kind)) = find_operator(text) else {
        return Err(Error::InvalidFilterOption(text.to_string()));
    };
    let op = match kind {
        TokenKind::Op(op) => op,
        TokenKind::Unimplemented => {
            return Err(Error::FilterOperationNotImplemented(tok.to_string()))
        }
    };
    let name = text[..at].trim();
    let rest = text[at + tok.len()..].trim();
    let field = lookup(name).ok_or_else(|| Error::InvalidFilterOption(name.to_string()))?;

    if words > 1 && find_operator(rest).is_some() {
        return Err(Error::MalformedFilter(format!(
            "expected AND or OR between conditions in '{}'",
            text
        )));
    }

    let (raw, quoted) = unquote(rest);
    let sieving = || Error::Sieving {
        field: field.name.to_string(),
        operator: op.token().to_string(),
        value: raw.to_string(),
    };

    let operand = match (quoted, field.declared_type) {
        (true, None) => Value::Str(raw.to_string()),
        (false, Some(t)) if op.wants_list() => match list_items(raw) {
            Some(items) => Value::List(
                items
                    .map(|item| cast(item, Some(t)))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| sieving())?,
            ),
            None => cast(raw, Some(t)).map_err(|_| sieving())?,
        },
        (_, target) => cast(raw, target).map_err(|_| sieving())?,
    };

    Ok(Leaf {
        field,
        op,
        raw: raw.to_string(),
        operand,
    })
}

fn list_items(raw: &str) -> Option<impl Iterator<Item = &str>> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.split(';').map(str::trim).filter(|s| !s.is_empty()))
}
