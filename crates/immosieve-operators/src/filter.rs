//! The sieve: admits records matching a parsed filter expression.

use serde::Serialize;

use immosieve_core::config::QueryConfig;
use immosieve_core::error::Result;
use immosieve_core::record::RealEstate;

use crate::expr::{parse_filter, Expr};
use crate::traits::{RecordStream, Stage};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sieve {
    pub expr: Expr,
}

impl Default for Sieve {
    fn default() -> Self {
        Self { expr: Expr::True }
    }
}

impl Sieve {
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    pub fn parse(src: &str, cfg: &QueryConfig) -> Result<Self> {
        Ok(Self::new(parse_filter(src, cfg)?))
    }

    pub fn matches(&self, record: &RealEstate) -> Result<bool> {
        self.expr.evaluate(record)
    }
}

impl Stage for Sieve {
    fn name(&self) -> &'static str {
        "sieve"
    }

    fn is_noop(&self) -> bool {
        self.expr.is_trivial()
    }

    fn run<'a>(&self, input: RecordStream<'a>) -> Result<RecordStream<'a>> {
        if self.is_noop() {
            return Ok(input);
        }
        let mut kept = Vec::with_capacity(input.len());
        for record in input {
            if self.matches(record)? {
                kept.push(record);
            }
        }
        Ok(kept)
    }
}
