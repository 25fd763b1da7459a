//! One window over an ordered sequence.

use serde::{Deserialize, Serialize};

use immosieve_core::error::Result;

use crate::traits::{RecordStream, Stage};

/// `limit: None` disables paging. Pages are zero-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    pub limit: Option<usize>,
    pub page: usize,
}

impl PageSpec {
    pub fn new(limit: usize, page: usize) -> Self {
        Self {
            limit: Some(limit),
            page,
        }
    }

    /// First index of the window. Saturates instead of overflowing.
    pub fn offset(&self) -> usize {
        self.limit.map_or(0, |l| l.saturating_mul(self.page))
    }
}

/// Items `[page*limit, (page+1)*limit)` of `seq`. A window past the end is
/// empty; a trailing partial window is returned as is.
pub fn page<T>(seq: Vec<T>, limit: Option<usize>, page: usize) -> Vec<T> {
    match limit {
        None => seq,
        Some(limit) => seq
            .into_iter()
            .skip(limit.saturating_mul(page))
            .take(limit)
            .collect(),
    }
}

impl Stage for PageSpec {
    fn name(&self) -> &'static str {
        "page"
    }

    fn is_noop(&self) -> bool {
        self.limit.is_none()
    }

    fn run<'a>(&self, input: RecordStream<'a>) -> Result<RecordStream<'a>> {
        Ok(page(input, self.limit, self.page))
    }
}
