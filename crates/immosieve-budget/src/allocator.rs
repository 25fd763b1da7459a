//! Greedy attachment allocation.
//!
//! Every attachment gets exactly one [`Decision`]. Remote attachments ship
//! uncharged. The rest are visited category by category in
//! [`Category::PRIORITY`] order and, within a category, in list order. The
//! first attachment that would break the byte cap or the category's count
//! cap closes that category; later ones in it are not considered, even if
//! they would fit. Bytes are shared across categories.

use serde::Serialize;

use immosieve_core::attachment::{Attachment, Category};
use immosieve_core::error::Result;

use crate::budget::Budget;
use crate::ledger::Ledger;
use crate::selector::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Matched an explicit selector.
    Selected,
    NotSelected,
    /// Remote link, shipped uncharged.
    Whitelisted,
    Admitted,
    ByteCapReached,
    CountCapReached,
    /// An earlier attachment of the same category was rejected.
    CategoryClosed,
}

impl Verdict {
    pub fn ships(&self) -> bool {
        matches!(self, Verdict::Selected | Verdict::Whitelisted | Verdict::Admitted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub index: usize,
    pub category: Category,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// One entry per input attachment, in input order.
    pub decisions: Vec<Decision>,
    /// Bytes charged against the byte cap.
    pub bytes_used: u64,
    /// Headroom left under the byte cap; `None` when uncapped.
    pub bytes_remaining: Option<u64>,
}

impl Allocation {
    /// Positions of shipped attachments, ascending.
    pub fn shipped(&self) -> impl Iterator<Item = usize> + '_ {
        self.decisions
            .iter()
            .filter(|d| d.verdict.ships())
            .map(|d| d.index)
    }

    pub fn shipped_count(&self) -> usize {
        self.shipped().count()
    }

    pub fn pick<'a>(&self, attachments: &'a [Attachment]) -> Vec<&'a Attachment> {
        self.shipped().filter_map(|i| attachments.get(i)).collect()
    }
}

pub fn allocate(
    attachments: &[Attachment],
    selection: &Selection,
    budget: &Budget,
) -> Result<Allocation> {
    if selection.is_explicit() {
        let decisions = attachments
            .iter()
            .enumerate()
            .map(|(index, a)| Decision {
                index,
                category: a.category(),
                verdict: if selection.matches(index, a) {
                    Verdict::Selected
                } else {
                    Verdict::NotSelected
                },
            })
            .collect();
        return Ok(Allocation {
            decisions,
            bytes_used: 0,
            bytes_remaining: None,
        });
    }

    budget.validate()?;

    let mut decisions: Vec<Decision> = attachments
        .iter()
        .enumerate()
        .map(|(index, a)| Decision {
            index,
            category: a.category(),
            verdict: Verdict::Whitelisted,
        })
        .collect();

    let mut bytes = Ledger::new(budget.byte_cap);
    for category in Category::PRIORITY {
        let mut count = Ledger::new(budget.count_cap(category).map(u64::from));
        let mut closed = false;
        for (decision, attachment) in decisions.iter_mut().zip(attachments) {
            if decision.category != category || attachment.is_whitelisted() {
                continue;
            }
            decision.verdict = if closed {
                Verdict::CategoryClosed
            } else if !count.would_fit(1) {
                closed = true;
                Verdict::CountCapReached
            } else if !bytes.try_acquire(attachment.size_bytes) {
                closed = true;
                Verdict::ByteCapReached
            } else {
                count.try_acquire(1);
                Verdict::Admitted
            };
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            category = category.option_key(),
            admitted = count.used(),
            closed,
            bytes_used = bytes.used(),
            bytes_remaining = ?bytes.remaining(),
            "attachment category allocated"
        );
    }

    Ok(Allocation {
        decisions,
        bytes_used: bytes.used(),
        bytes_remaining: bytes.remaining(),
    })
}
