#![forbid(unsafe_code)]
//! immosieve-budget: attachment budgets and the greedy allocator.
//!
//! A [`Budget`] caps the payload bytes shipped per listing and, optionally,
//! the number of attachments per [`Category`]. The allocator walks categories
//! in fixed priority order and admits attachments greedily, in their original
//! order, until a cap would be exceeded. Remote attachments are links and are
//! never charged. An explicit [`Selection`] bypasses the budget entirely.
//!
//! [`Category`]: immosieve_core::attachment::Category

pub mod allocator;
pub mod budget;
pub mod ledger;
pub mod selector;

pub use allocator::{allocate, Allocation, Decision, Verdict};
pub use budget::Budget;
pub use ledger::Ledger;
pub use selector::{Selection, Selector};
