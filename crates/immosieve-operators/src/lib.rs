#![forbid(unsafe_code)]
//! immosieve-operators: the per-record query stages.
//!
//! - `registry`: closed vocabulary of listing fields and their accessors
//! - `ops`: closed operator table, pure predicates over [`Value`]s
//! - `expr`: filter string parser (bounded) and the AST evaluator
//! - `filter`: the sieve stage
//! - `sort`: composite, stable multi-key ordering
//! - `pager`: one window over an ordered sequence
//! - `traits`: the [`Stage`] contract the runtime chains
//!
//! Parsing happens once per query; evaluation never allocates new values
//! beyond what accessors return.
//!
//! [`Value`]: immosieve_core::value::Value

pub mod expr;
pub mod filter;
pub mod ops;
pub mod pager;
pub mod registry;
pub mod sort;
pub mod traits;

pub use expr::{parse_filter, Expr, Leaf};
pub use filter::Sieve;
pub use ops::{Mismatch, Operator};
pub use pager::{page, PageSpec};
pub use registry::{lookup, AccessError, FieldDescriptor, FIELDS};
pub use sort::{SortKey, SortSpec};
pub use traits::{RecordStream, Stage};
