#![forbid(unsafe_code)]
//! immosieve-exec: runs a compiled query over a slice of listings.
//!
//! The engine chains sieve, sort, and pager, then allocates attachments for
//! each surviving listing and emits a [`QueryManifest`]. Hits borrow from
//! the caller's records; nothing is copied until a hit is rendered.
//!
//! [`QueryManifest`]: immosieve_core::manifest::QueryManifest

pub mod metrics;
pub mod replay;
pub mod runtime;

pub use runtime::{Engine, ExecError, Hit, QueryOutput};
