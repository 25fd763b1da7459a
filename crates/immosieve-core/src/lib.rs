#![forbid(unsafe_code)]
//! immosieve-core: values, listing records, error codes, configs, manifests,
//! and hashing shared by every other immosieve crate.
//!
//! Design intent:
//! - No I/O and no runtime in core. Records arrive already materialized.
//! - Every caller-visible failure is an [`error::Error`] with a stable numeric
//!   code, so transport layers can render `(code, message)` pairs.
//! - Values are cast from raw query strings exactly once, at plan time.

pub mod attachment;
pub mod config;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod prelude;
pub mod record;
pub mod value;

/// Engine version string recorded in manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
