#![forbid(unsafe_code)]
//! immosieve-planner: from raw query options (URL-style strings or a YAML
//! document) to a validated [`QueryPlan`].
//!
//! Everything that can be rejected without looking at a record is rejected
//! here: the filter is parsed against the configured safety bounds, sort keys
//! are resolved in the field registry, paging and attachment options are
//! checked. The exec crate then only runs the plan.
//!
//! Validation order is fixed (filter, sort, paging, attachments) so that a
//! filter rejected for safety reasons is reported before anything else.

pub mod dsl;
pub mod error;
pub mod options;
pub mod plan;

pub use dsl::yaml::{parse_query_yaml, ParsedQuery, QueryDocument};
pub use error::PlanError;
pub use options::{AttachmentOptions, Includes, QueryOptions, Scaling};
pub use plan::{compile, AttachmentPlan, QueryPlan};
