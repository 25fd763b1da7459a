//! Stage trait shared by sieve, sort, and pager.
//!
//! The exec runtime chains stages in a fixed order. Every stage borrows the
//! caller's records and never mutates them; stages only decide which
//! references survive and in what order.

use immosieve_core::error::Result;
use immosieve_core::record::RealEstate;

/// Records flowing between stages.
pub type RecordStream<'a> = Vec<&'a RealEstate>;

pub trait Stage {
    /// Human-readable stage name (stable), used in logs and `explain`.
    fn name(&self) -> &'static str;

    /// Whether running the stage would leave its input unchanged.
    fn is_noop(&self) -> bool {
        false
    }

    /// Consume one stream and produce the next. Any error aborts the query;
    /// no partial stream is returned.
    fn run<'a>(&self, input: RecordStream<'a>) -> Result<RecordStream<'a>>;
}
