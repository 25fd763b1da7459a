//! Per-query manifest for audit logs.
//!
//! Two runs with the same plan hash executed the same validated query, so the
//! manifest is enough to correlate identical requests across log lines.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryManifest {
    pub id: ManifestId,

    /// Stable hash of the compiled query plan.
    pub plan_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Records handed in, admitted by the sieve, and returned after paging.
    pub records_in: usize,
    pub records_matched: usize,
    pub records_out: usize,

    /// Attachments shipped across all returned records.
    pub attachments_out: usize,

    /// Digest over the returned object ids and their shipped attachment counts.
    pub outputs_digest: Option<Hash256>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl QueryManifest {
    pub fn new(plan_hash: Hash256, records_in: usize, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            plan_hash,
            engine_version: crate::VERSION.to_string(),
            records_in,
            records_matched: 0,
            records_out: 0,
            attachments_out: 0,
            outputs_digest: None,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, outputs_digest: Option<Hash256>) -> Self {
        self.finished_ms = finished_ms;
        self.outputs_digest = outputs_digest;
        self
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}
