//! Query limits that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

/// Ceilings for the filter bounds. No config source can raise a bound past
/// these; the parser recurses once per nesting level.
pub const HARD_MAX_FILTER_LEN: usize = 65_536;
pub const HARD_MAX_FILTER_DEPTH: usize = 256;
pub const HARD_MAX_FILTER_LEAVES: usize = 1_024;
pub const HARD_MAX_NOT_CHAIN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Longest accepted filter string, in bytes.
    pub max_filter_len: usize,

    /// Deepest accepted nesting of parentheses and NOT.
    pub max_filter_depth: usize,

    /// Most `field OP value` leaves a filter may hold.
    pub max_filter_leaves: usize,

    /// Longest run of consecutive NOTs.
    pub max_not_chain: usize,

    /// Byte cap applied when an attachment option sets none.
    pub default_byte_cap: Option<u64>,

    /// Hard ceiling on the paging limit.
    pub max_page_size: Option<usize>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_filter_len: 4096,
            max_filter_depth: 32,
            max_filter_leaves: 128,
            max_not_chain: 4,
            default_byte_cap: None,
            max_page_size: None,
        }
    }
}

impl QueryConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `IMMOSIEVE_MAX_FILTER_LEN`: filter length in bytes
    /// - `IMMOSIEVE_MAX_FILTER_DEPTH`: nesting depth
    /// - `IMMOSIEVE_MAX_FILTER_LEAVES`: leaf count
    /// - `IMMOSIEVE_MAX_NOT_CHAIN`: consecutive NOTs
    /// - `IMMOSIEVE_ATTACHMENT_BYTE_CAP`: default attachment byte cap
    /// - `IMMOSIEVE_MAX_PAGE_SIZE`: paging limit ceiling
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`QueryConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = parse_var::<usize>(&lookup, "IMMOSIEVE_MAX_FILTER_LEN") {
            cfg.max_filter_len = v;
        }

        if let Some(v) = parse_var::<usize>(&lookup, "IMMOSIEVE_MAX_FILTER_DEPTH") {
            cfg.max_filter_depth = v;
        }

        if let Some(v) = parse_var::<usize>(&lookup, "IMMOSIEVE_MAX_FILTER_LEAVES") {
            cfg.max_filter_leaves = v;
        }

        if let Some(v) = parse_var::<usize>(&lookup, "IMMOSIEVE_MAX_NOT_CHAIN") {
            cfg.max_not_chain = v;
        }

        if let Some(v) = parse_var::<u64>(&lookup, "IMMOSIEVE_ATTACHMENT_BYTE_CAP") {
            cfg.default_byte_cap = Some(v);
        }

        if let Some(v) = parse_var::<usize>(&lookup, "IMMOSIEVE_MAX_PAGE_SIZE") {
            cfg.max_page_size = Some(v);
        }

        cfg.clamped()
    }

    /// Overlay the fields set in `patch`. Filter bounds can only be
    /// tightened this way.
    pub fn merged(mut self, patch: &ConfigPatch) -> Self {
        tighten(&mut self.max_filter_len, patch.max_filter_len);
        tighten(&mut self.max_filter_depth, patch.max_filter_depth);
        tighten(&mut self.max_filter_leaves, patch.max_filter_leaves);
        tighten(&mut self.max_not_chain, patch.max_not_chain);
        self.overlay_budgets(patch);
        self.clamped()
    }

    /// Overlay the fields set in `patch`, raising filter bounds up to the
    /// hard ceilings if asked. For operator-supplied settings only.
    pub fn overridden(mut self, patch: &ConfigPatch) -> Self {
        if let Some(v) = patch.max_filter_len {
            self.max_filter_len = v;
        }
        if let Some(v) = patch.max_filter_depth {
            self.max_filter_depth = v;
        }
        if let Some(v) = patch.max_filter_leaves {
            self.max_filter_leaves = v;
        }
        if let Some(v) = patch.max_not_chain {
            self.max_not_chain = v;
        }
        self.overlay_budgets(patch);
        self.clamped()
    }

    /// Filter bounds capped at the `HARD_MAX_*` ceilings.
    pub fn clamped(mut self) -> Self {
        self.max_filter_len = self.max_filter_len.min(HARD_MAX_FILTER_LEN);
        self.max_filter_depth = self.max_filter_depth.min(HARD_MAX_FILTER_DEPTH);
        self.max_filter_leaves = self.max_filter_leaves.min(HARD_MAX_FILTER_LEAVES);
        self.max_not_chain = self.max_not_chain.min(HARD_MAX_NOT_CHAIN);
        self
    }

    fn overlay_budgets(&mut self, patch: &ConfigPatch) {
        if patch.default_byte_cap.is_some() {
            self.default_byte_cap = patch.default_byte_cap;
        }
        if patch.max_page_size.is_some() {
            self.max_page_size = patch.max_page_size;
        }
    }
}

/// Partial config as written in query documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub max_filter_len: Option<usize>,
    pub max_filter_depth: Option<usize>,
    pub max_filter_leaves: Option<usize>,
    pub max_not_chain: Option<usize>,
    pub default_byte_cap: Option<u64>,
    pub max_page_size: Option<usize>,
}

fn tighten(slot: &mut usize, patch: Option<usize>) {
    if let Some(v) = patch {
        *slot = (*slot).min(v);
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            ("IMMOSIEVE_MAX_FILTER_DEPTH", "8"),
            ("IMMOSIEVE_ATTACHMENT_BYTE_CAP", "1048576"),
            ("IMMOSIEVE_MAX_FILTER_LEN", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let cfg = QueryConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.max_filter_depth, 8);
        assert_eq!(cfg.default_byte_cap, Some(1_048_576));
        assert_eq!(cfg.max_filter_len, QueryConfig::default().max_filter_len);
    }

    #[test]
    fn test_patch_merge() {
        let patch = ConfigPatch {
            max_filter_leaves: Some(3),
            ..Default::default()
        };
        let cfg = QueryConfig::default().merged(&patch);
        assert_eq!(cfg.max_filter_leaves, 3);
        assert_eq!(cfg.max_filter_depth, 32);
    }

    #[test]
    fn test_lookup_cannot_pass_hard_ceiling() {
        let vars: HashMap<&str, &str> = [
            ("IMMOSIEVE_MAX_FILTER_DEPTH", "1000000"),
            ("IMMOSIEVE_MAX_FILTER_LEN", "100000000"),
        ]
        .into_iter()
        .collect();
        let cfg = QueryConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.max_filter_depth, HARD_MAX_FILTER_DEPTH);
        assert_eq!(cfg.max_filter_len, HARD_MAX_FILTER_LEN);
    }

    #[test]
    fn test_patch_only_tightens_filter_bounds() {
        let patch = ConfigPatch {
            max_filter_depth: Some(100_000),
            max_filter_len: Some(usize::MAX),
            max_not_chain: Some(2),
            default_byte_cap: Some(512),
            ..Default::default()
        };
        let cfg = QueryConfig::default().merged(&patch);
        assert_eq!(cfg.max_filter_depth, 32);
        assert_eq!(cfg.max_filter_len, 4096);
        assert_eq!(cfg.max_not_chain, 2);
        assert_eq!(cfg.default_byte_cap, Some(512));
    }

    #[test]
    fn test_override_raises_up_to_ceiling() {
        let patch = ConfigPatch {
            max_filter_depth: Some(64),
            max_filter_leaves: Some(usize::MAX),
            ..Default::default()
        };
        let cfg = QueryConfig::default().overridden(&patch);
        assert_eq!(cfg.max_filter_depth, 64);
        assert_eq!(cfg.max_filter_leaves, HARD_MAX_FILTER_LEAVES);
    }

    #[test]
    fn test_clamped_caps_direct_construction() {
        let cfg = QueryConfig {
            max_filter_len: usize::MAX,
            max_filter_depth: usize::MAX,
            ..Default::default()
        }
        .clamped();
        assert_eq!(cfg.max_filter_len, HARD_MAX_FILTER_LEN);
        assert_eq!(cfg.max_filter_depth, HARD_MAX_FILTER_DEPTH);
    }
}
