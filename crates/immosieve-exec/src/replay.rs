//! Plan hashing for provenance.
//!
//! The plan hash covers the compiled plan and the limits it was validated
//! under, so two manifests with equal hashes ran the same query.

use immosieve_core::config::QueryConfig;
use immosieve_core::hash::{hash_serde, Hash256};
use immosieve_planner::QueryPlan;

use crate::ExecError;

pub fn hash_plan(plan: &QueryPlan, cfg: &QueryConfig) -> Result<Hash256, ExecError> {
    let p = hash_serde(plan)?;
    let c = hash_serde(cfg)?;
    Ok(p.xor(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use immosieve_planner::{compile, QueryOptions};

    fn plan(filter: &str) -> QueryPlan {
        let opts = QueryOptions::parse([("filter", filter)]);
        compile(&opts, &QueryConfig::default()).unwrap()
    }

    #[test]
    fn test_equal_plans_hash_equal() {
        let cfg = QueryConfig::default();
        // whitespace and keyword case do not survive parsing
        let a = hash_plan(&plan("zimmer>=3 and ort==Hannover"), &cfg).unwrap();
        let b = hash_plan(&plan("zimmer>=3  AND  ort==Hannover"), &cfg).unwrap();
        assert_eq!(a, b);
        let c = hash_plan(&plan("zimmer>=4 and ort==Hannover"), &cfg).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_config_is_part_of_hash() {
        let p = plan("zimmer>=3");
        let a = hash_plan(&p, &QueryConfig::default()).unwrap();
        let tight = QueryConfig {
            max_filter_depth: 2,
            ..Default::default()
        };
        assert_ne!(a, hash_plan(&p, &tight).unwrap());
    }
}
