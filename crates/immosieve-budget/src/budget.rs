use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use immosieve_core::attachment::Category;
use immosieve_core::error::{Error, Result};

/// Byte and per-category count caps for one listing's attachments.
///
/// A category without a count cap is bounded only by bytes; without a byte
/// cap only the count caps apply. At least one cap must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default)]
    pub byte_cap: Option<u64>,
    #[serde(default)]
    pub count_caps: BTreeMap<Category, u32>,
}

impl Budget {
    pub fn new(byte_cap: Option<u64>) -> Self {
        Self {
            byte_cap,
            count_caps: BTreeMap::new(),
        }
    }

    pub fn with_count_cap(mut self, category: Category, cap: u32) -> Self {
        self.count_caps.insert(category, cap);
        self
    }

    pub fn count_cap(&self, category: Category) -> Option<u32> {
        self.count_caps.get(&category).copied()
    }

    pub fn is_limited(&self) -> bool {
        self.byte_cap.is_some() || !self.count_caps.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_limited() {
            Ok(())
        } else {
            Err(Error::InvalidLimiting(
                "must specify either a byte limit or category limits".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_budget_is_rejected() {
        assert_eq!(Budget::default().validate().unwrap_err().code(), 501);
        assert!(Budget::new(Some(0)).validate().is_ok());
        assert!(Budget::default()
            .with_count_cap(Category::Document, 1)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_serde_uses_category_keys() {
        let b = Budget::new(Some(1000)).with_count_cap(Category::Picture, 2);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, r#"{"byte_cap":1000,"count_caps":{"picture":2}}"#);
        let back: Budget = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }
}
