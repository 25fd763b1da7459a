//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use immosieve_core::prelude::*;
use immosieve_exec::{Engine, QueryOutput};
use immosieve_planner::QueryOptions;

pub const LISTINGS_JSON: &str = include_str!("../fixtures/listings.json");

pub fn listings() -> Vec<RealEstate> {
    serde_json::from_str(LISTINGS_JSON).expect("fixture parses")
}

pub fn options(pairs: &[(&str, &str)]) -> QueryOptions {
    QueryOptions::parse(pairs.iter().copied())
}

pub fn engine() -> Engine {
    Engine::new(QueryConfig::default())
}

/// External object numbers of the hits, in output order.
pub fn ids(out: &QueryOutput<'_>) -> Vec<String> {
    out.hits
        .iter()
        .map(|h| h.record.verwaltung_techn.as_ref().unwrap().objektnr_extern.clone())
        .collect()
}

pub fn attachment(group: AttachmentGroup, size_bytes: u64) -> Attachment {
    Attachment {
        title: None,
        group: Some(group),
        location: Location::Intern,
        mimetype: None,
        path: None,
        size_bytes,
    }
}

pub fn remote(group: AttachmentGroup) -> Attachment {
    Attachment {
        location: Location::Remote,
        ..attachment(group, 0)
    }
}
