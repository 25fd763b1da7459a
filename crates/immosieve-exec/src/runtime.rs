//! Runtime: compile options, run the stage chain, allocate attachments, and
//! emit a manifest.
//!
//! A hard error anywhere (broken record during sieve or sort, invalid
//! budget) aborts the run; no partial output is returned.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use immosieve_budget::allocate;
use immosieve_core::attachment::Attachment;
use immosieve_core::config::QueryConfig;
use immosieve_core::error::Error as QueryError;
use immosieve_core::hash::{hash_serde, Hash256};
use immosieve_core::manifest::QueryManifest;
use immosieve_core::record::RealEstate;
use immosieve_operators::{RecordStream, Stage};
use immosieve_planner::{compile, AttachmentPlan, PlanError, QueryOptions, QueryPlan};

use crate::metrics::emit_span;
use crate::replay::hash_plan;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl ExecError {
    pub fn code(&self) -> u16 {
        match self {
            ExecError::Query(e) => e.code(),
            ExecError::Plan(e) => e.code(),
        }
    }
}

/// One returned listing with the attachments chosen for it.
#[derive(Debug, Clone)]
pub struct Hit<'a> {
    pub record: &'a RealEstate,
    /// Empty unless attachments were included.
    pub attachments: Vec<&'a Attachment>,
}

impl Hit<'_> {
    /// Owned copy limited to what the plan includes.
    pub fn render(&self, plan: &QueryPlan) -> RealEstate {
        let mut out = self.record.projected(plan.include.freitexte, false);
        if plan.include.attachments {
            out.anhaenge = self.attachments.iter().map(|a| (*a).clone()).collect();
        }
        out
    }
}

#[derive(Debug)]
pub struct QueryOutput<'a> {
    pub hits: Vec<Hit<'a>>,
    pub manifest: QueryManifest,
}

/// Engine owns the query limits every plan is validated against.
pub struct Engine {
    cfg: QueryConfig,
}

impl Engine {
    pub fn new(cfg: QueryConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.cfg
    }

    pub fn plan(&self, opts: &QueryOptions) -> Result<QueryPlan, ExecError> {
        Ok(compile(opts, &self.cfg)?)
    }

    /// Compile and run in one go.
    pub fn query<'a>(
        &self,
        records: &'a [RealEstate],
        opts: &QueryOptions,
    ) -> Result<QueryOutput<'a>, ExecError> {
        let plan = self.plan(opts)?;
        self.run(records, &plan)
    }

    /// Execute `plan` over `records`. Records are never modified.
    pub fn run<'a>(
        &self,
        records: &'a [RealEstate],
        plan: &QueryPlan,
    ) -> Result<QueryOutput<'a>, ExecError> {
        let plan_hash = hash_plan(plan, &self.cfg)?;
        let mut manifest = QueryManifest::new(plan_hash, records.len(), now_ms());

        let mut stream: RecordStream<'a> = records.iter().collect();
        for stage in plan.stages() {
            if stage.is_noop() {
                continue;
            }
            let before = stream.len();
            stream = stage.run(stream)?;
            emit_span(
                stage.name(),
                &[
                    ("in", before.to_string()),
                    ("out", stream.len().to_string()),
                ],
            );
            if stage.name() == "sieve" {
                manifest.records_matched = stream.len();
            }
        }
        if plan.sieve.is_noop() {
            manifest.records_matched = records.len();
        }

        let hits = stream
            .into_iter()
            .map(|record| {
                let attachments = select_attachments(record, plan)?;
                Ok(Hit {
                    record,
                    attachments,
                })
            })
            .collect::<Result<Vec<_>, ExecError>>()?;

        manifest.records_out = hits.len();
        manifest.attachments_out = hits.iter().map(|h| h.attachments.len()).sum();
        let digest = outputs_digest(&hits)?;
        let manifest = manifest.finish(now_ms(), Some(digest));

        emit_span(
            "query",
            &[
                ("plan_hash", manifest.plan_hash.to_hex()),
                ("records_in", manifest.records_in.to_string()),
                ("records_out", manifest.records_out.to_string()),
                ("attachments_out", manifest.attachments_out.to_string()),
                ("elapsed_ms", manifest.elapsed_ms().to_string()),
            ],
        );

        Ok(QueryOutput { hits, manifest })
    }
}

fn select_attachments<'a>(
    record: &'a RealEstate,
    plan: &QueryPlan,
) -> Result<Vec<&'a Attachment>, ExecError> {
    match &plan.attachments {
        None => Ok(Vec::new()),
        Some(AttachmentPlan::Unbudgeted) => Ok(record.anhaenge.iter().collect()),
        Some(AttachmentPlan::Budgeted {
            budget, selection, ..
        }) => {
            let allocation = allocate(&record.anhaenge, selection, budget)?;
            Ok(allocation.pick(&record.anhaenge))
        }
    }
}

fn outputs_digest(hits: &[Hit<'_>]) -> Result<Hash256, ExecError> {
    let rows: Vec<(Option<&str>, usize)> = hits
        .iter()
        .map(|h| {
            let obid = h
                .record
                .verwaltung_techn
                .as_ref()
                .map(|t| t.openimmo_obid.as_str());
            (obid, h.attachments.len())
        })
        .collect();
    Ok(hash_serde(&rows)?)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(millis)
        .unwrap_or(0)
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use immosieve_core::attachment::{AttachmentGroup, Location};
    use immosieve_core::record::{Flaechen, Freitexte, VerwaltungTechn};

    fn listing(obid: &str, rooms: f64, pictures: &[u64]) -> RealEstate {
        RealEstate {
            flaechen: Some(Flaechen {
                anzahl_zimmer: Some(rooms),
                ..Default::default()
            }),
            verwaltung_techn: Some(VerwaltungTechn {
                openimmo_obid: obid.into(),
                objektnr_intern: None,
                objektnr_extern: obid.to_uppercase(),
            }),
            freitexte: Some(Freitexte {
                objekttitel: Some(format!("Wohnung {}", obid)),
                ..Default::default()
            }),
            anhaenge: pictures
                .iter()
                .map(|size| Attachment {
                    title: None,
                    group: Some(AttachmentGroup::Bild),
                    location: Location::Intern,
                    mimetype: Some("image/jpeg".into()),
                    path: None,
                    size_bytes: *size,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn opts(pairs: &[(&str, &str)]) -> QueryOptions {
        QueryOptions::parse(pairs.iter().copied())
    }

    #[test]
    fn test_pipeline_order_and_manifest() {
        let records = vec![
            listing("a", 2.0, &[]),
            listing("b", 4.0, &[]),
            listing("c", 3.0, &[]),
            listing("d", 5.0, &[]),
        ];
        let engine = Engine::new(QueryConfig::default());
        let out = engine
            .query(
                &records,
                &opts(&[
                    ("filter", "zimmer>=3"),
                    ("sort", "zimmer:desc"),
                    ("paging", "limit:2,page:0"),
                ]),
            )
            .unwrap();
        let ids: Vec<_> = out
            .hits
            .iter()
            .map(|h| h.record.verwaltung_techn.as_ref().unwrap().openimmo_obid.as_str())
            .collect();
        assert_eq!(ids, vec!["d", "b"]);
        assert_eq!(out.manifest.records_in, 4);
        assert_eq!(out.manifest.records_matched, 3);
        assert_eq!(out.manifest.records_out, 2);
        assert!(out.manifest.outputs_digest.is_some());
    }

    #[test]
    fn test_hard_error_returns_nothing() {
        let records = vec![listing("a", 3.0, &[]), RealEstate::default()];
        let engine = Engine::new(QueryConfig::default());
        let err = engine
            .query(&records, &opts(&[("filter", "zimmer>=3")]))
            .unwrap_err();
        assert_eq!(err.code(), 104);
    }

    #[test]
    fn test_attachments_follow_budget() {
        let records = vec![listing("a", 3.0, &[400, 400, 400])];
        let engine = Engine::new(QueryConfig::default());
        let out = engine
            .query(
                &records,
                &opts(&[
                    ("include", "attachments"),
                    ("attachments", "pictures:2,bytes:1000"),
                ]),
            )
            .unwrap();
        assert_eq!(out.hits[0].attachments.len(), 2);
        assert_eq!(out.manifest.attachments_out, 2);
    }

    #[test]
    fn test_render_projects_includes() {
        let records = vec![listing("a", 3.0, &[10])];
        let engine = Engine::new(QueryConfig::default());

        let plan = engine.plan(&QueryOptions::default()).unwrap();
        let out = engine.run(&records, &plan).unwrap();
        let rendered = out.hits[0].render(&plan);
        assert!(rendered.freitexte.is_none());
        assert!(rendered.anhaenge.is_empty());

        let plan = engine
            .plan(&opts(&[("include", "freitexte,attachments")]))
            .unwrap();
        let out = engine.run(&records, &plan).unwrap();
        let rendered = out.hits[0].render(&plan);
        assert!(rendered.freitexte.is_some());
        assert_eq!(rendered.anhaenge.len(), 1);
    }

    #[test]
    fn test_millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_same_query_same_plan_hash() {
        let records = vec![listing("a", 3.0, &[])];
        let engine = Engine::new(QueryConfig::default());
        let q = opts(&[("filter", "zimmer>=3"), ("sort", "zimmer")]);
        let first = engine.query(&records, &q).unwrap();
        let second = engine.query(&records, &q).unwrap();
        assert_eq!(first.manifest.plan_hash, second.manifest.plan_hash);
        assert_ne!(first.manifest.id, second.manifest.id);
        assert_eq!(first.manifest.outputs_digest, second.manifest.outputs_digest);
    }
}
