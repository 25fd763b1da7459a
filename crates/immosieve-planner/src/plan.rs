//! Compile options into a validated plan.

use std::fmt;

use serde::Serialize;

use immosieve_budget::{Budget, Selection};
use immosieve_core::config::QueryConfig;
use immosieve_operators::{PageSpec, Sieve, SortSpec, Stage};

use crate::error::Result;
use crate::options::{parse_paging, AttachmentOptions, Includes, QueryOptions, Scaling};

/// How attachments of each hit are chosen. Present only when attachments
/// are included in the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttachmentPlan {
    /// No attachment option given: ship every attachment.
    Unbudgeted,
    Budgeted {
        budget: Budget,
        selection: Selection,
        scaling: Option<Scaling>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub sieve: Sieve,
    pub sort: SortSpec,
    pub paging: PageSpec,
    pub include: Includes,
    pub attachments: Option<AttachmentPlan>,
}

impl QueryPlan {
    pub fn stages(&self) -> [&dyn Stage; 3] {
        [&self.sieve, &self.sort, &self.paging]
    }

    /// Human-readable plan, one stage per line.
    pub fn explain(&self) -> String {
        self.to_string()
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sieve: {}", self.sieve.expr)?;
        if self.sort.is_empty() {
            writeln!(f, "sort: input order")?;
        } else {
            writeln!(f, "sort: {}", self.sort)?;
        }
        match self.paging.limit {
            Some(limit) => writeln!(
                f,
                "page: {} (limit {}, offset {})",
                self.paging.page,
                limit,
                self.paging.offset()
            )?,
            None => writeln!(f, "page: all")?,
        }
        writeln!(
            f,
            "include: freitexte={} attachments={}",
            self.include.freitexte, self.include.attachments
        )?;
        match &self.attachments {
            None => {}
            Some(AttachmentPlan::Unbudgeted) => writeln!(f, "attachments: all")?,
            Some(AttachmentPlan::Budgeted {
                budget,
                selection,
                scaling,
            }) => {
                if selection.is_explicit() {
                    writeln!(f, "attachments: select {:?}", selection)?;
                } else {
                    match budget.byte_cap {
                        Some(bytes) => write!(f, "attachments: bytes {}", bytes)?,
                        None => write!(f, "attachments: bytes unbounded")?,
                    }
                    for (category, cap) in &budget.count_caps {
                        write!(f, ", {} {}", category.option_key(), cap)?;
                    }
                    writeln!(f)?;
                }
                if let Some(s) = scaling {
                    writeln!(f, "scaling: {}x{}", s.width, s.height)?;
                }
            }
        }
        Ok(())
    }
}

/// Validate `opts` under `cfg` and build the plan. No record is touched.
pub fn compile(opts: &QueryOptions, cfg: &QueryConfig) -> Result<QueryPlan> {
    let sieve = match opts.filter.as_deref() {
        Some(src) => Sieve::parse(src, cfg)?,
        None => Sieve::default(),
    };
    let sort = match opts.sort.as_deref() {
        Some(src) => SortSpec::parse(src)?,
        None => SortSpec::default(),
    };
    let paging = match opts.paging.as_deref() {
        Some(src) => parse_paging(src, cfg.max_page_size)?,
        None => PageSpec::default(),
    };
    let include = opts
        .include
        .as_deref()
        .map(Includes::parse)
        .unwrap_or_default();

    let attachment_opts = match opts.attachments.as_deref() {
        Some(src) => Some(AttachmentOptions::parse(src)?),
        None => None,
    };
    let attachments = if !include.attachments {
        None
    } else {
        Some(match attachment_opts {
            Some(mut a) => {
                if a.budget.byte_cap.is_none() {
                    a.budget.byte_cap = cfg.default_byte_cap;
                }
                if !a.selection.is_explicit() {
                    a.budget.validate()?;
                }
                AttachmentPlan::Budgeted {
                    budget: a.budget,
                    selection: a.selection,
                    scaling: a.scaling,
                }
            }
            None => match cfg.default_byte_cap {
                Some(cap) => AttachmentPlan::Budgeted {
                    budget: Budget::new(Some(cap)),
                    selection: Selection::All,
                    scaling: None,
                },
                None => AttachmentPlan::Unbudgeted,
            },
        })
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        leaves = sieve.expr.leaves().len(),
        sort_keys = sort.keys.len(),
        paged = paging.limit.is_some(),
        "query plan compiled"
    );

    Ok(QueryPlan {
        sieve,
        sort,
        paging,
        include,
        attachments,
    })
}
