//! YAML query documents.
//!
//! Example:
//! ```yaml
//! config:
//!   max_filter_depth: 8
//! filter: "zimmer>=3 and (ort%=hannover or plz==30159)"
//! sort: "kaltmiete,objektnr_extern:desc"
//! paging: { limit: 10, page: 0 }
//! include: [attachments]
//! attachments: "pictures:2,bytes:1048576"
//! ```
//!
//! `sort` and `include` also accept lists; `paging` also accepts the
//! `limit:N,page:M` string form.

use serde::{Deserialize, Serialize};

use immosieve_core::config::ConfigPatch;

use crate::error::Result;
use crate::options::QueryOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryDocument {
    #[serde(default)]
    pub config: Option<ConfigPatch>,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub sort: Option<OneOrMany>,
    #[serde(default)]
    pub paging: Option<PagingDoc>,
    #[serde(default)]
    pub include: Option<OneOrMany>,
    #[serde(default)]
    pub attachments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn joined(&self) -> String {
        match self {
            OneOrMany::One(s) => s.clone(),
            OneOrMany::Many(v) => v.join(","),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PagingDoc {
    Window { limit: i64, page: i64 },
    Raw(String),
}

impl PagingDoc {
    fn as_option(&self) -> String {
        match self {
            PagingDoc::Window { limit, page } => format!("limit:{},page:{}", limit, page),
            PagingDoc::Raw(s) => s.clone(),
        }
    }
}

impl QueryDocument {
    /// The document as option strings; validation happens in `compile`.
    pub fn to_options(&self) -> QueryOptions {
        QueryOptions {
            filter: self.filter.clone(),
            sort: self.sort.as_ref().map(OneOrMany::joined),
            paging: self.paging.as_ref().map(PagingDoc::as_option),
            attachments: self.attachments.clone(),
            include: self.include.as_ref().map(OneOrMany::joined),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedQuery {
    pub options: QueryOptions,
    pub config: ConfigPatch,
}

pub fn parse_query_yaml(yaml_src: &str) -> Result<ParsedQuery> {
    let doc: QueryDocument = serde_yaml::from_str(yaml_src)?;
    Ok(ParsedQuery {
        options: doc.to_options(),
        config: doc.config.unwrap_or_default(),
    })
}
