//! Raw query options and their string grammars.
//!
//! Options arrive as key/value pairs (`filter`, `sort`, `paging`,
//! `attachments`, `include`). Values are comma-separated lists of
//! `key:value` items, except `filter`, which has its own grammar.

use serde::{Deserialize, Serialize};

use immosieve_budget::{Budget, Selection, Selector};
use immosieve_core::attachment::Category;
use immosieve_core::error::{Error, Result};
use immosieve_operators::PageSpec;

pub const FILTER: &str = "filter";
pub const SORT: &str = "sort";
pub const PAGING: &str = "paging";
pub const ATTACHMENTS: &str = "attachments";
pub const INCLUDE: &str = "include";

/// Unparsed option strings of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub paging: Option<String>,
    pub attachments: Option<String>,
    pub include: Option<String>,
}

impl QueryOptions {
    /// Pick the known keys out of `params`. `_` (cache buster) and unknown
    /// keys are ignored; a repeated key keeps its last value.
    pub fn parse<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut opts = Self::default();
        for (key, value) in params {
            let slot = match key.as_ref() {
                FILTER => &mut opts.filter,
                SORT => &mut opts.sort,
                PAGING => &mut opts.paging,
                ATTACHMENTS => &mut opts.attachments,
                INCLUDE => &mut opts.include,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        opts
    }
}

/// Optional parts of a listing that are shipped only on request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Includes {
    pub freitexte: bool,
    pub attachments: bool,
}

impl Includes {
    /// Unknown names are ignored.
    pub fn parse(src: &str) -> Self {
        let mut inc = Self::default();
        for item in src.split(',').map(str::trim) {
            match item {
                "freitexte" => inc.freitexte = true,
                "attachments" => inc.attachments = true,
                _ => {}
            }
        }
        inc
    }
}

/// `limit:N,page:M`, both required, in any order.
pub fn parse_paging(src: &str, max_page_size: Option<usize>) -> Result<PageSpec> {
    let items: Vec<&str> = src.split(',').collect();
    if items.len() != 2 {
        return Err(Error::InvalidPagingOptionsCount(items.len()));
    }
    let mut limit = None;
    let mut page = None;
    for item in items {
        let (key, value) = item.split_once(':').unwrap_or((item, ""));
        let slot = match key.trim() {
            "limit" => &mut limit,
            "page" => &mut page,
            other => return Err(Error::InvalidPagingOption(other.to_string())),
        };
        *slot = Some(non_negative(value, Error::InvalidPagingOption)?);
    }
    match (limit, page) {
        (Some(limit), Some(page)) => {
            if max_page_size.map_or(false, |max| limit > max) {
                return Err(Error::InvalidPagingOption(format!("limit:{}", limit)));
            }
            Ok(PageSpec::new(limit, page))
        }
        _ => Err(Error::InvalidPagingOption(src.to_string())),
    }
}

fn non_negative(value: &str, negative: fn(String) -> Error) -> Result<usize> {
    let v = value.trim();
    let n: i64 = v.parse().map_err(|_| Error::NotAnInteger(v.to_string()))?;
    usize::try_from(n).map_err(|_| negative(v.to_string()))
}

/// Target resolution handed to the external image scaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaling {
    pub width: u32,
    pub height: u32,
}

impl Scaling {
    /// `WxH`, both positive.
    pub fn parse(src: &str) -> Result<Self> {
        let s = src.trim();
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| Error::InvalidScalingOption(s.to_string()))?;
        let dim = |d: &str| {
            d.trim()
                .parse::<u32>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| Error::InvalidRenderingResolution(s.to_string()))
        };
        Ok(Self {
            width: dim(w)?,
            height: dim(h)?,
        })
    }
}

/// Parsed `attachments` option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentOptions {
    pub budget: Budget,
    pub selection: Selection,
    pub scaling: Option<Scaling>,
}

impl AttachmentOptions {
    /// Items: `pictures|floorplans|documents|other:N`, `bytes:N`,
    /// `scaling:WxH`, `select:<index|"title"|%GROUP>`. Commas inside a
    /// double-quoted title do not split.
    pub fn parse(src: &str) -> Result<Self> {
        let mut out = Self::default();
        for item in split_unquoted(src) {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let (key, value) = item
                .split_once(':')
                .ok_or_else(|| Error::InvalidAttachmentLimit(item.to_string()))?;
            match key.trim() {
                "bytes" => {
                    let cap = limit_value(value)?;
                    out.budget.byte_cap = Some(cap);
                }
                "scaling" => {
                    if out.scaling.is_some() {
                        return Err(Error::RenderingOptionsAlreadySet);
                    }
                    out.scaling = Some(Scaling::parse(value)?);
                }
                "select" => out.selection.push(Selector::parse(value)?)?,
                other => {
                    let category = Category::from_option_key(other)
                        .ok_or_else(|| Error::InvalidAttachmentLimit(item.to_string()))?;
                    let cap = u32::try_from(limit_value(value)?)
                        .map_err(|_| Error::InvalidAttachmentLimit(item.to_string()))?;
                    out.budget.count_caps.insert(category, cap);
                }
            }
        }
        Ok(out)
    }
}

fn limit_value(value: &str) -> Result<u64> {
    let v = value.trim();
    v.parse::<u64>()
        .map_err(|_| Error::InvalidAttachmentLimit(v.to_string()))
}

fn split_unquoted(src: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in src.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                parts.push(&src[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&src[start..]);
    parts
}
