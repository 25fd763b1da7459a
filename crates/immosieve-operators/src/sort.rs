//! Composite multi-key ordering.
//!
//! Keys are extracted once per record, then compared lexicographically. A
//! missing value is the smallest value of an ascending key; the whole
//! per-key comparison flips for a descending key, so missing values trail
//! there. The sort is stable.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use immosieve_core::error::{Error, Result};
use immosieve_core::record::RealEstate;
use immosieve_core::value::Value;

use crate::registry::{lookup, FieldDescriptor};
use crate::traits::{RecordStream, Stage};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortKey {
    pub field: &'static FieldDescriptor,
    pub descending: bool,
}

impl SortKey {
    /// Parse `field` or `field:asc|desc`.
    pub fn parse(src: &str) -> Result<Self> {
        let (name, mode) = match src.split_once(':') {
            Some((name, mode)) => (name.trim(), Some(mode.trim())),
            None => (src.trim(), None),
        };
        let field =
            lookup(name).ok_or_else(|| Error::InvalidSortingOption(name.to_string()))?;
        if !field.sortable {
            return Err(Error::InvalidSortingOption(name.to_string()));
        }
        let descending = match mode.map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => false,
            Some("desc") => true,
            Some(_) => return Err(Error::InvalidSortingOption(src.trim().to_string())),
        };
        Ok(Self { field, descending })
    }

    fn key_of(&self, record: &RealEstate) -> Result<Option<Value>> {
        self.field.extract(record).map_err(|e| Error::Sorting {
            field: self.field.name.to_string(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.descending { "desc" } else { "asc" };
        write!(f, "{}:{}", self.field.name, mode)
    }
}

/// Ordered sort keys; the first is primary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SortSpec {
    pub keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    /// Comma-separated list of sort keys. Empty items are skipped.
    pub fn parse(src: &str) -> Result<Self> {
        let keys = src
            .split(',')
            .filter(|item| !item.trim().is_empty())
            .map(SortKey::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn compare(&self, a: &[Option<Value>], b: &[Option<Value>]) -> Ordering {
        for ((key, x), y) in self.keys.iter().zip(a).zip(b) {
            let ord = key_cmp(x.as_ref(), y.as_ref());
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

impl Stage for SortSpec {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn is_noop(&self) -> bool {
        self.keys.is_empty()
    }

    fn run<'a>(&self, input: RecordStream<'a>) -> Result<RecordStream<'a>> {
        if self.is_noop() {
            return Ok(input);
        }
        let mut keyed = input
            .into_iter()
            .map(|record| {
                let tuple = self
                    .keys
                    .iter()
                    .map(|k| k.key_of(record))
                    .collect::<Result<Vec<_>>>()?;
                Ok((tuple, record))
            })
            .collect::<Result<Vec<_>>>()?;

        // slice::sort_by is stable
        keyed.sort_by(|(a, _), (b, _)| self.compare(a, b));
        Ok(keyed.into_iter().map(|(_, record)| record).collect())
    }
}

/// Total order over optional values: missing first, then by type rank, then
/// by value. Incomparable values of one rank (NaN) tie.
fn key_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => rank(x).cmp(&rank(y)).then_with(|| match (x, y) {
            (Value::Bool(p), Value::Bool(q)) => p.cmp(q),
            _ => x.compare(y).unwrap_or(Ordering::Equal),
        }),
    }
}

fn rank(v: &Value) -> u8 {
    match v {
        Value::Bool(_) => 0,
        Value::Int(_) | Value::Float(_) => 1,
        Value::Date(_) => 2,
        Value::Str(_) => 3,
        Value::List(_) => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use immosieve_core::record::{Flaechen, Preise, VerwaltungTechn};

    fn listing(kaltmiete: Option<f64>, objektnr: &str) -> RealEstate {
        RealEstate {
            preise: Some(Preise {
                kaltmiete,
                ..Default::default()
            }),
            verwaltung_techn: Some(VerwaltungTechn {
                openimmo_obid: format!("obid-{}", objektnr),
                objektnr_intern: None,
                objektnr_extern: objektnr.to_string(),
            }),
            ..Default::default()
        }
    }

    fn ids(out: &[&RealEstate]) -> Vec<String> {
        out.iter()
            .map(|r| r.verwaltung_techn.as_ref().unwrap().objektnr_extern.clone())
            .collect()
    }

    #[test]
    fn test_parse_modes() {
        let spec = SortSpec::parse("kaltmiete, zimmer:DESC,plz:asc").unwrap();
        assert_eq!(spec.keys.len(), 3);
        assert!(!spec.keys[0].descending);
        assert!(spec.keys[1].descending);
        assert_eq!(spec.to_string(), "kaltmiete:asc,zimmer:desc,plz:asc");
    }

    #[test]
    fn test_parse_rejects_bad_keys() {
        assert_eq!(SortSpec::parse("preis").unwrap_err().code(), 201);
        assert_eq!(SortSpec::parse("zimmer:up").unwrap_err().code(), 201);
        // list-valued fields have no order
        assert_eq!(SortSpec::parse("objekttyp").unwrap_err().code(), 201);
        assert!(SortSpec::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        let records = vec![
            listing(Some(500.0), "C"),
            listing(Some(400.0), "B"),
            listing(Some(500.0), "A"),
        ];
        let spec = SortSpec::parse("kaltmiete,objektnr_extern").unwrap();
        let out = spec.run(records.iter().collect()).unwrap();
        assert_eq!(ids(&out), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_missing_values_first_then_last_when_descending() {
        let records = vec![
            listing(Some(700.0), "A"),
            listing(None, "B"),
            listing(Some(300.0), "C"),
        ];
        let asc = SortSpec::parse("kaltmiete").unwrap();
        assert_eq!(ids(&asc.run(records.iter().collect()).unwrap()), vec!["B", "C", "A"]);
        let desc = SortSpec::parse("kaltmiete:desc").unwrap();
        assert_eq!(ids(&desc.run(records.iter().collect()).unwrap()), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_stable_on_equal_keys() {
        let records: Vec<_> = ["D", "A", "C", "B"]
            .iter()
            .map(|id| listing(Some(100.0), id))
            .collect();
        let out = SortSpec::parse("kaltmiete:desc")
            .unwrap()
            .run(records.iter().collect())
            .unwrap();
        assert_eq!(ids(&out), vec!["D", "A", "C", "B"]);
    }

    #[test]
    fn test_broken_accessor_is_sorting_error() {
        let records = vec![
            RealEstate {
                flaechen: Some(Flaechen::default()),
                ..Default::default()
            },
            RealEstate::default(),
        ];
        let err = SortSpec::parse("zimmer")
            .unwrap()
            .run(records.iter().collect())
            .unwrap_err();
        assert_eq!(err.code(), 202);
    }

    #[test]
    fn test_key_cmp_mixed_types() {
        let one = Value::Int(1);
        let text = Value::Str("a".into());
        assert_eq!(key_cmp(Some(&one), Some(&text)), Ordering::Less);
        assert_eq!(key_cmp(None, Some(&Value::Bool(false))), Ordering::Less);
        assert_eq!(
            key_cmp(Some(&Value::Bool(true)), Some(&Value::Bool(false))),
            Ordering::Greater
        );
        assert_eq!(
            key_cmp(Some(&Value::Float(f64::NAN)), Some(&Value::Float(1.0))),
            Ordering::Equal
        );
    }
}
