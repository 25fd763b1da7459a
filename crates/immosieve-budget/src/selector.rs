//! Explicit attachment selection: by position, by title, or by group.
//!
//! The three kinds are mutually exclusive within one query. Several
//! selectors of the same kind accumulate.

use serde::{Deserialize, Serialize};

use immosieve_core::attachment::{Attachment, AttachmentGroup};
use immosieve_core::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// Zero-based position in the listing's attachment list.
    Index(usize),
    Title(String),
    Group(AttachmentGroup),
}

impl Selector {
    /// `3`, `"Title"` (double-quoted), or `%GROUP`.
    pub fn parse(raw: &str) -> Result<Self> {
        let s = raw.trim();
        if let Some(group) = s.strip_prefix('%') {
            return group
                .parse()
                .map(Selector::Group)
                .map_err(|_| Error::InvalidAttachmentSelection(raw.to_string()));
        }
        if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
            return Ok(Selector::Title(s[1..s.len() - 1].to_string()));
        }
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse()
                .map(Selector::Index)
                .map_err(|_| Error::InvalidAttachmentSelection(raw.to_string()));
        }
        Err(Error::InvalidAttachmentSelection(raw.to_string()))
    }

    fn kind(&self) -> &'static str {
        match self {
            Selector::Index(_) => "index",
            Selector::Title(_) => "title",
            Selector::Group(_) => "group",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// No explicit selection; the budget decides.
    #[default]
    All,
    Indexes(Vec<usize>),
    Titles(Vec<String>),
    Groups(Vec<AttachmentGroup>),
}

impl Selection {
    pub fn is_explicit(&self) -> bool {
        !matches!(self, Selection::All)
    }

    /// Add a selector. Mixing kinds is rejected.
    pub fn push(&mut self, selector: Selector) -> Result<()> {
        if let Selection::All = self {
            *self = match selector {
                Selector::Index(i) => Selection::Indexes(vec![i]),
                Selector::Title(t) => Selection::Titles(vec![t]),
                Selector::Group(g) => Selection::Groups(vec![g]),
            };
            return Ok(());
        }
        match (self, selector) {
            (Selection::Indexes(v), Selector::Index(i)) => v.push(i),
            (Selection::Titles(v), Selector::Title(t)) => v.push(t),
            (Selection::Groups(v), Selector::Group(g)) => v.push(g),
            (_, other) => return Err(Error::ConflictingAttachmentSelection(other.kind())),
        }
        Ok(())
    }

    pub fn matches(&self, index: usize, attachment: &Attachment) -> bool {
        match self {
            Selection::All => true,
            Selection::Indexes(v) => v.contains(&index),
            Selection::Titles(v) => attachment
                .title
                .as_ref()
                .map_or(false, |t| v.iter().any(|w| w == t)),
            Selection::Groups(v) => attachment.group.map_or(false, |g| v.contains(&g)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use immosieve_core::attachment::Location;

    fn att(title: &str, group: AttachmentGroup) -> Attachment {
        Attachment {
            title: Some(title.into()),
            group: Some(group),
            location: Location::Intern,
            mimetype: None,
            path: None,
            size_bytes: 10,
        }
    }

    #[test]
    fn test_parse_selectors() {
        assert_eq!(Selector::parse("2").unwrap(), Selector::Index(2));
        assert_eq!(
            Selector::parse("\"Küche\"").unwrap(),
            Selector::Title("Küche".into())
        );
        assert_eq!(
            Selector::parse("%grundriss").unwrap(),
            Selector::Group(AttachmentGroup::Grundriss)
        );
        assert_eq!(Selector::parse("%KELLER").unwrap_err().code(), 602);
        assert_eq!(Selector::parse("-1").unwrap_err().code(), 602);
        assert_eq!(Selector::parse("").unwrap_err().code(), 602);
    }

    #[test]
    fn test_mixed_kinds_conflict() {
        let mut sel = Selection::default();
        sel.push(Selector::Index(0)).unwrap();
        sel.push(Selector::Index(3)).unwrap();
        assert_eq!(sel, Selection::Indexes(vec![0, 3]));
        let err = sel.push(Selector::Title("x".into())).unwrap_err();
        assert_eq!(err.code(), 603);
    }

    #[test]
    fn test_matching() {
        let a = att("Küche", AttachmentGroup::Innenansichten);
        assert!(Selection::All.matches(5, &a));
        assert!(Selection::Indexes(vec![5]).matches(5, &a));
        assert!(!Selection::Indexes(vec![4]).matches(5, &a));
        assert!(Selection::Titles(vec!["Küche".into()]).matches(0, &a));
        assert!(!Selection::Groups(vec![AttachmentGroup::Grundriss]).matches(0, &a));
    }
}
