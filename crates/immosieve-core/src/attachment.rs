//! Attachment metadata as handed to the budget allocator.
//!
//! Sizes are known up front; nothing here fetches attachment bodies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// OpenImmo attachment group (`anhang/@gruppe`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachmentGroup {
    Titelbild,
    Innenansichten,
    Aussenansichten,
    Grundriss,
    KartenLageplan,
    Anbieterlogo,
    Bild,
    Dokumente,
    Links,
    Panorama,
    Qrcode,
    Film,
    Filmlink,
    #[serde(alias = "EPASS-SKALA")]
    EpassSkala,
    Anbobjurl,
}

impl AttachmentGroup {
    pub const ALL: [AttachmentGroup; 15] = [
        AttachmentGroup::Titelbild,
        AttachmentGroup::Innenansichten,
        AttachmentGroup::Aussenansichten,
        AttachmentGroup::Grundriss,
        AttachmentGroup::KartenLageplan,
        AttachmentGroup::Anbieterlogo,
        AttachmentGroup::Bild,
        AttachmentGroup::Dokumente,
        AttachmentGroup::Links,
        AttachmentGroup::Panorama,
        AttachmentGroup::Qrcode,
        AttachmentGroup::Film,
        AttachmentGroup::Filmlink,
        AttachmentGroup::EpassSkala,
        AttachmentGroup::Anbobjurl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentGroup::Titelbild => "TITELBILD",
            AttachmentGroup::Innenansichten => "INNENANSICHTEN",
            AttachmentGroup::Aussenansichten => "AUSSENANSICHTEN",
            AttachmentGroup::Grundriss => "GRUNDRISS",
            AttachmentGroup::KartenLageplan => "KARTEN_LAGEPLAN",
            AttachmentGroup::Anbieterlogo => "ANBIETERLOGO",
            AttachmentGroup::Bild => "BILD",
            AttachmentGroup::Dokumente => "DOKUMENTE",
            AttachmentGroup::Links => "LINKS",
            AttachmentGroup::Panorama => "PANORAMA",
            AttachmentGroup::Qrcode => "QRCODE",
            AttachmentGroup::Film => "FILM",
            AttachmentGroup::Filmlink => "FILMLINK",
            AttachmentGroup::EpassSkala => "EPASS_SKALA",
            AttachmentGroup::Anbobjurl => "ANBOBJURL",
        }
    }

    /// Groups rendered as images. Floor plans are images too but get their
    /// own category.
    pub fn is_picture(&self) -> bool {
        matches!(
            self,
            AttachmentGroup::Titelbild
                | AttachmentGroup::Innenansichten
                | AttachmentGroup::Aussenansichten
                | AttachmentGroup::Grundriss
                | AttachmentGroup::KartenLageplan
                | AttachmentGroup::Anbieterlogo
                | AttachmentGroup::Bild
                | AttachmentGroup::Panorama
                | AttachmentGroup::EpassSkala
        )
    }
}

impl fmt::Display for AttachmentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttachmentGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == wanted)
            .ok_or_else(|| format!("unknown attachment group '{}'", s))
    }
}

/// Where the attachment body lives (`anhang/@location`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Location {
    #[default]
    Intern,
    Extern,
    Remote,
}

/// Budget category of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Picture,
    Floorplan,
    Document,
    Other,
}

impl Category {
    /// Fixed allocation priority.
    pub const PRIORITY: [Category; 4] = [
        Category::Picture,
        Category::Floorplan,
        Category::Document,
        Category::Other,
    ];

    pub fn of_group(group: Option<AttachmentGroup>) -> Category {
        match group {
            Some(AttachmentGroup::Grundriss) => Category::Floorplan,
            Some(AttachmentGroup::Dokumente) => Category::Document,
            Some(g) if g.is_picture() => Category::Picture,
            _ => Category::Other,
        }
    }

    /// Key used in attachment option strings.
    pub fn option_key(&self) -> &'static str {
        match self {
            Category::Picture => "pictures",
            Category::Floorplan => "floorplans",
            Category::Document => "documents",
            Category::Other => "other",
        }
    }

    pub fn from_option_key(key: &str) -> Option<Category> {
        Self::PRIORITY.iter().copied().find(|c| c.option_key() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub group: Option<AttachmentGroup>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    pub size_bytes: u64,
}

impl Attachment {
    pub fn category(&self) -> Category {
        Category::of_group(self.group)
    }

    /// Remote attachments are links, not payload, and always ship.
    pub fn is_whitelisted(&self) -> bool {
        self.location == Location::Remote
    }
}
