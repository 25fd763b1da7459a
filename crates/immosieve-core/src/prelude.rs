//! Convenient re-exports for downstream crates.

pub use crate::attachment::{Attachment, AttachmentGroup, Category, Location};
pub use crate::config::{ConfigPatch, QueryConfig};
pub use crate::error::{Error, Result};
pub use crate::hash::Hash256;
pub use crate::manifest::{ManifestId, QueryManifest};
pub use crate::record::RealEstate;
pub use crate::value::{cast, CastError, Value, ValueType};
