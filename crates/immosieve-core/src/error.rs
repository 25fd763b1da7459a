//! Caller-visible error taxonomy.
//!
//! Codes are grouped by range: 1xx filtering, 2xx sorting, 3xx scaling,
//! 4xx paging, 5xx limiting, 6xx attachments. 7xx is reserved for the caching
//! layer, which lives outside this workspace. 9xx marks internal failures.

use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Malformed filter expression: {0}")]
    MalformedFilter(String),

    #[error("Invalid filter option: \"{0}\"")]
    InvalidFilterOption(String),

    #[error("Filter operation not implemented: \"{0}\"")]
    FilterOperationNotImplemented(String),

    #[error("Cannot filter real estate by \"{field}\" with operation \"{operator}\" for value \"{value}\"")]
    Sieving {
        field: String,
        operator: String,
        value: String,
    },

    #[error("Filter expression rejected: {0}")]
    SecurityBreach(String),

    #[error("Invalid sorting option: \"{0}\"")]
    InvalidSortingOption(String),

    #[error("Cannot sort real estates by \"{field}\": {reason}")]
    Sorting { field: String, reason: String },

    #[error("Invalid scaling option: \"{0}\"")]
    InvalidScalingOption(String),

    #[error("Invalid rendering resolution: \"{0}\"")]
    InvalidRenderingResolution(String),

    #[error("Rendering options have already been set")]
    RenderingOptionsAlreadySet,

    #[error("Invalid paging options count: expected 2, got {0}")]
    InvalidPagingOptionsCount(usize),

    #[error("Not an integer: \"{0}\"")]
    NotAnInteger(String),

    #[error("Invalid paging option: \"{0}\"")]
    InvalidPagingOption(String),

    #[error("Invalid limiting: {0}")]
    InvalidLimiting(String),

    #[error("Invalid attachment limit: \"{0}\"")]
    InvalidAttachmentLimit(String),

    #[error("Invalid attachment selection: \"{0}\"")]
    InvalidAttachmentSelection(String),

    #[error("Attachment selection by {0} conflicts with an earlier selection")]
    ConflictingAttachmentSelection(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable numeric identifier for transport layers.
    pub fn code(&self) -> u16 {
        match self {
            Error::MalformedFilter(_) => 101,
            Error::InvalidFilterOption(_) => 102,
            Error::FilterOperationNotImplemented(_) => 103,
            Error::Sieving { .. } => 104,
            Error::SecurityBreach(_) => 105,
            Error::InvalidSortingOption(_) => 201,
            Error::Sorting { .. } => 202,
            Error::InvalidScalingOption(_) => 301,
            Error::InvalidRenderingResolution(_) => 302,
            Error::RenderingOptionsAlreadySet => 303,
            Error::InvalidPagingOptionsCount(_) => 401,
            Error::NotAnInteger(_) => 402,
            Error::InvalidPagingOption(_) => 403,
            Error::InvalidLimiting(_) => 501,
            Error::InvalidAttachmentLimit(_) => 601,
            Error::InvalidAttachmentSelection(_) => 602,
            Error::ConflictingAttachmentSelection(_) => 603,
            Error::Internal(_) => 900,
        }
    }

    /// `(code, message)` pair as handed to the transport layer.
    pub fn render(&self) -> (u16, String) {
        (self.code(), self.to_string())
    }

    /// Security rejections outrank every other failure of the same request.
    pub fn is_security_breach(&self) -> bool {
        matches!(self, Error::SecurityBreach(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(e.to_string())
    }
}
