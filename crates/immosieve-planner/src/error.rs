use thiserror::Error;

use immosieve_core::error::Error as QueryError;

pub type Result<T> = std::result::Result<T, PlanError>;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PlanError {
    /// Numeric code of the underlying query error; 900 for document errors.
    pub fn code(&self) -> u16 {
        match self {
            PlanError::Query(e) => e.code(),
            PlanError::Yaml(_) => 900,
        }
    }
}
