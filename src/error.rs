use crate::series::error::RetrievalError;
use crate::stations::error::SelectionError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StationKitError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("Failed building DataFrame: {0}")]
    DataFrame(#[from] PolarsError),
}

impl StationKitError {
    /// True when the call was rejected because of its arguments.
    pub fn is_invalid_selection(&self) -> bool {
        matches!(self, StationKitError::Selection(_))
    }

    /// True when a registry or series collaborator failed.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(self, StationKitError::Retrieval(_))
    }
}
