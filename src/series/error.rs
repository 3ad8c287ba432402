use std::path::PathBuf;
use thiserror::Error;

/// Boxed error handed back by registry and series collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A collaborator failed to supply its input. This is distinct from a station
/// simply having no readings, which is represented as missing values.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Failed to fetch '{parameter}' series for station '{station}'")]
    Series {
        station: String,
        parameter: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to load station registry")]
    Registry(#[source] BoxError),

    #[error("Failed to read station registry file '{0}'")]
    RegistryRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse station registry JSON")]
    RegistryParse(#[from] serde_json::Error),

    // Covers errors joining tokio blocking tasks
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl RetrievalError {
    /// Wraps a provider failure for one station and parameter.
    pub fn series(
        station: impl Into<String>,
        parameter: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        RetrievalError::Series {
            station: station.into(),
            parameter: parameter.into(),
            source: source.into(),
        }
    }
}
