use crate::series::error::RetrievalError;
use crate::types::station::Station;
use async_trait::async_trait;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Supplies the full list of stations for one provider network.
///
/// The list is loaded once per client and treated as read-only afterwards.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn load(&self) -> Result<Vec<Station>, RetrievalError>;
}

/// A registry backed by stations already held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    stations: Vec<Station>,
}

impl StaticRegistry {
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }
}

impl From<Vec<Station>> for StaticRegistry {
    fn from(stations: Vec<Station>) -> Self {
        Self::new(stations)
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    async fn load(&self) -> Result<Vec<Station>, RetrievalError> {
        Ok(self.stations.clone())
    }
}

/// A registry read from a JSON array of [`Station`] records on disk.
#[derive(Debug, Clone)]
pub struct JsonRegistry {
    path: PathBuf,
}

impl JsonRegistry {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Registry for JsonRegistry {
    async fn load(&self) -> Result<Vec<Station>, RetrievalError> {
        let start = Instant::now();
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| RetrievalError::RegistryRead(self.path.clone(), e))?;
        debug!("Read {} bytes from {}", bytes.len(), self.path.display());

        // Parsing a large registry is CPU bound, keep it off the async workers.
        let stations = tokio::task::spawn_blocking(move || {
            serde_json::from_slice::<Vec<Station>>(&bytes)
        })
        .await??;

        info!(
            "Loaded {} stations from {} in {:?}",
            stations.len(),
            self.path.display(),
            start.elapsed()
        );
        Ok(stations)
    }
}
