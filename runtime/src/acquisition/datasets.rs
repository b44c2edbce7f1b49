//! Overlay datasets fetched from arbitrary URLs.

use super::http_client::{FetchError, HttpClient};
use crate::geometry::{Crs, GeoLayer, GeometryError};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a layer download produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("{0} contains no geometry")]
    Empty(String),
}

/// Download a GeoJSON document and normalize it to WGS 84.
pub async fn fetch_layer(http: &HttpClient, url: &str) -> Result<GeoLayer, LayerError> {
    let text = http.get_text(url).await?;
    let layer = GeoLayer::from_geojson(&text)?;
    if layer.is_empty() {
        return Err(LayerError::Empty(url.to_string()));
    }
    let layer = layer.to_crs(Crs::WGS84)?;
    debug!("loaded {} shapes from {url}", layer.shapes.len());
    Ok(layer)
}

/// Fetches overlay layers, memoized per URL for the life of the fetcher.
///
/// Misses are cached too; a URL that failed once is not retried.
pub struct DatasetFetcher {
    http: HttpClient,
    cache: DashMap<String, Option<Arc<GeoLayer>>>,
}

impl DatasetFetcher {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            cache: DashMap::new(),
        }
    }

    /// The layer at `url` in WGS 84, or `None` if it could not be loaded.
    pub async fn dataset_layer(&self, url: &str) -> Option<Arc<GeoLayer>> {
        if let Some(cached) = self.cache.get(url) {
            debug!("dataset cache hit for {url}");
            return cached.clone();
        }

        let layer = match fetch_layer(&self.http, url).await {
            Ok(layer) => Some(Arc::new(layer)),
            Err(e) => {
                warn!("dataset {url} unavailable: {e}");
                None
            }
        };
        self.cache.insert(url.to_string(), layer.clone());
        layer
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}
