//! Per-item thumbnail generation.

use crate::acquisition::boundaries::{AdminLevel, BoundaryResolver};
use crate::acquisition::datasets::DatasetFetcher;
use crate::acquisition::http_client::HttpClient;
use crate::acquisition::iso_codes::CodeLookup;
use crate::config::Settings;
use crate::render::{Basemap, ImageArgs, ImageComposer, RenderError, TileProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::item::CatalogItem;

/// Why an item produced no image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither a region nor a GeoJSON link.
    NoInputs,
    /// Inputs were present but no geometry could be fetched.
    NoGeometry,
}

/// Outcome of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Generated(PathBuf),
    Skipped(SkipReason),
}

impl ItemStatus {
    /// Conventional status code: 0 for an image, 1 for a skipped item.
    pub fn code(&self) -> i32 {
        match self {
            ItemStatus::Generated(_) => 0,
            ItemStatus::Skipped(_) => 1,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, ItemStatus::Generated(_))
    }
}

/// Owns the resolvers, their caches and the composer for one run.
pub struct ThumbnailGenerator {
    boundaries: BoundaryResolver,
    datasets: DatasetFetcher,
    composer: ImageComposer,
    admin_level: AdminLevel,
}

impl ThumbnailGenerator {
    pub fn new(
        boundaries: BoundaryResolver,
        datasets: DatasetFetcher,
        composer: ImageComposer,
        admin_level: AdminLevel,
    ) -> Self {
        Self {
            boundaries,
            datasets,
            composer,
            admin_level,
        }
    }

    /// Wire every component from settings, sharing one HTTP client.
    pub fn from_settings(settings: &Settings) -> Result<Self, crate::acquisition::http_client::FetchError> {
        let http = HttpClient::new(&settings.user_agent, settings.http_timeout)?;
        let codes = Arc::new(CodeLookup::new(http.clone(), settings.iso_csv_url.clone()));
        let boundaries = BoundaryResolver::new(http.clone(), codes, settings.boundary_url.clone());
        let datasets = DatasetFetcher::new(http.clone());
        let basemap = settings
            .tile_url
            .as_ref()
            .map(|template| Basemap::new(http, TileProvider::new(template.clone())));
        Ok(Self::new(
            boundaries,
            datasets,
            ImageComposer::new(basemap),
            settings.admin_level.clone(),
        ))
    }

    pub fn boundaries(&self) -> &BoundaryResolver {
        &self.boundaries
    }

    pub fn admin_level(&self) -> &AdminLevel {
        &self.admin_level
    }

    /// Build `<output_dir>/<id>.png` for one catalog item.
    ///
    /// Missing inputs or unavailable geometry are a `Skipped` status with a
    /// warning; only rendering failures are errors.
    pub async fn generate_catalog_item_image(
        &self,
        item: &CatalogItem,
        args: &ImageArgs,
        output_dir: &Path,
    ) -> Result<ItemStatus, RenderError> {
        let data_url = item.geojson_url();
        let region = item.region();
        let id = &item.id;

        if data_url.is_none() && region.is_none() {
            warn!(
                "catalog file {id}.yml has no country-region and no geojson link to generate an image from"
            );
            return Ok(ItemStatus::Skipped(SkipReason::NoInputs));
        }

        let overlay = match data_url {
            Some(url) => self.datasets.dataset_layer(url).await,
            None => None,
        };
        let boundary = match region {
            Some(region) => self.boundaries.boundary_layer(region, &self.admin_level).await,
            None => None,
        };

        if overlay.is_none() && boundary.is_none() {
            warn!(
                "catalog file {id}.yml: no admin boundary or geojson dataset could be loaded to generate an image from"
            );
            return Ok(ItemStatus::Skipped(SkipReason::NoGeometry));
        }

        debug!(
            "{id}: boundary={} overlay={}",
            boundary.is_some(),
            overlay.is_some()
        );
        let path = self
            .composer
            .make_image(id, boundary.as_deref(), overlay.as_deref(), args, output_dir)
            .await?;
        Ok(ItemStatus::Generated(path))
    }
}
