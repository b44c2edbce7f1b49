//! Sequential runs over a catalog directory.

use super::driver::{ItemStatus, SkipReason, ThumbnailGenerator};
use super::item::CatalogItem;
use super::CatalogError;
use crate::render::ImageArgs;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const CATALOG_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// A catalog file that could be read, or the reason it could not.
#[derive(Debug)]
pub struct CatalogEntry {
    /// File the entry was read from.
    pub path: PathBuf,
    /// Parsed item, or why it could not be read.
    pub item: Result<CatalogItem, CatalogError>,
}

/// Expand `paths` into catalog entries. Directories contribute their
/// `.yml`/`.yaml`/`.json` files (not recursive), sorted by name.
pub fn load_catalog(paths: &[PathBuf]) -> Result<Vec<CatalogEntry>, CatalogError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|source| CatalogError::Read {
                path: path.clone(),
                source,
            })?;
            let mut found: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_file() && is_catalog_file(p))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    Ok(files
        .into_iter()
        .map(|path| {
            let item = CatalogItem::load(&path);
            CatalogEntry { path, item }
        })
        .collect())
}

fn is_catalog_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CATALOG_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

/// A failed item and its error message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    /// Item id, or the file path when the file could not be parsed.
    pub source: String,
    /// Rendered error.
    pub message: String,
}

/// Totals for one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Written image paths, in run order.
    pub generated: Vec<PathBuf>,
    /// Ids of items that produced no image.
    pub skipped: Vec<String>,
    /// Unreadable files and rendering errors.
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.generated.len() + self.skipped.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Generate a thumbnail for every entry, one at a time. Unreadable files and
/// rendering errors are recorded and the run continues.
pub async fn run_batch(
    generator: &ThumbnailGenerator,
    entries: Vec<CatalogEntry>,
    args: &ImageArgs,
    output_dir: &Path,
) -> Result<BatchReport, CatalogError> {
    std::fs::create_dir_all(output_dir).map_err(|source| CatalogError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut report = BatchReport::default();
    for entry in entries {
        let item = match entry.item {
            Ok(item) => item,
            Err(e) => {
                error!("{e}");
                report.failed.push(BatchFailure {
                    source: entry.path.display().to_string(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        match generator.generate_catalog_item_image(&item, args, output_dir).await {
            Ok(ItemStatus::Generated(path)) => report.generated.push(path),
            Ok(ItemStatus::Skipped(reason)) => {
                let why = match reason {
                    SkipReason::NoInputs => "no inputs",
                    SkipReason::NoGeometry => "no geometry",
                };
                info!("skipped {} ({why})", item.id);
                report.skipped.push(item.id);
            }
            Err(e) => {
                error!("rendering {} failed: {e}", item.id);
                report.failed.push(BatchFailure {
                    source: item.id,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        "batch complete: {} generated, {} skipped, {} failed",
        report.generated.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(report)
}
