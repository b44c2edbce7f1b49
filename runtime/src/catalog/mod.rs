//! Catalog items, per-item thumbnail generation and batch runs.

pub mod batch;
pub mod driver;
pub mod item;

pub use batch::{load_catalog, run_batch, BatchReport, CatalogEntry};
pub use driver::{ItemStatus, SkipReason, ThumbnailGenerator};
pub use item::{CatalogItem, CatalogLink};

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading catalog files or creating the output directory.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
    #[error("could not create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
