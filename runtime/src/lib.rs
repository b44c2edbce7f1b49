//! Geothumb: thumbnail images for data catalog entries.
//!
//! Each catalog item names a country/region, links to a GeoJSON dataset, or
//! both. The region is resolved to an ISO-3166 code and then to its
//! administrative boundary; the dataset is fetched as an overlay. Both are
//! drawn over a web-mercator basemap and written to `<output_dir>/<id>.png`.

pub mod acquisition;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod geometry;
pub mod render;

pub use catalog::{ItemStatus, SkipReason, ThumbnailGenerator};
pub use config::Settings;
