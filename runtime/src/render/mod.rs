//! Map image rendering: basemap tiles underneath, vector layers on top.

pub mod basemap;
pub mod color;
pub mod composer;

pub use basemap::{Basemap, TileProvider};
pub use color::StrokeColor;
pub use composer::{CanvasSize, CrsPrecedence, ImageArgs, ImageComposer};

use crate::acquisition::http_client::FetchError;
use crate::geometry::GeometryError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors while composing or writing an image. No file is left behind
/// when any of these is returned.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no geometry to draw: at least one of boundary or overlay is required")]
    NoGeometry,
    #[error("image id '{0}' is not a valid file name")]
    InvalidId(String),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("basemap tile {url} unavailable: {source}")]
    Tile {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("basemap tile {url} could not be decoded: {source}")]
    TileDecode {
        url: String,
        #[source]
        source: image::ImageError,
    },
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
