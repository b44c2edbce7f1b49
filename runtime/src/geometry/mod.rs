//! Geometry model: coordinates, layers, CRS handling and reprojection.

pub mod crs;
pub mod layer;
pub mod reproject;

pub use crs::Crs;
pub use layer::{GeoLayer, Shape};
pub use reproject::Reprojector;

use thiserror::Error;

/// Errors parsing or transforming geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("invalid GeoJSON: {0}")]
    Parse(String),
    #[error("unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),
    #[error("reprojection failed: {0}")]
    Projection(String),
}

/// A 2D coordinate. For geographic systems `x` is longitude, `y` latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_coord(c: Coord) -> Self {
        Self {
            min_x: c.x,
            min_y: c.y,
            max_x: c.x,
            max_y: c.y,
        }
    }

    pub fn extend(&mut self, c: Coord) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Grow each side by `fraction` of the extent, with at least `min_span`
    /// on each axis so points and straight lines still get an area.
    pub fn padded(&self, fraction: f64, min_span: f64) -> Bounds {
        let pad_x = (self.width() * fraction).max((min_span - self.width()).max(0.0) / 2.0);
        let pad_y = (self.height() * fraction).max((min_span - self.height()).max(0.0) / 2.0);
        Bounds {
            min_x: self.min_x - pad_x,
            min_y: self.min_y - pad_y,
            max_x: self.max_x + pad_x,
            max_y: self.max_y + pad_y,
        }
    }
}
