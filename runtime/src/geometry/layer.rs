//! Vector layers parsed from GeoJSON.

use geojson::GeoJson;
use serde_json::Value as JsonValue;

use super::reproject::Reprojector;
use super::{Bounds, Coord, Crs, GeometryError};

/// One drawable primitive. Multi-geometries are flattened into several shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Coord),
    Line(Vec<Coord>),
    /// Exterior ring followed by any holes.
    Polygon(Vec<Vec<Coord>>),
}

impl Shape {
    fn coords(&self) -> Box<dyn Iterator<Item = &Coord> + '_> {
        match self {
            Shape::Point(c) => Box::new(std::iter::once(c)),
            Shape::Line(line) => Box::new(line.iter()),
            Shape::Polygon(rings) => Box::new(rings.iter().flatten()),
        }
    }

    fn map_coords<F>(&self, f: &mut F) -> Result<Shape, GeometryError>
    where
        F: FnMut(Coord) -> Result<Coord, GeometryError>,
    {
        Ok(match self {
            Shape::Point(c) => Shape::Point(f(*c)?),
            Shape::Line(line) => Shape::Line(line.iter().map(|c| f(*c)).collect::<Result<_, _>>()?),
            Shape::Polygon(rings) => Shape::Polygon(
                rings
                    .iter()
                    .map(|ring| ring.iter().map(|c| f(*c)).collect::<Result<Vec<_>, _>>())
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

/// A set of shapes in a single coordinate reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLayer {
    pub crs: Crs,
    pub shapes: Vec<Shape>,
}

impl GeoLayer {
    pub fn new(crs: Crs, shapes: Vec<Shape>) -> Self {
        Self { crs, shapes }
    }

    /// Parse a FeatureCollection, Feature or bare Geometry document.
    ///
    /// The CRS comes from the legacy top-level `crs` member when present and
    /// defaults to WGS 84 otherwise.
    pub fn from_geojson(text: &str) -> Result<Self, GeometryError> {
        let doc: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| GeometryError::Parse(e.to_string()))?;

        let mut shapes = Vec::new();
        let crs = match &doc {
            GeoJson::FeatureCollection(fc) => {
                for feature in &fc.features {
                    if let Some(geometry) = &feature.geometry {
                        flatten(&geometry.value, &mut shapes);
                    }
                }
                Crs::from_geojson_member(crs_member(fc.foreign_members.as_ref()))?
            }
            GeoJson::Feature(feature) => {
                if let Some(geometry) = &feature.geometry {
                    flatten(&geometry.value, &mut shapes);
                }
                Crs::from_geojson_member(crs_member(feature.foreign_members.as_ref()))?
            }
            GeoJson::Geometry(geometry) => {
                flatten(&geometry.value, &mut shapes);
                Crs::from_geojson_member(crs_member(geometry.foreign_members.as_ref()))?
            }
        };

        Ok(Self { crs, shapes })
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn coord_count(&self) -> usize {
        self.shapes.iter().map(|s| s.coords().count()).sum()
    }

    /// Bounding rectangle of every coordinate, `None` for an empty layer.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut coords = self.shapes.iter().flat_map(|s| s.coords());
        let first = coords.next()?;
        let mut bounds = Bounds::from_coord(*first);
        for c in coords {
            bounds.extend(*c);
        }
        Some(bounds)
    }

    /// A copy of this layer expressed in `target`.
    pub fn to_crs(&self, target: Crs) -> Result<GeoLayer, GeometryError> {
        let reprojector = Reprojector::new(self.crs, target)?;
        if reprojector.is_identity() {
            return Ok(self.clone());
        }
        let mut f = |c: Coord| reprojector.transform(c);
        let shapes = self
            .shapes
            .iter()
            .map(|s| s.map_coords(&mut f))
            .collect::<Result<_, _>>()?;
        Ok(GeoLayer { crs: target, shapes })
    }
}

fn crs_member(members: Option<&serde_json::Map<String, JsonValue>>) -> Option<&JsonValue> {
    members.and_then(|m| m.get("crs")).filter(|v| !v.is_null())
}

fn to_coord(position: &[f64]) -> Option<Coord> {
    match position {
        [x, y, ..] => Some(Coord::new(*x, *y)),
        _ => None,
    }
}

fn to_ring(positions: &[Vec<f64>]) -> Vec<Coord> {
    positions.iter().filter_map(|p| to_coord(p)).collect()
}

fn flatten(value: &geojson::Value, out: &mut Vec<Shape>) {
    use geojson::Value;

    match value {
        Value::Point(p) => out.extend(to_coord(p).map(Shape::Point)),
        Value::MultiPoint(points) => {
            out.extend(points.iter().filter_map(|p| to_coord(p)).map(Shape::Point))
        }
        Value::LineString(line) => push_line(to_ring(line), out),
        Value::MultiLineString(lines) => {
            for line in lines {
                push_line(to_ring(line), out);
            }
        }
        Value::Polygon(rings) => push_polygon(rings, out),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                push_polygon(rings, out);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                flatten(&g.value, out);
            }
        }
    }
}

fn push_line(line: Vec<Coord>, out: &mut Vec<Shape>) {
    if !line.is_empty() {
        out.push(Shape::Line(line));
    }
}

fn push_polygon(rings: &[Vec<Vec<f64>>], out: &mut Vec<Shape>) {
    let rings: Vec<Vec<Coord>> = rings
        .iter()
        .map(|r| to_ring(r))
        .filter(|r| !r.is_empty())
        .collect();
    if !rings.is_empty() {
        out.push(Shape::Polygon(rings));
    }
}
