//! Coordinate transforms between EPSG systems, backed by proj4rs.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::{Coord, Crs, GeometryError};

/// Transforms coordinates from one CRS to another.
///
/// proj4rs works in radians for geographic systems; callers always pass and
/// receive degrees.
pub struct Reprojector {
    from: Crs,
    to: Crs,
    projs: Option<(Proj, Proj)>,
}

impl Reprojector {
    pub fn new(from: Crs, to: Crs) -> Result<Self, GeometryError> {
        if from == to {
            return Ok(Self { from, to, projs: None });
        }
        let src = build_proj(from)?;
        let dst = build_proj(to)?;
        Ok(Self {
            from,
            to,
            projs: Some((src, dst)),
        })
    }

    pub fn is_identity(&self) -> bool {
        self.projs.is_none()
    }

    pub fn transform(&self, coord: Coord) -> Result<Coord, GeometryError> {
        let Some((src, dst)) = &self.projs else {
            return Ok(coord);
        };

        let mut point = if self.from.is_geographic() {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };

        transform(src, dst, &mut point).map_err(|e| {
            GeometryError::Projection(format!("{} -> {}: {e}", self.from, self.to))
        })?;

        let out = if self.to.is_geographic() {
            Coord::new(point.0.to_degrees(), point.1.to_degrees())
        } else {
            Coord::new(point.0, point.1)
        };

        if !out.x.is_finite() || !out.y.is_finite() {
            return Err(GeometryError::Projection(format!(
                "{} -> {}: ({}, {}) is outside the projection domain",
                self.from, self.to, coord.x, coord.y
            )));
        }
        Ok(out)
    }
}

fn build_proj(crs: Crs) -> Result<Proj, GeometryError> {
    let def = crs
        .proj_string()
        .ok_or_else(|| GeometryError::UnsupportedCrs(crs.to_string()))?;
    Proj::from_proj_string(&def).map_err(|e| GeometryError::Projection(format!("{crs}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_EQUATOR: f64 = 20_037_508.342_789_244;

    #[test]
    fn test_identity() {
        let r = Reprojector::new(Crs::WGS84, Crs::WGS84).unwrap();
        assert!(r.is_identity());
        let c = Coord::new(12.5, -8.25);
        assert_eq!(r.transform(c).unwrap(), c);
    }

    #[test]
    fn test_mercator_to_wgs84() {
        let r = Reprojector::new(Crs::WEB_MERCATOR, Crs::WGS84).unwrap();
        let c = r.transform(Coord::new(HALF_EQUATOR / 18.0, 0.0)).unwrap();
        assert!((c.x - 10.0).abs() < 1e-6, "lon was {}", c.x);
        assert!(c.y.abs() < 1e-6, "lat was {}", c.y);
    }

    #[test]
    fn test_wgs84_to_mercator_round_trip() {
        let fwd = Reprojector::new(Crs::WGS84, Crs::WEB_MERCATOR).unwrap();
        let back = Reprojector::new(Crs::WEB_MERCATOR, Crs::WGS84).unwrap();
        let original = Coord::new(125.7, -8.9);
        let merc = fwd.transform(original).unwrap();
        assert!(merc.x > 1.3e7 && merc.y < 0.0);
        let restored = back.transform(merc).unwrap();
        assert!((restored.x - original.x).abs() < 1e-6);
        assert!((restored.y - original.y).abs() < 1e-6);
    }

    #[test]
    fn test_utm_to_wgs84() {
        // Central meridian of zone 33N at the equator.
        let r = Reprojector::new(Crs::from_epsg(32633).unwrap(), Crs::WGS84).unwrap();
        let c = r.transform(Coord::new(500_000.0, 0.0)).unwrap();
        assert!((c.x - 15.0).abs() < 1e-6);
        assert!(c.y.abs() < 1e-6);
    }
}
