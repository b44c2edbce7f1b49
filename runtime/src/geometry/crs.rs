//! Coordinate reference system identification.
//!
//! Layers carry an EPSG code. Only codes with a known proj4 definition can
//! be reprojected; everything else is rejected at parse time.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::GeometryError;

/// An EPSG-coded coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs(u32);

impl Crs {
    /// WGS 84 geographic, longitude/latitude in degrees.
    pub const WGS84: Crs = Crs(4326);
    /// Spherical Web Mercator used by slippy-map tiles.
    pub const WEB_MERCATOR: Crs = Crs(3857);

    /// Build from an EPSG code, rejecting codes without a definition.
    pub fn from_epsg(code: u32) -> Result<Self, GeometryError> {
        let crs = Crs(code);
        if crs.proj_string().is_none() {
            return Err(GeometryError::UnsupportedCrs(format!("EPSG:{code}")));
        }
        Ok(crs)
    }

    pub fn epsg(&self) -> u32 {
        self.0
    }

    /// Angular units (degrees) rather than metres.
    pub fn is_geographic(&self) -> bool {
        matches!(self.0, 4326 | 4258 | 4269)
    }

    /// proj4 definition, if this code is known.
    pub fn proj_string(&self) -> Option<String> {
        let def = match self.0 {
            4326 => "+proj=longlat +datum=WGS84 +no_defs".to_string(),
            4258 | 4269 => "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs".to_string(),
            3857 | 900913 => {
                "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs"
                    .to_string()
            }
            3035 => "+proj=laea +lat_0=52 +lon_0=10 +x_0=4321000 +y_0=3210000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs"
                .to_string(),
            32601..=32660 => format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs", self.0 - 32600),
            32701..=32760 => format!(
                "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
                self.0 - 32700
            ),
            _ => return None,
        };
        Some(def)
    }

    /// Read the legacy GeoJSON `crs` member. A missing member means WGS 84.
    pub fn from_geojson_member(member: Option<&Value>) -> Result<Self, GeometryError> {
        let Some(member) = member else {
            return Ok(Crs::WGS84);
        };
        let name = member
            .get("properties")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| GeometryError::UnsupportedCrs(member.to_string()))?;
        name.parse()
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::WGS84
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for Crs {
    type Err = GeometryError;

    /// Accepts `EPSG:n`, `urn:ogc:def:crs:EPSG::n`, `urn:ogc:def:crs:EPSG:6.6:n`
    /// and the OGC `CRS84` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let upper = name.to_uppercase();
        if upper.ends_with("CRS84") {
            return Ok(Crs::WGS84);
        }
        if upper.contains("EPSG") {
            let code = upper
                .rsplit(':')
                .next()
                .and_then(|c| c.parse::<u32>().ok())
                .ok_or_else(|| GeometryError::UnsupportedCrs(name.to_string()))?;
            return Crs::from_epsg(code);
        }
        Err(GeometryError::UnsupportedCrs(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_names() {
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::WGS84);
        assert_eq!("urn:ogc:def:crs:EPSG::3857".parse::<Crs>().unwrap(), Crs::WEB_MERCATOR);
        assert_eq!("urn:ogc:def:crs:OGC:1.3:CRS84".parse::<Crs>().unwrap(), Crs::WGS84);
        assert_eq!("epsg:32633".parse::<Crs>().unwrap().epsg(), 32633);
        assert!("EPSG:2193".parse::<Crs>().is_err());
        assert!("WGS84".parse::<Crs>().is_err());
    }

    #[test]
    fn test_geojson_member() {
        assert_eq!(Crs::from_geojson_member(None).unwrap(), Crs::WGS84);
        let member = json!({"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}});
        assert_eq!(Crs::from_geojson_member(Some(&member)).unwrap(), Crs::WEB_MERCATOR);
        let bad = json!({"type": "link", "properties": {"href": "x"}});
        assert!(Crs::from_geojson_member(Some(&bad)).is_err());
    }

    #[test]
    fn test_utm_definitions() {
        let north = Crs::from_epsg(32633).unwrap().proj_string().unwrap();
        assert!(north.contains("+zone=33") && !north.contains("+south"));
        let south = Crs::from_epsg(32755).unwrap().proj_string().unwrap();
        assert!(south.contains("+zone=55") && south.contains("+south"));
        assert!(!Crs::from_epsg(32633).unwrap().is_geographic());
    }
}
