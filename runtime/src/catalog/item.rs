//! Catalog item metadata as stored in `<id>.yml` files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::CatalogError;

/// One link attached to a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogLink {
    /// Free-form link type, usually a media type such as `text/html`.
    #[serde(rename = "type")]
    pub link_type: String,
    /// Target URL.
    pub url: String,
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CatalogLink {
    pub fn is_geojson(&self) -> bool {
        let t = self.link_type.to_lowercase();
        t.contains("geojson") || t.contains("geo+json")
    }
}

/// The subset of catalog metadata needed to build a thumbnail. Other fields
/// in the file are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Identifier; also the output file stem.
    pub id: String,
    /// Display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Country or region name to draw the boundary of.
    #[serde(rename = "country-region", default, skip_serializing_if = "Option::is_none")]
    pub country_region: Option<String>,
    /// Links in file order; the first GeoJSON one is the overlay.
    pub links: Vec<CatalogLink>,
}

impl CatalogItem {
    /// URL of the first link whose type mentions GeoJSON, either spelled
    /// `geojson` or as the `application/geo+json` media type.
    pub fn geojson_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.is_geojson())
            .map(|link| link.url.as_str())
    }

    /// The `country-region` field, ignoring blank values.
    pub fn region(&self) -> Option<&str> {
        self.country_region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Parse YAML. JSON documents parse too, being valid YAML.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml_ng::Error> {
        serde_yaml_ng::from_str(text)
    }

    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEM: &str = r#"
id: tl-health-facilities
name: Timor-Leste health facilities
description: Point locations of clinics
organization: Example Org
country-region: timor-leste
year-period: 2021
links:
  - type: text/html
    url: https://example.org/about
    description: About
  - type: application/geo+json
    url: https://example.org/facilities.geojson
  - type: geojson
    url: https://example.org/second.geojson
"#;

    #[test]
    fn test_parse_yaml() {
        let item = CatalogItem::from_yaml(ITEM).unwrap();
        assert_eq!(item.id, "tl-health-facilities");
        assert_eq!(item.region(), Some("timor-leste"));
        assert_eq!(item.links.len(), 3);
        assert_eq!(item.geojson_url(), Some("https://example.org/facilities.geojson"));
    }

    #[test]
    fn test_parse_json() {
        let item = CatalogItem::from_yaml(
            r#"{"id": "x2", "links": [{"type": "application/geo+json", "url": "http://example/data.geojson"}]}"#,
        )
        .unwrap();
        assert_eq!(item.region(), None);
        assert_eq!(item.geojson_url(), Some("http://example/data.geojson"));
    }

    #[test]
    fn test_geojson_link_types() {
        let link = |t: &str| CatalogLink {
            link_type: t.to_string(),
            url: "https://e/x".to_string(),
            description: None,
        };
        assert!(link("application/geo+json").is_geojson());
        assert!(link("GeoJSON").is_geojson());
        assert!(link("application/vnd.geo+json").is_geojson());
        assert!(!link("application/json").is_geojson());
        assert!(!link("text/csv").is_geojson());
    }

    #[test]
    fn test_links_required() {
        assert!(CatalogItem::from_yaml("id: x3\n").is_err());
    }

    #[test]
    fn test_blank_region_and_no_geojson() {
        let item = CatalogItem::from_yaml(
            "id: x4\ncountry-region: '  '\nlinks:\n  - type: text/csv\n    url: https://e/x.csv\n",
        )
        .unwrap();
        assert_eq!(item.region(), None);
        assert_eq!(item.geojson_url(), None);
    }
}
