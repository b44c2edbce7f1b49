//! Administrative boundaries from the geoBoundaries service.
//!
//! Resolution is two hops: region name → alpha-3 code → service request
//! that returns a `gjDownloadURL`, then the GeoJSON at that URL.

use super::datasets::fetch_layer;
use super::http_client::HttpClient;
use super::iso_codes::{CodeKind, CodeLookup};
use crate::geometry::GeoLayer;
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default geoBoundaries request endpoint.
pub const DEFAULT_BOUNDARY_URL: &str = "https://www.geoboundaries.org/gbRequest.html";

/// Field holding the GeoJSON download link in a service response.
const DOWNLOAD_FIELD: &str = "gjDownloadURL";

/// Administrative level such as `ADM0` (country) or `ADM1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdminLevel(String);

impl AdminLevel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AdminLevel {
    fn default() -> Self {
        AdminLevel("ADM0".to_string())
    }
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AdminLevel {
    type Err = String;

    /// Case-insensitive; a bare digit `n` means `ADMn`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        if upper.is_empty() {
            return Err("administrative level is empty".to_string());
        }
        if upper.chars().all(|c| c.is_ascii_digit()) {
            return Ok(AdminLevel(format!("ADM{upper}")));
        }
        if upper.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Ok(AdminLevel(upper));
        }
        Err(format!("invalid administrative level '{s}'"))
    }
}

type BoundaryKey = (String, AdminLevel);

/// Resolves region boundaries, memoizing both hops per (region, level).
///
/// Both caches keep misses, so a transient service failure stays a miss for
/// the rest of the run. Nothing is evicted.
pub struct BoundaryResolver {
    http: HttpClient,
    codes: Arc<CodeLookup>,
    service_url: String,
    urls: DashMap<BoundaryKey, Option<String>>,
    layers: DashMap<BoundaryKey, Option<Arc<GeoLayer>>>,
}

impl BoundaryResolver {
    pub fn new(http: HttpClient, codes: Arc<CodeLookup>, service_url: impl Into<String>) -> Self {
        Self {
            http,
            codes,
            service_url: service_url.into(),
            urls: DashMap::new(),
            layers: DashMap::new(),
        }
    }

    pub fn codes(&self) -> &CodeLookup {
        &self.codes
    }

    /// Download URL for the region's boundary at `level`, `None` if unresolved.
    pub async fn boundary_url(&self, region: &str, level: &AdminLevel) -> Option<String> {
        let key = (region.to_string(), level.clone());
        if let Some(cached) = self.urls.get(&key) {
            debug!("boundary URL cache hit for {region} {level}");
            return cached.clone();
        }

        let url = self.request_boundary_url(region, level).await;
        self.urls.insert(key, url.clone());
        url
    }

    async fn request_boundary_url(&self, region: &str, level: &AdminLevel) -> Option<String> {
        let iso = self.codes.code(region, CodeKind::Alpha3).await?;

        let request = match url::Url::parse_with_params(
            &self.service_url,
            &[("ISO", iso.as_str()), ("ADM", level.as_str())],
        ) {
            Ok(u) => u,
            Err(e) => {
                warn!("invalid boundary service URL {}: {e}", self.service_url);
                return None;
            }
        };

        let response = match self.http.get_json(request.as_str()).await {
            Ok(v) => v,
            Err(e) => {
                warn!("boundary service request for {region} ({iso} {level}) failed: {e}");
                return None;
            }
        };

        let url = extract_download_url(&response);
        if url.is_none() {
            warn!("boundary service returned no {DOWNLOAD_FIELD} for {region} ({iso} {level})");
        }
        url
    }

    /// The region's boundary layer in WGS 84, `None` if unavailable.
    pub async fn boundary_layer(&self, region: &str, level: &AdminLevel) -> Option<Arc<GeoLayer>> {
        let key = (region.to_string(), level.clone());
        if let Some(cached) = self.layers.get(&key) {
            debug!("boundary layer cache hit for {region} {level}");
            return cached.clone();
        }

        let layer = match self.boundary_url(region, level).await {
            Some(url) => match fetch_layer(&self.http, &url).await {
                Ok(layer) => Some(Arc::new(layer)),
                Err(e) => {
                    warn!("boundary geometry for {region} {level} unavailable: {e}");
                    None
                }
            },
            None => None,
        };
        self.layers.insert(key, layer.clone());
        layer
    }
}

/// `[0].gjDownloadURL` from a service response. A bare object is treated as
/// a one-element array.
fn extract_download_url(response: &Value) -> Option<String> {
    let first = match response {
        Value::Array(items) => items.first()?,
        Value::Object(_) => response,
        _ => return None,
    };
    first
        .get(DOWNLOAD_FIELD)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::iso_codes::{CodeTable, SAMPLE_CSV};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(service: &str) -> BoundaryResolver {
        let codes = CodeLookup::with_table(CodeTable::from_csv(SAMPLE_CSV).unwrap());
        BoundaryResolver::new(HttpClient::default(), Arc::new(codes), service)
    }

    #[test]
    fn test_admin_level_parse() {
        assert_eq!("adm1".parse::<AdminLevel>().unwrap().as_str(), "ADM1");
        assert_eq!("2".parse::<AdminLevel>().unwrap().as_str(), "ADM2");
        assert_eq!(AdminLevel::default().as_str(), "ADM0");
        assert!("".parse::<AdminLevel>().is_err());
        assert!("adm 1".parse::<AdminLevel>().is_err());
    }

    #[test]
    fn test_extract_download_url() {
        let arr = json!([{"gjDownloadURL": "https://x/a.geojson"}, {"gjDownloadURL": "https://x/b"}]);
        assert_eq!(extract_download_url(&arr).as_deref(), Some("https://x/a.geojson"));
        let obj = json!({"gjDownloadURL": "https://x/c.geojson"});
        assert_eq!(extract_download_url(&obj).as_deref(), Some("https://x/c.geojson"));
        assert_eq!(extract_download_url(&json!([])), None);
        assert_eq!(extract_download_url(&json!([{"other": 1}])), None);
        assert_eq!(extract_download_url(&Value::Null), None);
    }

    #[tokio::test]
    async fn test_url_memoized_single_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gbRequest.html"))
            .and(query_param("ISO", "KEN"))
            .and(query_param("ADM", "ADM1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"gjDownloadURL": "https://example/ken.geojson"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let r = resolver(&format!("{}/gbRequest.html", server.uri()));
        let level: AdminLevel = "adm1".parse().unwrap();
        let a = r.boundary_url("Kenya", &level).await;
        let b = r.boundary_url("Kenya", &level).await;
        assert_eq!(a.as_deref(), Some("https://example/ken.geojson"));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_unresolved_region_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let r = resolver(&server.uri());
        assert_eq!(r.boundary_url("atlantis", &AdminLevel::default()).await, None);
        assert!(r.boundary_layer("atlantis", &AdminLevel::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_service_failure_cached_as_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let r = resolver(&server.uri());
        assert_eq!(r.boundary_url("kenya", &AdminLevel::default()).await, None);
        assert_eq!(r.boundary_url("kenya", &AdminLevel::default()).await, None);
    }
}
