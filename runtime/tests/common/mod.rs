//! Shared fixtures: a stub server for the code table, the boundary service
//! and GeoJSON downloads, plus log capture.

#![allow(dead_code)]

use geothumb::config::Settings;
use geothumb::render::{CanvasSize, ImageArgs};
use std::io;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ISO_CSV: &str = "\
name,alpha-2,alpha-3,country-code,iso_3166-2,region,sub-region,intermediate-region,region-code,sub-region-code,intermediate-region-code
Kenya,KE,KEN,404,ISO 3166-2:KE,Africa,Sub-Saharan Africa,Eastern Africa,002,202,014
Timor-Leste,TL,TLS,626,ISO 3166-2:TL,Asia,South-eastern Asia,,142,035,
Viet Nam,VN,VNM,704,ISO 3166-2:VN,Asia,South-eastern Asia,,142,035,
";

/// Rough outline of Timor-Leste in WGS 84.
pub const TLS_BOUNDARY: &str = r#"{
  "type": "FeatureCollection",
  "features": [{
    "type": "Feature",
    "properties": {"shapeName": "Timor-Leste"},
    "geometry": {
      "type": "Polygon",
      "coordinates": [[[124.9, -9.4], [127.3, -8.3], [127.2, -8.5], [125.1, -9.5], [124.9, -9.4]]]
    }
  }]
}"#;

/// Three facilities near Dili.
pub const FACILITIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [125.57, -8.55]}},
    {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [126.0, -8.8]}},
    {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [125.3, -8.9]}}
  ]
}"#;

/// The same facilities in Web Mercator, tagged with the legacy `crs` member.
pub const FACILITIES_3857: &str = r#"{
  "type": "FeatureCollection",
  "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}},
  "features": [
    {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [13978388.46, -955333.87]}},
    {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [14026255.84, -983485.83]}},
    {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [13948332.20, -994751.90]}}
  ]
}"#;

pub const EMPTY_COLLECTION: &str = r#"{"type": "FeatureCollection", "features": []}"#;

/// Stub server with the code table mounted at `/codes.csv`.
pub async fn stub_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/codes.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ISO_CSV))
        .mount(&server)
        .await;
    server
}

/// Mount the boundary service for `iso` at ADM0, pointing at `/boundaries/<iso>.geojson`,
/// and the GeoJSON itself. Each hop must be called exactly `calls` times.
pub async fn mount_boundary(server: &MockServer, iso: &str, geojson: &str, calls: u64) {
    let download = format!("{}/boundaries/{iso}.geojson", server.uri());
    Mock::given(method("GET"))
        .and(path("/gbRequest.html"))
        .and(query_param("ISO", iso))
        .and(query_param("ADM", "ADM0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"boundaryISO": iso, "gjDownloadURL": download}])),
        )
        .expect(calls)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/boundaries/{iso}.geojson")))
        .respond_with(ResponseTemplate::new(200).set_body_string(geojson.to_string()))
        .expect(calls)
        .mount(server)
        .await;
}

/// Mount a GeoJSON document at `route`, expected `calls` times.
pub async fn mount_geojson(server: &MockServer, route: &str, geojson: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(geojson.to_string()))
        .expect(calls)
        .mount(server)
        .await;
}

/// Settings pointing every endpoint at the stub server, without a basemap.
pub fn settings_for(server: &MockServer) -> Settings {
    Settings {
        iso_csv_url: format!("{}/codes.csv", server.uri()),
        boundary_url: format!("{}/gbRequest.html", server.uri()),
        tile_url: None,
        ..Settings::default()
    }
}

/// A small canvas keeps the tests quick.
pub fn small_args() -> ImageArgs {
    ImageArgs {
        size: CanvasSize {
            width: 4.0,
            height: 3.0,
        },
        dpi: 50,
        ..ImageArgs::default()
    }
}

/// Log lines written while the returned guard is alive.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Install a thread-local subscriber writing into this buffer.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
