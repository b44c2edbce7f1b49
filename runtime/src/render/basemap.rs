//! XYZ slippy-map basemap in Web Mercator.

use super::RenderError;
use crate::acquisition::http_client::HttpClient;
use crate::geometry::{Bounds, Coord};
use dashmap::DashMap;
use image::{Rgb, RgbImage};
use std::sync::Arc;
use tracing::debug;

/// Default tile source.
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Pixel edge length of one tile.
pub const TILE_SIZE: u32 = 256;

/// Upper bound on tiles fetched for one image; zoom is lowered to fit.
pub const MAX_TILES: usize = 64;

/// Half the equatorial circumference of the Web Mercator sphere, in metres.
pub const HALF_CIRCUMFERENCE: f64 = 20_037_508.342_789_244;

/// Latitude limit of the Web Mercator square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Background colour where no tile covers the canvas.
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Longitude/latitude in degrees to Web Mercator metres. Latitude is clamped
/// to the square so polar coordinates stay finite.
pub fn lon_lat_to_mercator(c: Coord) -> Coord {
    let lat = c.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = c.x.to_radians() * 6_378_137.0;
    let y = (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln() * 6_378_137.0;
    Coord::new(x, y)
}

/// A tile server URL template with `{z}`, `{x}` and `{y}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct TileProvider {
    pub url_template: String,
    pub max_zoom: u8,
}

impl TileProvider {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            max_zoom: 19,
        }
    }

    pub fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

impl Default for TileProvider {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_URL)
    }
}

/// The extent in global pixel coordinates at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PixelWindow {
    zoom: u8,
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl PixelWindow {
    fn new(extent: &Bounds, zoom: u8) -> Self {
        let world = f64::from(TILE_SIZE) * 2f64.powi(i32::from(zoom));
        let to_px = |m: f64| (m + HALF_CIRCUMFERENCE) / (2.0 * HALF_CIRCUMFERENCE) * world;
        let to_py = |m: f64| (HALF_CIRCUMFERENCE - m) / (2.0 * HALF_CIRCUMFERENCE) * world;
        Self {
            zoom,
            left: to_px(extent.min_x),
            right: to_px(extent.max_x),
            top: to_py(extent.max_y),
            bottom: to_py(extent.min_y),
        }
    }

    /// Inclusive tile index ranges clamped to the world.
    fn tile_range(&self) -> ((u32, u32), (u32, u32)) {
        let last = (1u32 << self.zoom) - 1;
        let size = f64::from(TILE_SIZE);
        let clamp = |v: f64| (v / size).floor().clamp(0.0, f64::from(last)) as u32;
        (
            (clamp(self.left), clamp(self.right - 1e-9)),
            (clamp(self.top), clamp(self.bottom - 1e-9)),
        )
    }

    fn tile_count(&self) -> usize {
        let ((x0, x1), (y0, y1)) = self.tile_range();
        ((x1 - x0 + 1) as usize) * ((y1 - y0 + 1) as usize)
    }
}

/// Choose the zoom whose native resolution covers `width` pixels across
/// `extent`, lowered until at most [`MAX_TILES`] tiles are needed.
fn choose_zoom(extent: &Bounds, width: u32, max_zoom: u8) -> u8 {
    let px_per_metre = f64::from(width) / extent.width().max(f64::EPSILON);
    let ideal = (px_per_metre * 2.0 * HALF_CIRCUMFERENCE / f64::from(TILE_SIZE)).log2();
    // Tolerate float noise at exact powers of two.
    let ideal = (ideal - 1e-9).ceil();
    let mut zoom = ideal.clamp(0.0, f64::from(max_zoom)) as u8;
    while zoom > 0 && PixelWindow::new(extent, zoom).tile_count() > MAX_TILES {
        zoom -= 1;
    }
    zoom
}

type TileKey = (u8, u32, u32);

/// Fetches tiles and resamples them onto a canvas.
///
/// Decoded tiles are memoized per `(z, x, y)` for the life of the basemap.
/// Failed fetches are not cached.
pub struct Basemap {
    http: HttpClient,
    provider: TileProvider,
    tiles: DashMap<TileKey, Arc<RgbImage>>,
}

impl Basemap {
    pub fn new(http: HttpClient, provider: TileProvider) -> Self {
        Self {
            http,
            provider,
            tiles: DashMap::new(),
        }
    }

    /// Number of tiles held in the cache.
    pub fn cached_tiles(&self) -> usize {
        self.tiles.len()
    }

    async fn tile(&self, key: TileKey) -> Result<Arc<RgbImage>, RenderError> {
        if let Some(cached) = self.tiles.get(&key) {
            return Ok(Arc::clone(&cached));
        }

        let (z, x, y) = key;
        let url = self.provider.tile_url(z, x, y);
        let bytes = self
            .http
            .get_bytes(&url)
            .await
            .map_err(|source| RenderError::Tile { url: url.clone(), source })?;
        let tile = image::load_from_memory(&bytes)
            .map_err(|source| RenderError::TileDecode { url, source })?
            .to_rgb8();
        let tile = Arc::new(tile);
        self.tiles.insert(key, Arc::clone(&tile));
        Ok(tile)
    }

    pub fn provider(&self) -> &TileProvider {
        &self.provider
    }

    /// Render `extent` (Web Mercator metres) into a `width`×`height` image.
    pub async fn render(&self, extent: &Bounds, width: u32, height: u32) -> Result<RgbImage, RenderError> {
        let zoom = choose_zoom(extent, width, self.provider.max_zoom);
        let window = PixelWindow::new(extent, zoom);
        let ((x0, x1), (y0, y1)) = window.tile_range();
        debug!(
            "basemap zoom {zoom}: tiles x {x0}..={x1}, y {y0}..={y1} ({} total)",
            window.tile_count()
        );

        let mut mosaic = RgbImage::from_pixel(
            (x1 - x0 + 1) * TILE_SIZE,
            (y1 - y0 + 1) * TILE_SIZE,
            BACKGROUND,
        );
        for ty in y0..=y1 {
            for tx in x0..=x1 {
                let tile = self.tile((zoom, tx, ty)).await?;
                image::imageops::replace(
                    &mut mosaic,
                    &*tile,
                    i64::from((tx - x0) * TILE_SIZE),
                    i64::from((ty - y0) * TILE_SIZE),
                );
            }
        }

        Ok(resample(&mosaic, &window, (x0, y0), width, height))
    }
}

/// Nearest-neighbour sample of the window out of the mosaic. Pixels outside
/// the mosaic (beyond the Mercator square) stay background.
fn resample(mosaic: &RgbImage, window: &PixelWindow, origin_tile: (u32, u32), width: u32, height: u32) -> RgbImage {
    let origin_x = f64::from(origin_tile.0 * TILE_SIZE);
    let origin_y = f64::from(origin_tile.1 * TILE_SIZE);
    let span_x = window.right - window.left;
    let span_y = window.bottom - window.top;

    RgbImage::from_fn(width, height, |i, j| {
        let gx = window.left + (f64::from(i) + 0.5) / f64::from(width) * span_x;
        let gy = window.top + (f64::from(j) + 0.5) / f64::from(height) * span_y;
        let mx = (gx - origin_x).floor();
        let my = (gy - origin_y).floor();
        if mx < 0.0 || my < 0.0 || mx >= f64::from(mosaic.width()) || my >= f64::from(mosaic.height()) {
            return BACKGROUND;
        }
        *mosaic.get_pixel(mx as u32, my as u32)
    })
}
