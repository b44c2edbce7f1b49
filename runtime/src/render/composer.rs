//! Compose boundary and overlay layers over a basemap and write a PNG.

use super::basemap::{lon_lat_to_mercator, Basemap, BACKGROUND};
use super::color::StrokeColor;
use super::RenderError;
use crate::geometry::{Bounds, Coord, Crs, GeoLayer, Shape};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Edge opacity of the boundary layer.
pub const BOUNDARY_ALPHA: f64 = 0.85;
/// Edge opacity of the overlay layer.
pub const OVERLAY_ALPHA: f64 = 0.25;

/// Minimum extent (metres) on each axis so points still get a visible area.
const MIN_SPAN_METRES: f64 = 2_000.0;
/// Margin around the data, as a fraction of its extent.
const PADDING: f64 = 0.02;
const STROKE_WIDTH: u32 = 2;
const POINT_RADIUS: i32 = 4;

/// Canvas size in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    /// Width in inches.
    pub width: f64,
    /// Height in inches.
    pub height: f64,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 17.0,
            height: 12.0,
        }
    }
}

impl fmt::Display for CanvasSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for CanvasSize {
    type Err = String;

    /// `WxH` or `W,H` in inches, e.g. `17x12`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X', ','])
            .ok_or_else(|| format!("canvas size '{s}' must look like 17x12"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && *n > 0.0)
                .ok_or_else(|| format!("invalid canvas dimension '{v}'"))
        };
        Ok(Self {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

/// Which layer's CRS is reported as the image's reference CRS when both are
/// present.
///
/// `Overlay` reproduces the historical behaviour where the layer drawn last
/// wins. If the preferred layer is missing the other one is used. Every layer
/// is projected from its own CRS straight onto the Web Mercator basemap, so
/// the choice does not change the pixels; fetched layers are all WGS 84
/// anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrsPrecedence {
    #[default]
    Overlay,
    Boundary,
}

impl CrsPrecedence {
    pub fn reference_crs(&self, boundary: Option<&GeoLayer>, overlay: Option<&GeoLayer>) -> Option<Crs> {
        let (preferred, fallback) = match self {
            CrsPrecedence::Overlay => (overlay, boundary),
            CrsPrecedence::Boundary => (boundary, overlay),
        };
        preferred.or(fallback).map(|layer| layer.crs)
    }
}

impl fmt::Display for CrsPrecedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CrsPrecedence::Overlay => "overlay",
            CrsPrecedence::Boundary => "boundary",
        })
    }
}

impl FromStr for CrsPrecedence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overlay" | "data" => Ok(CrsPrecedence::Overlay),
            "boundary" | "admin" => Ok(CrsPrecedence::Boundary),
            other => Err(format!("unknown CRS precedence '{other}' (expected overlay or boundary)")),
        }
    }
}

/// Per-image drawing options.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageArgs {
    /// Maximum canvas size in inches.
    pub size: CanvasSize,
    /// Pixels per inch.
    pub dpi: u32,
    /// Edge colour of the boundary layer.
    pub boundary_color: StrokeColor,
    /// Edge colour of the overlay layer.
    pub overlay_color: StrokeColor,
    /// Which layer names the reference CRS.
    pub crs_precedence: CrsPrecedence,
}

impl Default for ImageArgs {
    fn default() -> Self {
        Self {
            size: CanvasSize::default(),
            dpi: 100,
            boundary_color: StrokeColor::BLUE,
            overlay_color: StrokeColor::RED,
            crs_precedence: CrsPrecedence::default(),
        }
    }
}

impl ImageArgs {
    /// Maximum canvas in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = f64::from(self.dpi.max(1));
        (
            ((self.size.width * dpi).round() as u32).max(1),
            ((self.size.height * dpi).round() as u32).max(1),
        )
    }
}

/// Maps Web Mercator metres onto canvas pixels.
#[derive(Debug, Clone, Copy)]
struct Viewport {
    extent: Bounds,
    scale: f64,
    width: u32,
    height: u32,
}

impl Viewport {
    /// Fit `extent` inside `max` pixels, preserving aspect, cropped tight.
    fn fit(extent: Bounds, max: (u32, u32)) -> Self {
        let scale = (f64::from(max.0) / extent.width()).min(f64::from(max.1) / extent.height());
        Self {
            extent,
            scale,
            width: ((extent.width() * scale).round() as u32).clamp(1, max.0),
            height: ((extent.height() * scale).round() as u32).clamp(1, max.1),
        }
    }

    fn to_pixel(&self, c: Coord) -> (i32, i32) {
        (
            ((c.x - self.extent.min_x) * self.scale).round() as i32,
            ((self.extent.max_y - c.y) * self.scale).round() as i32,
        )
    }
}

/// Renders layers to PNG files. Holds the optional basemap.
pub struct ImageComposer {
    basemap: Option<Basemap>,
}

impl ImageComposer {
    pub fn new(basemap: Option<Basemap>) -> Self {
        Self { basemap }
    }

    pub fn has_basemap(&self) -> bool {
        self.basemap.is_some()
    }

    /// Draw the given layers and write `<output_dir>/<id>.png`.
    ///
    /// At least one non-empty layer is required. The boundary is drawn
    /// first, the overlay on top; both unfilled. The file is written to a
    /// temporary name and renamed, so a failure leaves nothing behind.
    pub async fn make_image(
        &self,
        id: &str,
        boundary: Option<&GeoLayer>,
        overlay: Option<&GeoLayer>,
        args: &ImageArgs,
        output_dir: &Path,
    ) -> Result<PathBuf, RenderError> {
        validate_id(id)?;
        let boundary = boundary.filter(|l| !l.is_empty());
        let overlay = overlay.filter(|l| !l.is_empty());
        let reference = args
            .crs_precedence
            .reference_crs(boundary, overlay)
            .ok_or(RenderError::NoGeometry)?;
        debug!("rendering {id} with reference CRS {reference}");

        let boundary = boundary.map(to_mercator).transpose()?;
        let overlay = overlay.map(to_mercator).transpose()?;

        let extent = [boundary.as_ref(), overlay.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(GeoLayer::bounds)
            .reduce(|a, b| a.union(&b))
            .ok_or(RenderError::NoGeometry)?
            .padded(PADDING, MIN_SPAN_METRES);
        let viewport = Viewport::fit(extent, args.pixel_size());

        let mut canvas = match &self.basemap {
            Some(basemap) => basemap.render(&extent, viewport.width, viewport.height).await?,
            None => RgbImage::from_pixel(viewport.width, viewport.height, BACKGROUND),
        };

        {
            let buffer: &mut [u8] = &mut canvas;
            let root = BitMapBackend::with_buffer(buffer, (viewport.width, viewport.height))
                .into_drawing_area();
            if let Some(layer) = &boundary {
                let style = args.boundary_color.to_rgb().mix(BOUNDARY_ALPHA).stroke_width(STROKE_WIDTH);
                draw_layer(&root, layer, &viewport, style)?;
            }
            if let Some(layer) = &overlay {
                let style = args.overlay_color.to_rgb().mix(OVERLAY_ALPHA).stroke_width(STROKE_WIDTH);
                draw_layer(&root, layer, &viewport, style)?;
            }
            root.present().map_err(draw_err)?;
        }

        let path = output_dir.join(format!("{id}.png"));
        write_png(&canvas, output_dir, &path)?;
        info!(
            "wrote {} ({}x{})",
            path.display(),
            viewport.width,
            viewport.height
        );
        Ok(path)
    }
}

fn validate_id(id: &str) -> Result<(), RenderError> {
    let bad = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0']);
    if bad {
        return Err(RenderError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Bring a layer onto the basemap's Mercator plane by way of WGS 84.
fn to_mercator(layer: &GeoLayer) -> Result<GeoLayer, RenderError> {
    let geographic = layer.to_crs(Crs::WGS84)?;
    let shapes = geographic
        .shapes
        .iter()
        .map(|shape| match shape {
            Shape::Point(c) => Shape::Point(lon_lat_to_mercator(*c)),
            Shape::Line(line) => Shape::Line(line.iter().map(|c| lon_lat_to_mercator(*c)).collect()),
            Shape::Polygon(rings) => Shape::Polygon(
                rings
                    .iter()
                    .map(|ring| ring.iter().map(|c| lon_lat_to_mercator(*c)).collect())
                    .collect(),
            ),
        })
        .collect();
    Ok(GeoLayer::new(Crs::WEB_MERCATOR, shapes))
}

fn draw_layer<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layer: &GeoLayer,
    viewport: &Viewport,
    style: ShapeStyle,
) -> Result<(), RenderError> {
    for shape in &layer.shapes {
        match shape {
            Shape::Point(c) => {
                root.draw(&Circle::new(viewport.to_pixel(*c), POINT_RADIUS, style))
                    .map_err(draw_err)?;
            }
            Shape::Line(line) => {
                let points: Vec<(i32, i32)> = line.iter().map(|c| viewport.to_pixel(*c)).collect();
                root.draw(&PathElement::new(points, style)).map_err(draw_err)?;
            }
            Shape::Polygon(rings) => {
                for ring in rings {
                    let mut points: Vec<(i32, i32)> = ring.iter().map(|c| viewport.to_pixel(*c)).collect();
                    if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
                        if first != last {
                            points.push(first);
                        }
                    }
                    root.draw(&PathElement::new(points, style)).map_err(draw_err)?;
                }
            }
        }
    }
    Ok(())
}

fn draw_err<E: fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn write_png(canvas: &RgbImage, output_dir: &Path, path: &Path) -> Result<(), RenderError> {
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".geothumb-")
        .suffix(".png.part")
        .tempfile_in(output_dir)
        .map_err(io_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        canvas.write_to(&mut writer, ImageFormat::Png)?;
        writer.flush().map_err(io_err)?;
    }
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
