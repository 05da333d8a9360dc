use crate::compose::{BadgeTemplate, export_svg};
use crate::error::RasterizationError;
use crate::model::BadgeFields;
use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Payload handed to a rasterizer. `svg` already carries a root width/height equal to
/// `width`/`height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterRequest {
    pub svg: String,
    pub width: u32,
    pub height: u32,
}

pub trait Rasterizer {
    /// Returns PNG bytes.
    fn rasterize(&self, request: &RasterRequest) -> Result<Vec<u8>, RasterizationError>;
}

/// In-process rasterizer backed by resvg.
#[cfg(feature = "png")]
#[derive(Clone)]
pub struct ResvgRasterizer {
    font_family: String,
    fontdb: std::sync::Arc<usvg::fontdb::Database>,
}

#[cfg(feature = "png")]
impl ResvgRasterizer {
    pub fn new(font_family: impl Into<String>) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        Self {
            font_family: font_family.into(),
            fontdb: std::sync::Arc::new(fontdb),
        }
    }
}

#[cfg(feature = "png")]
impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new("Inter")
    }
}

#[cfg(feature = "png")]
impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, request: &RasterRequest) -> Result<Vec<u8>, RasterizationError> {
        let opt = usvg::Options {
            font_family: self.font_family.clone(),
            fontdb: std::sync::Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };

        let tree = usvg::Tree::from_str(&request.svg, &opt)
            .map_err(|err| RasterizationError::Parse(err.to_string()))?;
        let mut pixmap = resvg::tiny_skia::Pixmap::new(request.width, request.height).ok_or(
            RasterizationError::Allocate {
                width: request.width,
                height: request.height,
            },
        )?;

        let size = tree.size();
        let transform = resvg::tiny_skia::Transform::from_scale(
            request.width as f32 / size.width(),
            request.height as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        pixmap
            .encode_png()
            .map_err(|err| RasterizationError::Encode(err.to_string()))
    }
}

/// A finished single badge: PNG when rasterization worked, the composed SVG otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeOutput {
    Png(Vec<u8>),
    Svg(String),
}

impl BadgeOutput {
    pub fn extension(&self) -> &'static str {
        match self {
            BadgeOutput::Png(_) => "png",
            BadgeOutput::Svg(_) => "svg",
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            BadgeOutput::Png(bytes) => bytes,
            BadgeOutput::Svg(svg) => svg.as_bytes(),
        }
    }

    /// Swaps a `.png` file name for `.svg` when this output fell back to SVG.
    pub fn file_name(&self, png_name: &str) -> String {
        match self {
            BadgeOutput::Png(_) => png_name.to_string(),
            BadgeOutput::Svg(_) => png_name.replace(".png", ".svg"),
        }
    }
}

/// Builds the export payload for one badge.
pub fn raster_request(
    template: &BadgeTemplate,
    fields: &BadgeFields,
    company_wrap_width: usize,
    scale: f64,
) -> (String, RasterRequest) {
    let composed = template.compose(fields, company_wrap_width);
    let size = template.export_size(scale);
    let request = RasterRequest {
        svg: export_svg(&composed, size),
        width: size.width,
        height: size.height,
    };
    (composed, request)
}

/// Composes, sizes and rasterizes one badge, falling back to the composed SVG when
/// the rasterizer fails.
pub fn render_single<R: Rasterizer + ?Sized>(
    template: &BadgeTemplate,
    fields: &BadgeFields,
    rasterizer: &R,
    company_wrap_width: usize,
    scale: f64,
) -> BadgeOutput {
    let (composed, request) = raster_request(template, fields, company_wrap_width, scale);
    match rasterizer.rasterize(&request) {
        Ok(png) => BadgeOutput::Png(png),
        Err(err) => {
            warn!("PNG conversion failed, falling back to SVG: {err}");
            BadgeOutput::Svg(composed)
        }
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

/// Writes a badge next to `output`, adjusting the extension to the actual format.
pub fn write_badge(badge: &BadgeOutput, output: &Path) -> Result<PathBuf> {
    let path = output.with_extension(badge.extension());
    std::fs::write(&path, badge.as_bytes())?;
    Ok(path)
}
