//! Per-frame conversion: grid, sample, map, render.

use image::{DynamicImage, GrayImage};

use crate::canvas::AsciiCanvas;
use crate::error::AsciiError;
use crate::font::{BitmapFont, GlyphFont};
use crate::grid::{compute_grid, TileGrid};
use crate::ramp::{GlyphTable, Ramp};
use crate::render::render;

/// Character density of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    /// Characters per output row.
    pub columns: u32,
    /// Glyph cell aspect correction: tile height is `tile_width / aspect_scale`.
    pub aspect_scale: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self { columns: 120, aspect_scale: 0.5 }
    }
}

/// Everything fixed for one conversion run.
///
/// The glyph table and font are built once and only read afterwards, so one
/// converter can be shared by reference across worker threads. Converting a
/// frame is a pure function of the frame and this value.
pub struct FrameConverter {
    settings: GridSettings,
    table: GlyphTable,
    font: Box<dyn GlyphFont>,
}

impl FrameConverter {
    pub fn new(settings: GridSettings, ramp: Ramp, font: Box<dyn GlyphFont>) -> Self {
        Self {
            settings,
            table: GlyphTable::new(&ramp),
            font,
        }
    }

    /// Converter drawing with the built-in 8x8 font.
    pub fn with_bitmap_font(settings: GridSettings, ramp: Ramp) -> Self {
        Self::new(settings, ramp, Box::new(BitmapFont::default()))
    }

    pub fn settings(&self) -> GridSettings {
        self.settings
    }

    pub fn table(&self) -> &GlyphTable {
        &self.table
    }

    pub fn font(&self) -> &dyn GlyphFont {
        self.font.as_ref()
    }

    pub fn grid(&self, frame: &GrayImage) -> Result<TileGrid, AsciiError> {
        let (width, height) = frame.dimensions();
        self.grid_for(width, height)
    }

    /// Grid for frames of a known size, checked before any frame arrives.
    pub fn grid_for(&self, width: u32, height: u32) -> Result<TileGrid, AsciiError> {
        compute_grid(width, height, self.settings.columns, self.settings.aspect_scale)
    }

    /// The ASCII canvas for one frame. Geometry is validated before any
    /// tile is sampled.
    pub fn canvas(&self, frame: &GrayImage) -> Result<AsciiCanvas, AsciiError> {
        let grid = self.grid(frame)?;
        Ok(AsciiCanvas::from_frame(frame, &grid, &self.table))
    }

    pub fn render(&self, canvas: &AsciiCanvas) -> GrayImage {
        render(canvas, self.font.as_ref())
    }

    pub fn convert(&self, frame: &GrayImage) -> Result<GrayImage, AsciiError> {
        let canvas = self.canvas(frame)?;
        Ok(self.render(&canvas))
    }

    /// Convert any decoded image, reducing it to luminance first.
    pub fn convert_image(&self, image: &DynamicImage) -> Result<(AsciiCanvas, GrayImage), AsciiError> {
        let canvas = self.canvas(&image.to_luma8())?;
        let raster = self.render(&canvas);
        Ok((canvas, raster))
    }
}
