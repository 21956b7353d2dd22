use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use fontdue::layout::{
    CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle,
};
use fontdue::{Font, FontSettings};
use image::RgbaImage;
use parking_lot::Mutex;

use crate::markup::Span;
use crate::raster::blend_mask;

const ITALIC_SHEAR: f32 = 0.2;

/// Text measuring and drawing, the one capability slide preparation and
/// rendering need from a font engine.
pub trait Typesetter: Send + Sync {
    /// Size in pixels of the laid-out spans.
    fn measure(&self, spans: &[Span], font_size: f32) -> (u32, u32);

    /// Draws the spans with their top-left corner at (`x`, `y`).
    fn draw(
        &self,
        canvas: &mut RgbaImage,
        x: i32,
        y: i32,
        spans: &[Span],
        font_size: f32,
        color: [u8; 4],
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Emphasis {
    bold: bool,
    italic: bool,
}

#[derive(Debug, Clone)]
struct GlyphBitmap {
    width: usize,
    height: usize,
    bitmap: Vec<u8>,
}

/// [`Typesetter`] backed by a single fontdue face. Bold is a double strike
/// and italic a row shear, so one upright file covers every style.
pub struct FontTypesetter {
    font: Font,
    glyph_cache: Mutex<HashMap<GlyphRasterConfig, GlyphBitmap>>,
}

impl FontTypesetter {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|error| anyhow!("failed to parse font: {error}"))?;
        Ok(Self {
            font,
            glyph_cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
        Self::from_bytes(bytes).with_context(|| format!("failed to load font {}", path.display()))
    }

    fn layout(&self, spans: &[Span], font_size: f32, x: f32, y: f32) -> Layout<Emphasis> {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x,
            y,
            ..LayoutSettings::default()
        });
        for span in spans {
            layout.append(
                &[&self.font],
                &TextStyle::with_user_data(
                    &span.text,
                    font_size,
                    0,
                    Emphasis {
                        bold: span.bold,
                        italic: span.italic,
                    },
                ),
            );
        }
        layout
    }
}

impl Typesetter for FontTypesetter {
    fn measure(&self, spans: &[Span], font_size: f32) -> (u32, u32) {
        let layout = self.layout(spans, font_size, 0.0, 0.0);
        let width = layout
            .glyphs()
            .iter()
            .map(|glyph| {
                let extra = if glyph.user_data.bold { 1.0 } else { 0.0 };
                glyph.x + glyph.width as f32 + extra
            })
            .fold(0.0_f32, f32::max);
        (width.ceil() as u32, layout.height().ceil() as u32)
    }

    fn draw(
        &self,
        canvas: &mut RgbaImage,
        x: i32,
        y: i32,
        spans: &[Span],
        font_size: f32,
        color: [u8; 4],
    ) {
        let layout = self.layout(spans, font_size, x as f32, y as f32);
        let mut cache = self.glyph_cache.lock();

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let bitmap = cache.entry(glyph.key).or_insert_with(|| {
                let (_, bitmap) = self.font.rasterize_config(glyph.key);
                GlyphBitmap {
                    width: glyph.width,
                    height: glyph.height,
                    bitmap,
                }
            });

            let shear = if glyph.user_data.italic {
                ITALIC_SHEAR
            } else {
                0.0
            };
            let strikes = if glyph.user_data.bold { 2 } else { 1 };
            for strike in 0..strikes {
                blend_mask(
                    canvas,
                    glyph.x.round() as i32 + strike,
                    glyph.y.round() as i32,
                    bitmap.width,
                    bitmap.height,
                    &bitmap.bitmap,
                    color,
                    shear,
                );
            }
        }
    }
}
