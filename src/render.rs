use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use image::RgbaImage;
use tiny_skia::{Color, FilterQuality, IntSize, Pixmap, PixmapPaint, Transform};

use crate::config::Config;
use crate::prepare::DisplayText;
use crate::raster::{black, blend_pixel, blit};
use crate::slideshow::SlideView;
use crate::typeset::Typesetter;

const LIGHT: [u8; 4] = [255, 255, 255, 255];
const DARK: [u8; 4] = [0, 0, 0, 255];

/// Paints prepared slides onto a logical-screen sized canvas.
pub struct SlideRenderer {
    config: Config,
    typesetter: Arc<dyn Typesetter>,
}

impl SlideRenderer {
    pub fn new(config: Config, typesetter: Arc<dyn Typesetter>) -> Self {
        Self { config, typesetter }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Black background, then the image, then (when showing both) the
    /// outlined text.
    pub fn render(&self, view: &SlideView) -> RgbaImage {
        let mut canvas = black(self.config.screen_width, self.config.screen_height);

        if let Some(image) = view.image() {
            blit(&mut canvas, &image.pixels, image.x, image.y);
        }
        if view.show_both {
            self.draw_text(&mut canvas, view.text());
        }
        canvas
    }

    fn draw_text(&self, canvas: &mut RgbaImage, text: &DisplayText) {
        if text.spans.is_empty() {
            return;
        }
        let (color, outline_color, outline_scale) = if text.dark {
            (DARK, LIGHT, self.config.white_outline_scale)
        } else {
            (LIGHT, DARK, self.config.black_outline_scale)
        };

        if text.outline {
            // Half of the stroke falls outside the glyphs.
            let radius = text.font_size * outline_scale / 2.0;
            self.draw_outline(canvas, text, outline_color, radius);
        }
        self.typesetter
            .draw(canvas, text.x, text.y, &text.spans, text.font_size, color);
    }

    fn draw_outline(&self, canvas: &mut RgbaImage, text: &DisplayText, color: [u8; 4], radius: f32) {
        let longest_side = canvas.width().max(canvas.height()) as f32;
        let radius = radius.min(text.font_size).min(longest_side);
        if !(radius > 0.0) {
            return;
        }
        let reach = i64::from(radius.ceil() as u32);
        // Glyphs may overhang their measured box, italics to the right.
        let slack_x = reach + i64::from(text.height / 4) + 1;
        let slack_y = reach + 1;

        // Only the part of the padded text box that can reach the canvas.
        let left = (i64::from(text.x) - slack_x).max(-reach);
        let top = (i64::from(text.y) - slack_y).max(-reach);
        let right = (i64::from(text.x) + i64::from(text.width) + slack_x)
            .min(i64::from(canvas.width()) + reach);
        let bottom = (i64::from(text.y) + i64::from(text.height) + slack_y)
            .min(i64::from(canvas.height()) + reach);
        if right <= left || bottom <= top {
            return;
        }
        let width = (right - left) as u32;
        let height = (bottom - top) as u32;

        let mut glyphs = RgbaImage::new(width, height);
        self.typesetter.draw(
            &mut glyphs,
            (i64::from(text.x) - left) as i32,
            (i64::from(text.y) - top) as i32,
            &text.spans,
            text.font_size,
            LIGHT,
        );
        let coverage = glyphs.pixels().map(|pixel| pixel[0]).collect::<Vec<_>>();

        let disc = disc_offsets(radius);
        let origin_x = left as i32;
        let origin_y = top as i32;
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let stroke = disc
                    .iter()
                    .filter_map(|&(dx, dy)| {
                        let sx = x + dx;
                        let sy = y + dy;
                        (sx >= 0 && sy >= 0 && sx < width as i32 && sy < height as i32)
                            .then(|| coverage[(sy as u32 * width + sx as u32) as usize])
                    })
                    .max()
                    .unwrap_or(0);
                if stroke > 0 {
                    blend_pixel(
                        canvas,
                        origin_x + x,
                        origin_y + y,
                        [color[0], color[1], color[2], stroke],
                    );
                }
            }
        }
    }
}

fn disc_offsets(radius: f32) -> Vec<(i32, i32)> {
    let reach = radius.ceil() as i32;
    let limit = radius * radius;
    (-reach..=reach)
        .flat_map(|dy| (-reach..=reach).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| (dx * dx + dy * dy) as f32 <= limit)
        .collect()
}

/// Scales a logical-screen frame into a window, keeping its aspect ratio and
/// centring it on the slack axis. The bars are black.
pub fn letterbox(frame: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        bail!("invalid window size {width}x{height}");
    }
    if frame.dimensions() == (width, height) {
        return Ok(frame.clone());
    }

    let size = IntSize::from_wh(frame.width(), frame.height())
        .ok_or_else(|| anyhow!("invalid frame size {}x{}", frame.width(), frame.height()))?;
    // Frames are opaque, so straight and premultiplied alpha agree.
    let source = Pixmap::from_vec(frame.as_raw().clone(), size)
        .ok_or_else(|| anyhow!("failed to wrap frame as pixmap"))?;
    let mut target = Pixmap::new(width, height)
        .ok_or_else(|| anyhow!("failed to allocate window pixmap {width}x{height}"))?;
    target.fill(Color::BLACK);

    let frame_width = frame.width() as f32;
    let frame_height = frame.height() as f32;
    let ratio = f32::min(width as f32 / frame_width, height as f32 / frame_height);
    let offset_x = (width as f32 - frame_width * ratio) / 2.0;
    let offset_y = (height as f32 - frame_height * ratio) / 2.0;

    target.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &PixmapPaint {
            quality: FilterQuality::Bicubic,
            ..PixmapPaint::default()
        },
        Transform::from_row(ratio, 0.0, 0.0, ratio, offset_x, offset_y),
        None,
    );

    RgbaImage::from_raw(width, height, target.take())
        .ok_or_else(|| anyhow!("window pixmap has an unexpected size"))
}
