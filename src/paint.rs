use std::sync::Arc;

use anyhow::Result;
use image::RgbaImage;
use tracing::debug;

use crate::raster::black;
use crate::render::{letterbox, SlideRenderer};
use crate::slideshow::{Frame, SlideView, Slideshow};

/// Produces window-sized frames for whatever the slideshow shows right now.
///
/// Fully revealed slides are cached per window size; image-only phases are
/// cheap and always repainted.
pub struct Painter {
    renderer: SlideRenderer,
}

impl Painter {
    pub fn new(renderer: SlideRenderer) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &SlideRenderer {
        &self.renderer
    }

    pub fn paint(&self, slideshow: &Slideshow, width: u32, height: u32) -> Result<Frame> {
        let Some(view) = slideshow.display_text_image() else {
            return Ok(Arc::new(black(width, height)));
        };

        if view.show_both {
            if let Some(frame) = slideshow.cached_slide(view.index, width, height) {
                debug!(slide = view.index, "painted from cache");
                return Ok(frame);
            }
        }

        let frame = Arc::new(self.paint_view(&view, width, height)?);
        if view.show_both {
            slideshow.cache_slide(view.index, width, height, Arc::clone(&frame));
        }
        debug!(slide = view.index, show_both = view.show_both, "painted slide");
        Ok(frame)
    }

    /// Renders one view into a window-sized frame, bypassing the cache.
    pub fn paint_view(&self, view: &SlideView, width: u32, height: u32) -> Result<RgbaImage> {
        letterbox(&self.renderer.render(view), width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affirmation::Deck;
    use crate::config::Config;
    use crate::markup::Span;
    use crate::raster::blend_pixel;
    use crate::typeset::Typesetter;
    use image::Rgba;

    struct DotTypesetter;

    impl Typesetter for DotTypesetter {
        fn measure(&self, _: &[Span], font_size: f32) -> (u32, u32) {
            (font_size as u32, font_size as u32)
        }

        fn draw(&self, canvas: &mut RgbaImage, x: i32, y: i32, _: &[Span], _: f32, color: [u8; 4]) {
            blend_pixel(canvas, x, y, color);
        }
    }

    fn setup(deck: &str) -> (Slideshow, Painter) {
        let config = Config {
            sleep_milli: 1000,
            screen_width: 40,
            screen_height: 30,
            font_face: "face.ttf".to_owned(),
            font_size: 8,
            white_outline_scale: 0.25,
            black_outline_scale: 0.25,
            title: None,
        };
        let typesetter: Arc<dyn Typesetter> = Arc::new(DotTypesetter);
        let slideshow = Slideshow::new(config.clone(), "deck.txt", Arc::clone(&typesetter)).unwrap();
        slideshow.install(Deck::parse(deck)).unwrap();
        (slideshow, Painter::new(SlideRenderer::new(config, typesetter)))
    }

    #[test]
    fn empty_deck_paints_black_window() {
        let (slideshow, painter) = setup("");
        let frame = painter.paint(&slideshow, 16, 9).unwrap();
        assert_eq!(frame.dimensions(), (16, 9));
        assert!(frame.pixels().all(|pixel| *pixel == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn full_reveal_is_cached_per_window_size() {
        let (slideshow, painter) = setup("one\ntwo");
        let first = painter.paint(&slideshow, 80, 60).unwrap();
        let again = painter.paint(&slideshow, 80, 60).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let resized = painter.paint(&slideshow, 40, 30).unwrap();
        assert!(!Arc::ptr_eq(&first, &resized));
        assert_eq!(resized.dimensions(), (40, 30));
    }
}
