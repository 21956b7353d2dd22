use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{ImageReader, RgbaImage};
use tracing::warn;

use crate::affirmation::{Affirmation, ImageDirective, TextDirective};
use crate::config::Config;
use crate::markup::{spans, Span};
use crate::typeset::Typesetter;

/// Upper bound on a scaled image, in multiples of the logical screen.
const MAX_IMAGE_SCREENS: f64 = 4.0;

/// Text ready to draw: resolved position, style and emphasis spans.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayText {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub spans: Vec<Span>,
    pub font_size: f32,
    pub dark: bool,
    pub outline: bool,
}

/// A decoded image already fitted and scaled for the logical screen.
#[derive(Debug, Clone)]
pub struct DisplayImage {
    pub x: i32,
    pub y: i32,
    pub path: PathBuf,
    pub pixels: Arc<RgbaImage>,
}

impl DisplayImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// One deck entry with everything the renderer needs.
#[derive(Debug, Clone)]
pub struct PreparedSlide {
    pub affirmation: Affirmation,
    pub text: DisplayText,
    pub image: Option<DisplayImage>,
}

impl PreparedSlide {
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

pub fn prepare_slide(
    config: &Config,
    typesetter: &dyn Typesetter,
    image_dir: &Path,
    affirmation: &Affirmation,
) -> Result<PreparedSlide> {
    let text = prepare_text(config, typesetter, &affirmation.message, &affirmation.text);
    let image = if affirmation.has_image() {
        Some(prepare_image(config, image_dir, &affirmation.image)?)
    } else {
        None
    };

    Ok(PreparedSlide {
        affirmation: affirmation.clone(),
        text,
        image,
    })
}

/// Measures the message and centres it on the logical screen, then applies
/// the directive's offsets.
pub fn prepare_text(
    config: &Config,
    typesetter: &dyn Typesetter,
    message: &str,
    directive: &TextDirective,
) -> DisplayText {
    let requested = if directive.font_size != 0 {
        directive.font_size
    } else {
        config.font_size
    };
    // Glyphs taller than the screen cannot be seen.
    let font_size = requested.min(config.screen_height);
    if font_size != requested {
        warn!(requested, font_size, "capping font size to the screen height");
    }
    let font_size = font_size as f32;

    let spans = spans(message);
    let (width, height) = typesetter.measure(&spans, font_size);
    let (x, y) = centered(
        config,
        width,
        height,
        directive.offset_x,
        directive.offset_y,
    );

    DisplayText {
        x,
        y,
        width,
        height,
        spans,
        font_size,
        dark: directive.dark,
        outline: true,
    }
}

/// Decodes the image, fits it inside the logical screen keeping its aspect
/// ratio, applies the directive's scale and centres it plus offsets.
pub fn prepare_image(
    config: &Config,
    image_dir: &Path,
    directive: &ImageDirective,
) -> Result<DisplayImage> {
    let path = image_dir.join(&directive.filename);
    let decoded = ImageReader::open(&path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("failed to read image {}", path.display()))?
        .decode()
        .with_context(|| format!("failed to decode image {}", path.display()))?;

    let (fit_width, fit_height) = fit_within(
        decoded.width(),
        decoded.height(),
        config.screen_width,
        config.screen_height,
    );
    let mut pixels = decoded
        .resize_exact(fit_width, fit_height, FilterType::CatmullRom)
        .into_rgba8();

    let (width, height) = scaled_size(
        config,
        &path,
        pixels.width(),
        pixels.height(),
        directive.scale,
    );
    if (width, height) != pixels.dimensions() {
        pixels = image::imageops::resize(&pixels, width, height, FilterType::CatmullRom);
    }

    let (x, y) = centered(
        config,
        pixels.width(),
        pixels.height(),
        directive.offset_x,
        directive.offset_y,
    );

    Ok(DisplayImage {
        x,
        y,
        path,
        pixels: Arc::new(pixels),
    })
}

/// Largest size with the same aspect ratio that fits in the bounds.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width.max(1), height.max(1));
    }
    let ratio = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let fitted_width = (f64::from(width) * ratio).round().max(1.0) as u32;
    let fitted_height = (f64::from(height) * ratio).round().max(1.0) as u32;
    (fitted_width.min(max_width), fitted_height.min(max_height))
}

/// Applies a directive scale to a fitted size. Scales that are not positive
/// and finite fall back to 1.0; results are capped at a few screens so a
/// typo cannot exhaust memory.
fn scaled_size(config: &Config, path: &Path, width: u32, height: u32, scale: f64) -> (u32, u32) {
    if !(scale.is_finite() && scale > 0.0) {
        warn!(path = %path.display(), scale, "ignoring image scale that is not positive");
        return (width, height);
    }

    let mut target_width = f64::from(width) * scale;
    let mut target_height = f64::from(height) * scale;
    let max_width = f64::from(config.screen_width) * MAX_IMAGE_SCREENS;
    let max_height = f64::from(config.screen_height) * MAX_IMAGE_SCREENS;
    let shrink = f64::min(max_width / target_width, max_height / target_height);
    if shrink < 1.0 {
        warn!(path = %path.display(), scale, "capping scaled image size");
        target_width *= shrink;
        target_height *= shrink;
    }

    (
        target_width.round().clamp(1.0, max_width) as u32,
        target_height.round().clamp(1.0, max_height) as u32,
    )
}

fn centered(config: &Config, width: u32, height: u32, offset_x: i32, offset_y: i32) -> (i32, i32) {
    let place = |screen: u32, size: u32, offset: i32| {
        let position = i64::from(screen) / 2 - i64::from(size) / 2 + i64::from(offset);
        position.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    };
    (
        place(config.screen_width, width, offset_x),
        place(config.screen_height, height, offset_y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    struct FixedTypesetter;

    impl Typesetter for FixedTypesetter {
        fn measure(&self, spans: &[Span], font_size: f32) -> (u32, u32) {
            let chars = spans.iter().map(|span| span.text.chars().count()).sum::<usize>();
            ((chars as f32 * font_size / 2.0) as u32, font_size as u32)
        }

        fn draw(&self, _: &mut RgbaImage, _: i32, _: i32, _: &[Span], _: f32, _: [u8; 4]) {}
    }

    fn config() -> Config {
        Config {
            sleep_milli: 1000,
            screen_width: 200,
            screen_height: 100,
            font_face: "face.ttf".to_owned(),
            font_size: 20,
            white_outline_scale: 0.2,
            black_outline_scale: 0.2,
            title: None,
        }
    }

    #[test]
    fn text_is_centred_then_offset() {
        let text = prepare_text(&config(), &FixedTypesetter, "abcd", &TextDirective::default());
        assert_eq!((text.width, text.height), (40, 20));
        assert_eq!((text.x, text.y), (80, 40));
        assert!(!text.dark);
        assert!(text.outline);

        let directive = TextDirective {
            dark: true,
            offset_x: 5,
            offset_y: -10,
            font_size: 40,
        };
        let text = prepare_text(&config(), &FixedTypesetter, "*ab*", &directive);
        assert_eq!(text.font_size, 40.0);
        assert_eq!((text.x, text.y), (100 - 20 + 5, 50 - 20 - 10));
        assert!(text.spans[0].bold);
    }

    #[test]
    fn fit_keeps_aspect_ratio() {
        assert_eq!(fit_within(400, 100, 200, 100), (200, 50));
        assert_eq!(fit_within(50, 100, 200, 100), (50, 100));
        assert_eq!(fit_within(10, 10, 200, 100), (100, 100));
    }

    #[test]
    fn image_is_fitted_scaled_and_centred() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(40, 20, Rgba([200, 10, 10, 255]))
            .save(dir.path().join("wide.png"))
            .unwrap();

        let directive = ImageDirective {
            filename: "wide.png".to_owned(),
            offset_x: 3,
            offset_y: 4,
            scale: 0.5,
        };
        let image = prepare_image(&config(), dir.path(), &directive).unwrap();
        assert_eq!((image.width(), image.height()), (100, 50));
        assert_eq!((image.x, image.y), (100 - 50 + 3, 50 - 25 + 4));
        assert_eq!(image.path, dir.path().join("wide.png"));
    }

    #[test]
    fn undecodable_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
        let directive = ImageDirective {
            filename: "broken.png".to_owned(),
            ..ImageDirective::default()
        };
        let error = prepare_image(&config(), dir.path(), &directive).unwrap_err();
        assert!(format!("{error:#}").contains("broken.png"));

        let missing = ImageDirective {
            filename: "missing.png".to_owned(),
            ..ImageDirective::default()
        };
        assert!(prepare_image(&config(), dir.path(), &missing).is_err());
    }

    fn wide_png(dir: &Path) {
        RgbaImage::from_pixel(40, 20, Rgba([200, 10, 10, 255]))
            .save(dir.join("wide.png"))
            .unwrap();
    }

    fn scaled(scale: f64) -> ImageDirective {
        ImageDirective {
            filename: "wide.png".to_owned(),
            scale,
            ..ImageDirective::default()
        }
    }

    #[test]
    fn oversized_scale_is_capped_at_four_screens() {
        let dir = tempfile::tempdir().unwrap();
        wide_png(dir.path());
        let image = prepare_image(&config(), dir.path(), &scaled(1e9)).unwrap();
        assert_eq!((image.width(), image.height()), (800, 400));
        assert_eq!((image.x, image.y), (100 - 400, 50 - 200));
    }

    #[test]
    fn unusable_scales_fall_back_to_the_fitted_size() {
        let dir = tempfile::tempdir().unwrap();
        wide_png(dir.path());
        for scale in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let image = prepare_image(&config(), dir.path(), &scaled(scale)).unwrap();
            assert_eq!((image.width(), image.height()), (200, 100), "scale {scale}");
        }
    }

    #[test]
    fn font_size_is_capped_at_screen_height() {
        let directive = TextDirective {
            font_size: 4_000_000_000,
            ..TextDirective::default()
        };
        let text = prepare_text(&config(), &FixedTypesetter, "ab", &directive);
        assert_eq!(text.font_size, 100.0);
        assert_eq!((text.width, text.height), (100, 100));
    }

    #[test]
    fn extreme_offsets_saturate_instead_of_wrapping() {
        let directive = TextDirective {
            offset_x: i32::MAX,
            offset_y: i32::MIN,
            ..TextDirective::default()
        };
        let text = prepare_text(&config(), &FixedTypesetter, "abcd", &directive);
        assert_eq!((text.x, text.y), (i32::MAX, i32::MIN + 40));
    }
}
