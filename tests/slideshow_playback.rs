use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use conditioning::markup::Span;
use conditioning::raster::blend_pixel;
use conditioning::{Config, Painter, SlideRenderer, Slideshow, Typesetter};
use image::{Rgba, RgbaImage};
use tempfile::tempdir;

/// Each character is a `size / 2` wide solid block.
struct BlockTypesetter;

impl Typesetter for BlockTypesetter {
    fn measure(&self, spans: &[Span], font_size: f32) -> (u32, u32) {
        let chars = spans
            .iter()
            .map(|span| span.text.chars().count())
            .sum::<usize>();
        ((chars as f32 * font_size / 2.0) as u32, font_size as u32)
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
        let (width, height) = self.measure(spans, font_size);
        for dy in 0..height as i32 {
            for dx in 0..width as i32 {
                blend_pixel(canvas, x + dx, y + dy, color);
            }
        }
    }
}

fn config(sleep_milli: u64) -> Config {
    Config {
        sleep_milli,
        screen_width: 120,
        screen_height: 80,
        font_face: "face.ttf".to_owned(),
        font_size: 10,
        white_outline_scale: 0.2,
        black_outline_scale: 0.2,
        title: None,
    }
}

const DECK: &str = "// Morning
I am calm [sunrise.png:0.5]
I am *focused* [b:12:-10,5]
I /learn/ every day
";

fn write_deck(dir: &Path, deck: &str) {
    let images = dir.join("images");
    fs::create_dir_all(&images).expect("images dir should create");
    RgbaImage::from_pixel(60, 40, Rgba([250, 160, 20, 255]))
        .save(images.join("sunrise.png"))
        .expect("fixture should save");
    fs::write(dir.join("affirmations.txt"), deck).expect("deck should write");
}

fn open(dir: &Path, sleep_milli: u64) -> Slideshow {
    let slideshow = Slideshow::new(
        config(sleep_milli),
        dir.join("affirmations.txt"),
        Arc::new(BlockTypesetter),
    )
    .expect("config should be valid");
    slideshow.load().expect("deck should load");
    slideshow
}

#[test]
fn loads_title_images_and_directives_from_disk() {
    let dir = tempdir().expect("tempdir should create");
    write_deck(dir.path(), DECK);
    let slideshow = open(dir.path(), 1000);

    assert_eq!(slideshow.title(), "Morning");
    assert_eq!(slideshow.len(), 3);

    let first = slideshow.slide_view(0).expect("first slide");
    let image = first.image().expect("first slide has an image");
    // 60x40 fits 120x80 at 2x, then halved by the directive.
    assert_eq!((image.width(), image.height()), (60, 40));
    assert_eq!((image.x, image.y), (30, 20));

    let second = slideshow.slide_view(1).expect("second slide");
    assert!(second.image().is_none());
    assert!(second.text().dark);
    assert_eq!(second.text().font_size, 12.0);
    assert!(second.text().spans.iter().any(|span| span.bold));
}

#[test]
fn right_walks_image_first_then_text() {
    let dir = tempdir().expect("tempdir should create");
    write_deck(dir.path(), DECK);
    let slideshow = open(dir.path(), 1000);

    let steps = (0..5)
        .map(|_| {
            let view = slideshow.display_text_image().expect("deck is not empty");
            slideshow.right();
            (view.index, view.show_both)
        })
        .collect::<Vec<_>>();
    assert_eq!(
        steps,
        vec![(0, false), (0, true), (1, true), (2, true), (0, false)]
    );
}

#[test]
fn reload_picks_up_edits_and_clamps_position() {
    let dir = tempdir().expect("tempdir should create");
    write_deck(dir.path(), DECK);
    let slideshow = open(dir.path(), 1000);
    slideshow.left();
    assert_eq!(slideshow.display_text_image().map(|view| view.index), Some(2));

    write_deck(dir.path(), "// Evening\nOnly one now\n");
    slideshow.load().expect("reload should succeed");
    assert_eq!(slideshow.title(), "Evening");
    let view = slideshow.display_text_image().expect("one slide");
    assert_eq!(view.index, 0);
    assert!(view.show_both);
}

#[test]
fn reload_failure_keeps_the_running_deck() {
    let dir = tempdir().expect("tempdir should create");
    write_deck(dir.path(), DECK);
    let slideshow = open(dir.path(), 1000);

    fs::remove_file(dir.path().join("affirmations.txt")).expect("deck should delete");
    let error = slideshow.load().expect_err("missing deck should fail");
    assert!(format!("{error:#}").contains("failed to read affirmations"));
    assert_eq!(slideshow.len(), 3);
}

#[test]
fn auto_play_advances_and_stops_cleanly() {
    let dir = tempdir().expect("tempdir should create");
    write_deck(dir.path(), DECK);
    let slideshow = open(dir.path(), 5);
    let phase_before = slideshow.display_text_image().expect("slide").show_both;
    assert!(!phase_before);

    let repaints = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&repaints);
    let playing = slideshow
        .start_stop_slide_show(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("ticker should start");
    assert!(playing);

    let deadline = Instant::now() + Duration::from_secs(5);
    while repaints.load(Ordering::SeqCst) < 4 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(2));
    }
    assert!(repaints.load(Ordering::SeqCst) >= 4);
    assert!(slideshow.display_text_image().expect("slide").show_both);

    let playing = slideshow
        .start_stop_slide_show(|| {})
        .expect("ticker should stop");
    assert!(!playing);

    let after_stop = repaints.load(Ordering::SeqCst);
    let active = slideshow.display_text_image().expect("slide").index;
    thread::sleep(Duration::from_millis(40));
    assert_eq!(repaints.load(Ordering::SeqCst), after_stop);
    let view = slideshow.display_text_image().expect("slide");
    assert_eq!(view.index, active);
    assert_eq!(view.show_both, phase_before);
}

#[test]
fn shuffled_auto_play_visits_every_slide() {
    let dir = tempdir().expect("tempdir should create");
    write_deck(dir.path(), DECK);
    let slideshow = open(dir.path(), 1000);
    slideshow.seed(7);
    assert!(slideshow.random_on_off());

    let mut seen = [false; 3];
    let mut previous = slideshow.display_text_image().expect("slide").index;
    for _ in 0..30 {
        slideshow.advance();
        let index = slideshow.display_text_image().expect("slide").index;
        seen[index] = true;
        assert_ne!(index, previous);
        previous = index;
    }
    assert!(seen.iter().all(|&visited| visited));
}

#[test]
fn painter_letterboxes_and_caches_revealed_slides() {
    let dir = tempdir().expect("tempdir should create");
    write_deck(dir.path(), DECK);
    let slideshow = open(dir.path(), 1000);
    let painter = Painter::new(SlideRenderer::new(config(1000), Arc::new(BlockTypesetter)));

    // Image-only phase is never cached.
    let first = painter.paint(&slideshow, 240, 240).expect("paint");
    let second = painter.paint(&slideshow, 240, 240).expect("paint");
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*first.get_pixel(120, 10), Rgba([0, 0, 0, 255]));

    slideshow.right();
    let revealed = painter.paint(&slideshow, 240, 240).expect("paint");
    let cached = painter.paint(&slideshow, 240, 240).expect("paint");
    assert!(Arc::ptr_eq(&revealed, &cached));
}
