//! The playback controller shared by the UI and the auto-play thread.
//!
//! All state lives behind one mutex. Every public method takes the lock for
//! its whole duration and never across slow work: `load` prepares slides
//! (image decode, text layout) before locking and only swaps the result in.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbaImage;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::affirmation::{load_deck, Deck};
use crate::cache::RenderCache;
use crate::config::Config;
use crate::playback::Playback;
use crate::prepare::{prepare_slide, DisplayImage, DisplayText, PreparedSlide};
use crate::ticker::Ticker;
use crate::typeset::Typesetter;

/// A painted slide as handed to and from the render cache.
pub type Frame = Arc<RgbaImage>;

/// What the UI should draw right now.
#[derive(Debug, Clone)]
pub struct SlideView {
    pub index: usize,
    pub slide: Arc<PreparedSlide>,
    /// Draw the text as well as the image. Always true during auto-play.
    pub show_both: bool,
}

impl SlideView {
    pub fn text(&self) -> &DisplayText {
        &self.slide.text
    }

    pub fn image(&self) -> Option<&DisplayImage> {
        self.slide.image.as_ref()
    }
}

struct Shared {
    title: String,
    slides: Vec<Arc<PreparedSlide>>,
    playback: Playback,
    cache: RenderCache<Frame>,
    ticker: Option<Ticker>,
    rng: StdRng,
}

impl Shared {
    fn reload(&mut self) {
        let Self {
            slides,
            playback,
            rng,
            ..
        } = self;
        playback.reload(slides.len(), |index| slides[index].has_image(), rng);
    }

    fn advance(&mut self) {
        let len = self.slides.len();
        self.playback.advance(len, &mut self.rng);
    }
}

pub struct Slideshow {
    config: Config,
    affirmation_path: PathBuf,
    image_dir: PathBuf,
    typesetter: Arc<dyn Typesetter>,
    shared: Arc<Mutex<Shared>>,
}

impl Slideshow {
    /// Builds an empty slideshow; call [`Slideshow::load`] to read the deck.
    /// Images resolve from `images/` next to the affirmation file.
    pub fn new(
        config: Config,
        affirmation_path: impl Into<PathBuf>,
        typesetter: Arc<dyn Typesetter>,
    ) -> Result<Self> {
        let affirmation_path = affirmation_path.into();
        let image_dir = affirmation_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
            .join("images");
        Self::with_image_dir(config, affirmation_path, image_dir, typesetter)
    }

    pub fn with_image_dir(
        config: Config,
        affirmation_path: impl Into<PathBuf>,
        image_dir: impl Into<PathBuf>,
        typesetter: Arc<dyn Typesetter>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            affirmation_path: affirmation_path.into(),
            image_dir: image_dir.into(),
            typesetter,
            shared: Arc::new(Mutex::new(Shared {
                title: String::new(),
                slides: Vec::new(),
                playback: Playback::new(),
                cache: RenderCache::new(),
                ticker: None,
                rng: StdRng::from_entropy(),
            })),
        })
    }

    /// Replaces the shuffle source, so shuffled orders are reproducible.
    pub fn seed(&self, seed: u64) {
        self.shared.lock().rng = StdRng::seed_from_u64(seed);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn affirmation_path(&self) -> &Path {
        &self.affirmation_path
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Re-reads the affirmation file and installs it.
    pub fn load(&self) -> Result<()> {
        let deck = load_deck(&self.affirmation_path)?;
        self.install(deck)
    }

    /// Prepares every slide of `deck` and swaps it in. On error nothing
    /// changes.
    pub fn install(&self, deck: Deck) -> Result<()> {
        let slides = deck
            .affirmations
            .iter()
            .enumerate()
            .map(|(index, affirmation)| {
                prepare_slide(
                    &self.config,
                    self.typesetter.as_ref(),
                    &self.image_dir,
                    affirmation,
                )
                .map(Arc::new)
                .with_context(|| format!("failed to prepare slide {}", index + 1))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut shared = self.shared.lock();
        shared.title = deck.title;
        shared.slides = slides;
        shared.reload();
        shared.cache.clear();
        info!(
            title = %shared.title,
            slides = shared.slides.len(),
            active = shared.playback.active(),
            "loaded affirmations"
        );
        Ok(())
    }

    pub fn title(&self) -> String {
        self.shared.lock().title.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.lock().slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn left(&self) {
        let mut shared = self.shared.lock();
        let shared = &mut *shared;
        let slides = &shared.slides;
        shared
            .playback
            .left(slides.len(), |index| slides[index].has_image());
    }

    pub fn right(&self) {
        let mut shared = self.shared.lock();
        let shared = &mut *shared;
        let slides = &shared.slides;
        shared
            .playback
            .right(slides.len(), |index| slides[index].has_image());
    }

    /// Toggles shuffled auto-play and returns the new mode.
    pub fn random_on_off(&self) -> bool {
        let shuffled = self.shared.lock().playback.toggle_shuffle();
        info!(shuffled, "slideshow order mode changed");
        shuffled
    }

    pub fn is_shuffled(&self) -> bool {
        self.shared.lock().playback.shuffled()
    }

    /// Moves to the next slide of the auto-play order.
    pub fn advance(&self) {
        self.shared.lock().advance();
    }

    pub fn is_playing(&self) -> bool {
        self.shared.lock().ticker.is_some()
    }

    /// Starts auto-play, or stops it when running. Returns whether auto-play
    /// is now running.
    ///
    /// Each tick advances one slide and then calls `repaint` outside the
    /// lock. After a stop returns no further tick touches the slideshow.
    pub fn start_stop_slide_show<F>(&self, repaint: F) -> Result<bool>
    where
        F: Fn() + Send + 'static,
    {
        let mut shared = self.shared.lock();

        if let Some(mut ticker) = shared.ticker.take() {
            ticker.cancel();
            drop(shared);
            ticker.join()?;
            info!("slideshow stopped");
            return Ok(false);
        }

        let interval = self.config.slide_interval();
        let state = Arc::clone(&self.shared);
        let ticker = Ticker::spawn("conditioning-slideshow", interval, move |token| {
            {
                let mut shared = state.lock();
                if token.is_cancelled() {
                    return;
                }
                shared.advance();
                debug!(active = shared.playback.active(), "slideshow tick");
            }
            repaint();
        })?;
        shared.ticker = Some(ticker);
        info!(interval_ms = interval.as_millis() as u64, "slideshow started");
        Ok(true)
    }

    /// The active slide, or `None` when the deck is empty.
    pub fn display_text_image(&self) -> Option<SlideView> {
        let shared = self.shared.lock();
        if shared.slides.is_empty() {
            return None;
        }

        let index = shared.playback.active();
        Some(SlideView {
            index,
            slide: Arc::clone(&shared.slides[index]),
            show_both: shared.ticker.is_some() || shared.playback.reveal_both(),
        })
    }

    /// Any slide of the deck fully revealed, independent of playback.
    pub fn slide_view(&self, index: usize) -> Option<SlideView> {
        let shared = self.shared.lock();
        shared.slides.get(index).map(|slide| SlideView {
            index,
            slide: Arc::clone(slide),
            show_both: true,
        })
    }

    /// Remembers a fully painted slide for the given viewport size.
    pub fn cache_slide(&self, index: usize, width: u32, height: u32, frame: Frame) {
        self.shared.lock().cache.put(index, width, height, frame);
    }

    /// A slide painted earlier at exactly this viewport size.
    pub fn cached_slide(&self, index: usize, width: u32, height: u32) -> Option<Frame> {
        self.shared.lock().cache.get(index, width, height)
    }
}

impl Drop for Slideshow {
    fn drop(&mut self) {
        let ticker = self.shared.lock().ticker.take();
        if let Some(ticker) = ticker {
            // The tick closure holds the shared state; stop it so it is freed.
            let _ = ticker.join();
        }
    }
}
