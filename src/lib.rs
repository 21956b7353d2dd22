//! Affirmation slideshows: a line-oriented deck format with inline image and
//! text directives, a two-phase (image, then image plus text) playback model
//! with optional shuffled auto-play, and a software renderer that paints
//! slides for any window size.

pub mod affirmation;
pub mod cache;
pub mod config;
pub mod directive;
pub mod markup;
pub mod order;
pub mod paint;
pub mod playback;
pub mod prepare;
pub mod raster;
pub mod render;
pub mod slideshow;
pub mod ticker;
pub mod typeset;

pub use affirmation::{load_deck, Affirmation, Deck, ImageDirective, TextDirective};
pub use config::{load_config, Config};
pub use paint::Painter;
pub use render::{letterbox, SlideRenderer};
pub use slideshow::{Frame, SlideView, Slideshow};
pub use typeset::{FontTypesetter, Typesetter};
