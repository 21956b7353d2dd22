use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::directive::parse_affirmations;

/// Title used when the affirmation file does not open with a comment.
pub const DEFAULT_TITLE: &str = "Affirmations";

/// A single slide: the message plus how to show it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Affirmation {
    pub message: String,
    pub image: ImageDirective,
    pub text: TextDirective,
}

impl Affirmation {
    pub fn has_image(&self) -> bool {
        !self.image.filename.is_empty()
    }
}

/// Image half of a directive: `filename.ext[:scale][:x,y]`.
///
/// An empty `filename` means the slide has no image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDirective {
    pub filename: String,
    pub offset_x: i32,
    pub offset_y: i32,
    /// Multiplier applied after the image is fitted to the screen.
    pub scale: f64,
}

impl Default for ImageDirective {
    fn default() -> Self {
        Self {
            filename: String::new(),
            offset_x: 0,
            offset_y: 0,
            scale: 1.0,
        }
    }
}

/// Text half of a directive: `b|w[:font_size][:x,y]`.
///
/// The default is light text, centred, at the configured font size. Light is
/// kept as the default for compatibility with existing affirmation files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextDirective {
    pub dark: bool,
    pub offset_x: i32,
    pub offset_y: i32,
    /// Zero means "use the configured font size".
    pub font_size: u32,
}

/// Everything parsed out of one affirmation file.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub title: String,
    pub affirmations: Vec<Affirmation>,
}

impl Deck {
    /// Parses affirmation text, substituting [`DEFAULT_TITLE`] when the text
    /// has no title comment.
    pub fn parse(text: &str) -> Self {
        let (affirmations, title) = parse_affirmations(text);
        let title = if title.is_empty() {
            DEFAULT_TITLE.to_owned()
        } else {
            title
        };
        Self {
            title,
            affirmations,
        }
    }

    pub fn len(&self) -> usize {
        self.affirmations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.affirmations.is_empty()
    }
}

pub fn load_deck(path: &Path) -> Result<Deck> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read affirmations {}", path.display()))?;
    Ok(Deck::parse(&contents))
}
