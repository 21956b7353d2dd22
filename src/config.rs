use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

/// Largest accepted logical screen side, in pixels.
pub const MAX_SCREEN_SIDE: u32 = 16_384;

/// Slideshow configuration, read from JSON with PascalCase keys. Keys this
/// struct does not know are ignored, as older config files carry extras.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    /// How long each slide stays up during auto-play.
    pub sleep_milli: u64,
    /// Logical screen the slides are laid out on.
    pub screen_width: u32,
    pub screen_height: u32,
    /// Path to a TTF/OTF file. Relative paths resolve against the config file.
    pub font_face: String,
    pub font_size: u32,
    /// Outline stroke for light text, as a fraction of the font size. Half of
    /// the stroke shows around the glyphs.
    pub white_outline_scale: f32,
    /// Outline stroke for dark text.
    pub black_outline_scale: f32,
    #[serde(default)]
    pub title: Option<String>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.sleep_milli == 0 {
            bail!("invalid SleepMilli: {}", self.sleep_milli);
        }
        if self.screen_width == 0 || self.screen_width > MAX_SCREEN_SIDE {
            bail!("invalid ScreenWidth: {}", self.screen_width);
        }
        if self.screen_height == 0 || self.screen_height > MAX_SCREEN_SIDE {
            bail!("invalid ScreenHeight: {}", self.screen_height);
        }
        if self.font_face.trim().is_empty() {
            bail!("invalid FontFace: '{}'", self.font_face);
        }
        if self.font_size == 0 {
            bail!("invalid FontSize: {}", self.font_size);
        }
        if !(self.black_outline_scale > 0.0) {
            bail!("invalid BlackOutlineScale: {}", self.black_outline_scale);
        }
        if !(self.white_outline_scale > 0.0) {
            bail!("invalid WhiteOutlineScale: {}", self.white_outline_scale);
        }
        Ok(())
    }

    pub fn slide_interval(&self) -> Duration {
        Duration::from_millis(self.sleep_milli)
    }

    /// The window title: the configured one, else the deck's.
    pub fn window_title<'a>(&'a self, deck_title: &'a str) -> &'a str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => deck_title,
        }
    }

    pub fn font_path(&self, config_dir: &Path) -> PathBuf {
        let path = Path::new(&self.font_face);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            config_dir.join(path)
        }
    }
}

/// Reads, parses and validates a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: Config = serde_json::from_str(&contents).map_err(|error| {
        anyhow!(
            "failed to parse json in {} at line {}, column {}: {}",
            path.display(),
            error.line(),
            error.column(),
            error
        )
    })?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}
