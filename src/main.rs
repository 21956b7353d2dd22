use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use conditioning::markup::plain_text;
use conditioning::{
    load_config, load_deck, FontTypesetter, Painter, SlideRenderer, SlideView, Slideshow,
    Typesetter,
};

#[derive(Debug, Parser)]
#[command(name = "conditioning")]
#[command(about = "Affirmation slideshow with image and text directives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse an affirmation file and list its slides.
    Check {
        #[arg(long)]
        affirm: PathBuf,
    },
    /// Paint every slide, fully revealed, to slide-NNN.png files.
    Render {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        affirm: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Window size; defaults to the configured screen size.
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
    },
    /// Drive the slideshow with commands read from stdin.
    Play {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        affirm: PathBuf,
        /// Rewrite this PNG with the painted frame on every repaint.
        #[arg(long)]
        frame: Option<PathBuf>,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("conditioning=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = option_env!("CONDITIONING_GIT_HASH").unwrap_or("unknown"),
        "conditioning starting"
    );

    match cli.command {
        Commands::Check { affirm } => run_check(&affirm),
        Commands::Render {
            config,
            affirm,
            out,
            width,
            height,
        } => run_render(&config, &affirm, &out, width, height),
        Commands::Play {
            config,
            affirm,
            frame,
            width,
            height,
        } => run_play(&config, &affirm, frame.as_deref(), width, height),
    }
}

fn run_check(affirm: &Path) -> Result<()> {
    let deck = load_deck(affirm)?;

    println!("OK: {} ({} slides)", affirm.display(), deck.len());
    println!("Title: {}", deck.title);
    for (index, affirmation) in deck.affirmations.iter().enumerate() {
        let mut line = format!("{:>3}: {}", index + 1, affirmation.message);
        if affirmation.has_image() {
            let image = &affirmation.image;
            line.push_str(&format!(
                " [image {} at {},{} x{}]",
                image.filename, image.offset_x, image.offset_y, image.scale
            ));
        }
        let text = &affirmation.text;
        if text.dark || text.offset_x != 0 || text.offset_y != 0 || text.font_size != 0 {
            line.push_str(&format!(
                " [text {} at {},{} size {}]",
                if text.dark { "dark" } else { "light" },
                text.offset_x,
                text.offset_y,
                text.font_size
            ));
        }
        println!("{line}");
    }
    Ok(())
}

struct Session {
    slideshow: Slideshow,
    painter: Painter,
    width: u32,
    height: u32,
}

fn open_session(
    config_path: &Path,
    affirm: &Path,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<Session> {
    let config = load_config(config_path)?;
    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let typesetter: Arc<dyn Typesetter> =
        Arc::new(FontTypesetter::open(&config.font_path(config_dir))?);

    let width = width.unwrap_or(config.screen_width);
    let height = height.unwrap_or(config.screen_height);
    if width == 0 || height == 0 {
        bail!("invalid window size {width}x{height}");
    }

    let slideshow = Slideshow::new(config.clone(), affirm, Arc::clone(&typesetter))?;
    slideshow.load()?;
    let painter = Painter::new(SlideRenderer::new(config, typesetter));

    Ok(Session {
        slideshow,
        painter,
        width,
        height,
    })
}

fn run_render(
    config: &Path,
    affirm: &Path,
    out: &Path,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<()> {
    let session = open_session(config, affirm, width, height)?;
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;

    let count = session.slideshow.len();
    for index in 0..count {
        let Some(view) = session.slideshow.slide_view(index) else {
            break;
        };
        let frame = session
            .painter
            .paint_view(&view, session.width, session.height)?;
        let path = out.join(format!("slide-{:03}.png", index + 1));
        frame
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("rendered slide {}/{}", index + 1, count);
    }

    println!("Wrote {} slides to {}", count, out.display());
    Ok(())
}

/// Stdin commands, named after the keys of the windowed player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Left,
    Right,
    Space,
    Random,
    Reload,
    Next,
    Quit,
}

fn parse_key(line: &str) -> Option<Key> {
    match line.trim().to_ascii_lowercase().as_str() {
        "left" | "h" => Some(Key::Left),
        "right" | "" => Some(Key::Right),
        "space" | "s" => Some(Key::Space),
        "random" | "r" => Some(Key::Random),
        "reload" | "l" => Some(Key::Reload),
        "next" | "n" => Some(Key::Next),
        "quit" | "q" | "exit" => Some(Key::Quit),
        _ => None,
    }
}

enum UiEvent {
    Input(String),
    Repaint,
    Eof,
}

fn run_play(
    config: &Path,
    affirm: &Path,
    frame: Option<&Path>,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<()> {
    let session = open_session(config, affirm, width, height)?;
    let title = session.slideshow.title();
    println!("{}", session.slideshow.config().window_title(&title));

    let (events_tx, events_rx) = mpsc::channel();
    let stdin_tx = events_tx.clone();
    thread::Builder::new()
        .name("conditioning-stdin".to_owned())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if stdin_tx.send(UiEvent::Input(line)).is_err() {
                    return;
                }
            }
            let _ = stdin_tx.send(UiEvent::Eof);
        })
        .context("failed to spawn stdin reader")?;

    repaint(&session, frame)?;
    for event in events_rx {
        match event {
            UiEvent::Input(line) => {
                let Some(key) = parse_key(&line) else {
                    warn!(input = %line.trim(), "unknown command");
                    continue;
                };
                match key {
                    Key::Left => session.slideshow.left(),
                    Key::Right => session.slideshow.right(),
                    Key::Next => session.slideshow.advance(),
                    Key::Random => {
                        let shuffled = session.slideshow.random_on_off();
                        println!("random {}", if shuffled { "on" } else { "off" });
                    }
                    Key::Reload => {
                        if let Err(error) = session.slideshow.load() {
                            warn!(error = %format!("{error:#}"), "reload failed; keeping current deck");
                        }
                    }
                    Key::Space => {
                        let tx = events_tx.clone();
                        let playing = session.slideshow.start_stop_slide_show(move || {
                            let _ = tx.send(UiEvent::Repaint);
                        })?;
                        println!("slideshow {}", if playing { "playing" } else { "paused" });
                    }
                    Key::Quit => break,
                }
                repaint(&session, frame)?;
            }
            UiEvent::Repaint => repaint(&session, frame)?,
            UiEvent::Eof => break,
        }
    }

    if session.slideshow.is_playing() {
        session.slideshow.start_stop_slide_show(|| {})?;
    }
    Ok(())
}

fn repaint(session: &Session, frame_path: Option<&Path>) -> Result<()> {
    let frame = session
        .painter
        .paint(&session.slideshow, session.width, session.height)?;

    match session.slideshow.display_text_image() {
        Some(view) => println!("{}", describe(&view, session.slideshow.len())),
        None => println!("(no affirmations)"),
    }

    if let Some(path) = frame_path {
        frame
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

fn describe(view: &SlideView, len: usize) -> String {
    let mut line = format!("[{}/{}]", view.index + 1, len);
    if let Some(image) = view.image() {
        line.push_str(&format!(" <{}>", image.path.display()));
    }
    if view.show_both {
        line.push(' ');
        line.push_str(&plain_text(&view.text().spans));
    }
    line
}
