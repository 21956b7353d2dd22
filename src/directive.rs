//! The affirmation file format.
//!
//! ```text
//! // Morning routine            <- first comment before any content is the title
//!
//! I am calm [lake.jpg:0.8:0,-40 w:48:0,200]
//! I am steady [b]
//! ```
//!
//! The text between the first `[` and the next `[` (or the end of the line) is
//! a space-separated list of directives.
//! Image directives start with a filename (anything with a `.`), text
//! directives start with `b` (dark) or `w` (light). Segments after the head
//! are `:`-separated and may come in any order. When a line carries several
//! directives of one kind the last one wins. Malformed numbers are logged and
//! ignored; parsing never fails.

use tracing::warn;

use crate::affirmation::{Affirmation, ImageDirective, TextDirective};

/// Parses an affirmation file into its slides and title.
///
/// The title is empty when the file has no leading comment.
pub fn parse_affirmations(raw: &str) -> (Vec<Affirmation>, String) {
    let mut affirmations = Vec::new();
    let mut title = String::new();
    let mut seen_line = false;

    for line in raw.lines() {
        let line = line.trim();

        if line.starts_with("//") {
            if !seen_line {
                title = line.trim_start_matches('/').trim().to_owned();
            }
            seen_line = true;
            continue;
        }

        if line.is_empty() {
            continue;
        }

        affirmations.push(parse_affirmation_line(line));
        seen_line = true;
    }

    (affirmations, title)
}

fn parse_affirmation_line(line: &str) -> Affirmation {
    let (message, directives) = match line.split_once('[') {
        Some((message, directives)) => (message, Some(directives)),
        None => (line, None),
    };

    let mut affirmation = Affirmation {
        message: message.trim().to_owned(),
        ..Affirmation::default()
    };

    let Some(directives) = directives else {
        return affirmation;
    };

    // Only the first bracket group carries directives.
    let directives = directives.split('[').next().unwrap_or_default();
    for token in directives
        .trim_matches(|ch| ch == ' ' || ch == ']')
        .split(' ')
    {
        if let Some(image) = parse_image(token) {
            affirmation.image = image;
        }
        if let Some(text) = parse_text(token) {
            affirmation.text = text;
        }
    }

    affirmation
}

/// Parses `filename.ext[:scale][:x,y]`. Returns `None` when the head has no
/// extension.
pub fn parse_image(token: &str) -> Option<ImageDirective> {
    let mut segments = token.split(':');
    let filename = segments.next()?;
    if !filename.contains('.') {
        return None;
    }

    let mut image = ImageDirective {
        filename: filename.to_owned(),
        ..ImageDirective::default()
    };

    for segment in segments {
        if segment.contains(',') {
            if let Some((x, y)) = parse_offset(token, segment) {
                image.offset_x = x;
                image.offset_y = y;
            }
            continue;
        }

        match segment.parse::<f64>() {
            Ok(scale) => image.scale = scale,
            Err(error) => warn!(token, segment, %error, "ignoring unparsable image scale"),
        }
    }

    Some(image)
}

/// Parses `b|w[:font_size][:x,y]`. Returns `None` unless the head is exactly
/// `b` or `w`.
pub fn parse_text(token: &str) -> Option<TextDirective> {
    let mut segments = token.split(':');
    let dark = match segments.next()? {
        "b" => true,
        "w" => false,
        _ => return None,
    };

    let mut text = TextDirective {
        dark,
        ..TextDirective::default()
    };

    for segment in segments {
        if segment.contains(',') {
            if let Some((x, y)) = parse_offset(token, segment) {
                text.offset_x = x;
                text.offset_y = y;
            }
            continue;
        }

        match segment.parse::<u32>() {
            Ok(size) => text.font_size = size,
            Err(error) => warn!(token, segment, %error, "ignoring unparsable font size"),
        }
    }

    Some(text)
}

fn parse_offset(token: &str, segment: &str) -> Option<(i32, i32)> {
    let mut parts = segment.split(',');
    let x = parts.next().unwrap_or_default().parse::<i32>();
    let y = parts.next().unwrap_or_default().parse::<i32>();

    match (x, y) {
        (Ok(x), Ok(y)) => Some((x, y)),
        (x, y) => {
            if let Err(error) = x {
                warn!(token, segment, %error, "ignoring unparsable x offset");
            }
            if let Err(error) = y {
                warn!(token, segment, %error, "ignoring unparsable y offset");
            }
            None
        }
    }
}
