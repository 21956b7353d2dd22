//! Lightweight emphasis inside affirmation messages: `/italic/` and `*bold*`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

/// Splits a message into styled spans. Each `/` toggles italic and each `*`
/// toggles bold; a marker left open styles the rest of the message.
pub fn spans(message: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut bold = false;
    let mut italic = false;

    for ch in message.chars() {
        match ch {
            '/' | '*' => {
                if !current.is_empty() {
                    spans.push(Span {
                        text: std::mem::take(&mut current),
                        bold,
                        italic,
                    });
                }
                if ch == '/' {
                    italic = !italic;
                } else {
                    bold = !bold;
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        spans.push(Span {
            text: current,
            bold,
            italic,
        });
    }

    spans
}

/// The message with emphasis markers removed.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(|span| span.text.as_str()).collect()
}
