use rand::Rng;

use crate::order::slide_order;

/// Which slide is up, how much of it shows, and where auto-play goes next.
///
/// Slides are two-phase: a slide with an image is first shown alone
/// (`reveal_both == false`) and then with its text. Slides without an image
/// always show their text. Callers pass the deck length and a "has image"
/// lookup so this type stays independent of what a slide is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playback {
    active: usize,
    reveal_both: bool,
    shuffled: bool,
    order: Vec<usize>,
    position: usize,
}

impl Playback {
    pub fn new() -> Self {
        Self {
            active: 0,
            reveal_both: false,
            shuffled: false,
            order: Vec::new(),
            position: 0,
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn reveal_both(&self) -> bool {
        self.reveal_both
    }

    pub fn shuffled(&self) -> bool {
        self.shuffled
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Adopts a freshly loaded deck: keeps the active slide when it still
    /// exists (else the last one), restarts the auto-play order, and shows
    /// the active slide image-first.
    pub fn reload<R: Rng + ?Sized>(
        &mut self,
        len: usize,
        has_image: impl Fn(usize) -> bool,
        rng: &mut R,
    ) {
        self.active = self.active.min(len.saturating_sub(1));
        self.reveal_both = len > 0 && !has_image(self.active);
        self.order = slide_order(len, self.shuffled, self.active, rng);
        self.position = 0;
    }

    /// Steps backwards: hides the text of an image slide, otherwise moves to
    /// the previous slide (wrapping) and shows it in full.
    pub fn left(&mut self, len: usize, has_image: impl Fn(usize) -> bool) {
        if len == 0 {
            return;
        }
        if self.reveal_both && has_image(self.active) {
            self.reveal_both = false;
            return;
        }

        self.active = if self.active == 0 {
            len - 1
        } else {
            self.active - 1
        };
        self.reveal_both = true;
    }

    /// Steps forwards: reveals the text over the current image, otherwise
    /// moves to the next slide (wrapping), image-first when it has one.
    pub fn right(&mut self, len: usize, has_image: impl Fn(usize) -> bool) {
        if len == 0 {
            return;
        }
        if !self.reveal_both {
            self.reveal_both = true;
            return;
        }

        self.active = if self.active + 1 >= len {
            0
        } else {
            self.active + 1
        };
        if has_image(self.active) {
            self.reveal_both = false;
        }
    }

    /// Flips shuffle mode. The running order is left alone; the new mode
    /// applies from the next regeneration.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffled = !self.shuffled;
        self.shuffled
    }

    /// Moves auto-play one slide on, starting a new order once the current
    /// one is used up.
    pub fn advance<R: Rng + ?Sized>(&mut self, len: usize, rng: &mut R) {
        if len == 0 {
            return;
        }
        if self.position + 1 >= self.order.len() {
            self.order = slide_order(len, self.shuffled, self.active, rng);
            self.position = 0;
        } else {
            self.position += 1;
        }
        self.active = self.order[self.position];
    }
}

impl Default for Playback {
    fn default() -> Self {
        Self::new()
    }
}
