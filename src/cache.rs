use std::collections::HashMap;

/// Painted slides keyed by index, valid for one viewport size.
///
/// Touching the cache with a different size drops every entry first, so the
/// map never mixes frames painted for two sizes.
#[derive(Debug, Clone)]
pub struct RenderCache<B> {
    width: u32,
    height: u32,
    slides: HashMap<usize, B>,
}

impl<B: Clone> RenderCache<B> {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            slides: HashMap::new(),
        }
    }

    pub fn get(&mut self, index: usize, width: u32, height: u32) -> Option<B> {
        self.resize(width, height);
        self.slides.get(&index).cloned()
    }

    pub fn put(&mut self, index: usize, width: u32, height: u32, bitmap: B) {
        self.resize(width, height);
        self.slides.insert(index, bitmap);
    }

    pub fn clear(&mut self) {
        self.slides.clear();
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.slides.clear();
    }
}

impl<B: Clone> Default for RenderCache<B> {
    fn default() -> Self {
        Self::new()
    }
}
