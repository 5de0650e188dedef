use crate::chip::chip8::constants::{CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH};

/// The 64x32 monochrome output pins. Pixel (x, y) lives at index `x + y * 64`.
#[derive(Clone)]
pub(super) struct Framebuffer {
    pixels: [bool; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT],

    /// Set whenever a pixel changes, cleared by the host after it redrew.
    dirty: bool,
}

impl Framebuffer {
    pub(super) fn new() -> Self {
        Framebuffer {
            pixels: [false; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT],
            dirty: false,
        }
    }

    pub(super) fn clear(&mut self) {
        self.pixels = [false; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT];
        self.dirty = true;
    }

    /// Flips the pixel at (x, y), wrapping both coordinates around the screen
    /// edges. Returns true if the pixel was lit before, i.e. it got erased.
    pub(super) fn toggle(&mut self, x: usize, y: usize) -> bool {
        let pos = translate(x, y);
        let was_set = self.pixels[pos];
        self.pixels[pos] = !was_set;
        self.dirty = true;
        was_set
    }

    #[cfg(test)]
    pub(super) fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[translate(x, y)]
    }

    pub(super) fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    pub(super) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(super) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

fn translate(x: usize, y: usize) -> usize {
    (x % CHIP8_DISPLAY_WIDTH) + (y % CHIP8_DISPLAY_HEIGHT) * CHIP8_DISPLAY_WIDTH
}
