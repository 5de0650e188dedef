use crate::chip::{
    chip8::{
        constants::{CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH},
        Chip8,
    },
    Chip, ChipWithCursiveDisplay,
};

use cursive::{
    theme::{BaseColor, Color, ColorStyle},
    view::View,
    CbSink, Cursive, Printer, Vec2,
};

/// Name under which the display is registered in the cursive view tree.
pub const DISPLAY_NAME: &str = "chip8-display";

/// Terminal cells used for one CHIP-8 pixel. Terminal cells are about twice
/// as tall as they are wide, so two of them make a square-ish pixel.
const CELLS_PER_PIXEL: usize = 2;

/// Represents the display of the Chip 8
pub struct Display {
    pixels: [bool; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT],
}

impl Display {
    /// Creates a new display from a slice.
    ///
    /// # Panics
    /// If `pixels` does not hold exactly one entry per pixel.
    pub fn new(pixels: &[bool]) -> Self {
        let mut display = Display::default();
        display.set_pixels(pixels);
        display
    }

    /// Replaces the displayed pixels.
    pub fn set_pixels(&mut self, pixels: &[bool]) {
        assert_eq!(pixels.len(), CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT);
        self.pixels.copy_from_slice(pixels);
    }
}

impl Default for Display {
    fn default() -> Self {
        Display {
            pixels: [false; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT],
        }
    }
}

/// Implements cursive::view::View for Display to enable drawing it
/// as a View out of the box.
impl View for Display {
    fn draw(&self, printer: &Printer) {
        let cell = " ".repeat(CELLS_PER_PIXEL);
        printer.with_color(
            ColorStyle::new(Color::Dark(BaseColor::Black), Color::Light(BaseColor::White)),
            |printer| {
                for y in 0..CHIP8_DISPLAY_HEIGHT {
                    for x in 0..CHIP8_DISPLAY_WIDTH {
                        if self.pixels[x + CHIP8_DISPLAY_WIDTH * y] {
                            printer.print((x * CELLS_PER_PIXEL, y), &cell);
                        }
                    }
                }
            },
        );
    }

    fn required_size(&mut self, _: Vec2) -> Vec2 {
        Vec2::new(
            CHIP8_DISPLAY_WIDTH * CELLS_PER_PIXEL,
            CHIP8_DISPLAY_HEIGHT,
        )
    }
}

impl ChipWithCursiveDisplay for Chip8 {
    fn update_ui(&mut self, gfx_sink: &CbSink) {
        if !self.needs_redraw() {
            return;
        }

        let pixels = self.read_output_pins().to_vec();
        let sent = gfx_sink.send(Box::new(move |s: &mut Cursive| {
            s.call_on_name(DISPLAY_NAME, |display: &mut Display| {
                display.set_pixels(&pixels)
            });
        }));

        match sent {
            Ok(()) => self.clear_redraw(),
            Err(_) => log::debug!("display update dropped, the UI is gone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_size_scales_width() {
        let mut display = Display::default();
        assert_eq!(display.required_size(Vec2::new(0, 0)), Vec2::new(128, 32));
    }

    #[test]
    fn test_update_ui_sends_only_when_dirty() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut chip8 = Chip8::new();

        chip8.update_ui(&sender);
        assert!(receiver.try_recv().is_err());

        chip8.output_pins.toggle(1, 1);
        chip8.update_ui(&sender);
        assert!(receiver.try_recv().is_ok());
        assert!(!chip8.needs_redraw());

        chip8.update_ui(&sender);
        assert!(receiver.try_recv().is_err());
    }
}
