pub mod chip8;
/// Pacing of instruction cycles, timer ticks and display refreshes.
pub mod clock;

use cursive::CbSink;
use thiserror::Error;

/// What the host learns from a single, successful execution cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// An instruction was decoded and executed.
    Executed,

    /// The word at the program counter did not decode to any instruction.
    /// It was stepped over and execution continues with the next one.
    SkippedUnknown(u16),

    /// The chip is waiting for an input pin to be set. The program counter
    /// was not advanced, so the same instruction runs again next cycle.
    AwaitingInput,
}

/// Errors that can occur while loading a program into a chip.
#[derive(Debug, Error)]
pub enum LoadProgramError {
    #[error("could not read program from {path}: {source}")]
    CouldNotReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("program is too large ({size} bytes), at most {max_size} bytes fit into memory")]
    ProgramTooLarge { size: usize, max_size: usize },
}

/// The interface a host uses to drive an emulated chip. The host owns the
/// clocks: it decides when to `cycle`, when to `tick_timers` and when to
/// read the output pins.
pub trait Chip {
    /// Type used to address a single input pin.
    type PinAddress;

    /// Type of an address in the chip's memory.
    type MemoryAddress;

    /// Fatal error raised by a cycle. Once raised, the chip stays halted until reset.
    type Fault: std::error::Error;

    /// Loads the program stored in the file at `path` and returns its size in bytes.
    fn load_program(&mut self, path: &str) -> Result<usize, LoadProgramError>;

    /// Runs one fetch, decode and execute cycle.
    fn cycle(&mut self) -> Result<CycleOutcome, Self::Fault>;

    /// Advances the chip's timers by one tick of the timer clock.
    fn tick_timers(&mut self);

    /// Puts the chip back into its power-on state.
    fn reset(&mut self);

    /// The current value of the program counter.
    fn program_counter(&self) -> Self::MemoryAddress;

    fn read_output_pins(&self) -> &[bool];

    /// Whether the output pins changed since `clear_redraw` was last called.
    fn needs_redraw(&self) -> bool;

    fn clear_redraw(&mut self);

    /// Whether the chip currently wants a tone to be played.
    fn tone_active(&self) -> bool;

    fn set_input_pin(&mut self, pin: Self::PinAddress, value: bool);

    fn reset_input_pins(&mut self);
}

/// A chip that can push its output pins to a cursive user interface.
pub trait ChipWithCursiveDisplay {
    /// Sends a snapshot of the output pins to the UI thread behind `gfx_sink`
    /// if they changed since the last update.
    fn update_ui(&mut self, gfx_sink: &CbSink);
}
