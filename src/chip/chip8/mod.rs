/// CHIP-8 constants.
pub mod constants;
/// Cursive display output.
pub mod cursive_display;
/// Runtime faults.
mod error;
/// The 64x32 pixel output.
mod framebuffer;
/// Bounds-checked main memory.
mod memory;
/// Decoding of opcodes and their execution.
mod opcodes;
/// Return address stack for subroutine calls.
mod stack;
/// Convenience functions for modification of the CHIP-8 state.
mod util;

#[cfg(test)]
mod tests;

use std::fs;

use rand::{rngs::StdRng, SeedableRng};

use crate::chip::{
    chip8::{
        constants::{
            CHIP8_KEY_COUNT, CHIP8_MAX_PROGRAM_SIZE, CHIP8_PROGRAM_OFFSET, CHIP8_REGISTER_COUNT,
        },
        framebuffer::Framebuffer,
        memory::Memory,
        opcodes::Opcode,
        stack::Stack,
    },
    Chip, CycleOutcome, LoadProgramError,
};

pub use error::Chip8Error;
pub use opcodes::{decode, Instruction};

/// Represents the state of the CHIP-8.
pub struct Chip8 {
    /// 4096 bytes of main memory, the charset living in its first 80 bytes.
    memory: Memory,

    /// 16 registers where each can store one byte. The last one, VF, doubles
    /// as the flag register.
    registers: [u8; CHIP8_REGISTER_COUNT],

    /// An index register
    index: u16,

    /// A program counter
    program_counter: u16,

    /// The output pins. Note that those are usually directly wired
    /// up to the pixels of the display. However, given that this implementation
    /// considers a display as optional, we refer to them as output_pins for
    /// the sake of generality.
    output_pins: Framebuffer,

    /// The delay timer, decremented on every tick of the timer clock.
    delay_timer: u8,

    /// The sound timer, decremented on every tick of the timer clock. A tone
    /// plays while it is non-zero.
    sound_timer: u8,

    /// The input pins. Note that those input pins are usually directly wired
    /// up to the keys. However, we do not prescribe how this is handled and
    /// hence refer to them as input pins rather than as keys.
    input_pins: [bool; CHIP8_KEY_COUNT],

    /// A stack. Note that there are no instructions allowing to modify the
    /// stack and it is only used to store return addresses for the return
    /// opcode.
    stack: Stack,

    /// Source of the random bytes of the RND instruction.
    rng: StdRng,

    /// The fault that stopped execution, if any. Cleared by a reset.
    halted: Option<Chip8Error>,
}

impl Chip for Chip8 {
    /// The CHIP-8's pins can actually be addressed by using just half a byte.
    /// However, we use a whole byte here and assert whether it is in the right
    /// range, because it is more convenient to handle.
    type PinAddress = u8;

    /// A CHIP-8 memory address is in the range between 0 and 4096 (exclusive). We
    /// represent it using a u16 and check the range on every access.
    type MemoryAddress = u16;

    type Fault = Chip8Error;

    fn load_program(&mut self, path: &str) -> Result<usize, LoadProgramError> {
        let buffer = fs::read(path).map_err(|source| LoadProgramError::CouldNotReadFile {
            path: path.to_string(),
            source,
        })?;

        self.load_program_bytes(&buffer)?;

        Ok(buffer.len())
    }

    fn cycle(&mut self) -> Result<CycleOutcome, Chip8Error> {
        if let Some(fault) = &self.halted {
            return Err(fault.clone());
        }

        match self.step() {
            Ok(outcome) => Ok(outcome),
            Err(fault) => {
                log::debug!("halting at {:#05X}: {}", self.program_counter, fault);
                self.halted = Some(fault.clone());
                Err(fault)
            }
        }
    }

    fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    fn reset(&mut self) {
        log::debug!("resetting");
        let rng = self.rng.clone();
        *self = Chip8::with_rng(rng);
        // the host still shows the old screen
        self.output_pins.clear();
    }

    fn program_counter(&self) -> u16 {
        self.program_counter
    }

    fn read_output_pins(&self) -> &[bool] {
        self.output_pins.pixels()
    }

    fn needs_redraw(&self) -> bool {
        self.output_pins.is_dirty()
    }

    fn clear_redraw(&mut self) {
        self.output_pins.clear_dirty();
    }

    fn tone_active(&self) -> bool {
        self.sound_timer > 0
    }

    fn set_input_pin(&mut self, pin: u8, value: bool) {
        assert!(pin & 0x0F == pin, "input pin {:#X} does not exist", pin);
        self.input_pins[pin as usize] = value;
    }

    fn reset_input_pins(&mut self) {
        self.input_pins = [false; CHIP8_KEY_COUNT];
    }
}

impl Chip8 {
    /// Constructs a new CHIP-8 ready for its first execution cycle: memory is
    /// zeroed except for the font copied from `CHIP8_CHARSET`, the program
    /// counter is 0x200 and the RND generator is seeded from entropy. No
    /// program is loaded.
    pub fn new() -> Self {
        Chip8::with_rng(StdRng::from_entropy())
    }

    /// Like `new`, but the RND instruction draws from a generator seeded with
    /// `seed`, making runs reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Chip8::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Chip8 {
            memory: Memory::new(),
            registers: [0; CHIP8_REGISTER_COUNT],
            index: 0,
            program_counter: CHIP8_PROGRAM_OFFSET,
            output_pins: Framebuffer::new(),
            delay_timer: 0,
            sound_timer: 0,
            input_pins: [false; CHIP8_KEY_COUNT],
            stack: Stack::new(),
            rng,
            halted: None,
        }
    }

    /// Loads a program from a slice into memory at `CHIP8_PROGRAM_OFFSET`.
    ///
    /// # Errors
    /// `ProgramTooLarge` if the program does not fit into memory, in which
    /// case memory is left untouched.
    pub fn load_program_bytes(&mut self, program: &[u8]) -> Result<(), LoadProgramError> {
        if program.len() > CHIP8_MAX_PROGRAM_SIZE {
            return Err(LoadProgramError::ProgramTooLarge {
                size: program.len(),
                max_size: CHIP8_MAX_PROGRAM_SIZE,
            });
        }

        self.memory
            .write_slice(CHIP8_PROGRAM_OFFSET, program)
            .map_err(|_| LoadProgramError::ProgramTooLarge {
                size: program.len(),
                max_size: CHIP8_MAX_PROGRAM_SIZE,
            })?;
        log::debug!("loaded program of {} bytes", program.len());
        Ok(())
    }

    /// The fault that halted the machine, if it is halted.
    pub fn halt_reason(&self) -> Option<&Chip8Error> {
        self.halted.as_ref()
    }

    /// Fetches the next instruction based on the current state of self.program_counter.
    ///
    /// # Errors
    /// In case `self.program_counter` points to an address which would lead to loading
    /// bytes from invalid memory addresses.
    fn next_instruction(&self) -> Result<Opcode, Chip8Error> {
        self.memory
            .read_word(self.program_counter)
            .map(Opcode::from)
    }

    /// One fetch, decode and execute cycle. Unknown instructions are stepped
    /// over, any other fault is returned to the caller.
    fn step(&mut self) -> Result<CycleOutcome, Chip8Error> {
        let pc = self.program_counter;
        let opcode = self.next_instruction()?;

        let instruction = match Instruction::try_from(opcode) {
            Ok(instruction) => instruction,
            Err(fault) if !fault.is_fatal() => {
                log::warn!("skipping at {:#05X}: {}", pc, fault);
                util::increment_program_counter(self);
                return Ok(CycleOutcome::SkippedUnknown(opcode.word()));
            }
            Err(fault) => return Err(fault),
        };

        log::trace!(
            "{:#05X}: {} {:<16} I={:#05X} sp={}",
            pc,
            opcode,
            instruction.to_string(),
            self.index,
            self.stack.pointer()
        );
        instruction.execute(self)?;

        match instruction {
            Instruction::LdVxK { .. } if self.program_counter == pc => {
                Ok(CycleOutcome::AwaitingInput)
            }
            _ => Ok(CycleOutcome::Executed),
        }
    }

    /// Keys are addressed by the low nibble of `key`.
    fn is_key_pressed(&self, key: u8) -> bool {
        self.input_pins[(key & 0x0F) as usize]
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Chip8::new()
    }
}
