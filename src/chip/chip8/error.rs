use thiserror::Error;

/// Faults raised while executing a program.
///
/// `UnknownInstruction` is recoverable: the engine logs it, steps over the
/// offending word and keeps going. Every other variant halts the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Chip8Error {
    #[error("unknown instruction {opcode:#06X}")]
    UnknownInstruction { opcode: u16 },

    #[error("stack overflow: CALL at {pc:#05X} with all return slots in use")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: RET at {pc:#05X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("memory access out of bounds at address {address:#06X}")]
    OutOfBoundsAddress { address: usize },
}

impl Chip8Error {
    /// Whether execution may continue after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Chip8Error::UnknownInstruction { .. })
    }
}
