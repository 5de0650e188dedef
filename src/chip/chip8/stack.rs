use crate::chip::chip8::{constants::CHIP8_STACK_SIZE, error::Chip8Error};

/// The call stack. There are no instructions to manipulate it directly; it
/// only stores return addresses for CALL and RET.
#[derive(Clone)]
pub(super) struct Stack {
    slots: [u16; CHIP8_STACK_SIZE],

    /// Index of the next free slot. Never advanced past the last slot index.
    pointer: u8,
}

impl Stack {
    pub(super) fn new() -> Self {
        Stack {
            slots: [0; CHIP8_STACK_SIZE],
            pointer: 0,
        }
    }

    /// Pushes a return address. `pc` is the address of the CALL, used for reporting.
    pub(super) fn push(&mut self, return_address: u16, pc: u16) -> Result<(), Chip8Error> {
        if self.pointer as usize >= CHIP8_STACK_SIZE - 1 {
            return Err(Chip8Error::StackOverflow { pc });
        }
        self.slots[self.pointer as usize] = return_address;
        self.pointer += 1;
        Ok(())
    }

    /// Pops the most recently pushed return address. `pc` is the address of the RET.
    pub(super) fn pop(&mut self, pc: u16) -> Result<u16, Chip8Error> {
        if self.pointer == 0 {
            return Err(Chip8Error::StackUnderflow { pc });
        }
        self.pointer -= 1;
        Ok(self.slots[self.pointer as usize])
    }

    pub(super) fn pointer(&self) -> u8 {
        self.pointer
    }

    #[cfg(test)]
    pub(super) fn peek(&self) -> Option<u16> {
        self.pointer
            .checked_sub(1)
            .map(|top| self.slots[top as usize])
    }
}
