use crate::chip::chip8::{
    constants::{CHIP8_CHARSET, CHIP8_CHARSET_OFFSET, CHIP8_MEMORY_SIZE},
    error::Chip8Error,
};

/// The 4096 bytes of main memory. Every access is checked against the
/// memory size; nothing wraps around.
#[derive(Clone)]
pub(super) struct Memory {
    bytes: [u8; CHIP8_MEMORY_SIZE],
}

impl Memory {
    /// Zeroed memory with the charset loaded at `CHIP8_CHARSET_OFFSET`.
    pub(super) fn new() -> Self {
        let mut bytes = [0; CHIP8_MEMORY_SIZE];
        let offset = CHIP8_CHARSET_OFFSET as usize;
        bytes[offset..offset + CHIP8_CHARSET.len()].copy_from_slice(&CHIP8_CHARSET);
        Memory { bytes }
    }

    /// Reads the big-endian instruction word at `address` and `address + 1`.
    pub(super) fn read_word(&self, address: u16) -> Result<u16, Chip8Error> {
        let bytes = self.read_slice(address, 2)?;
        Ok(u16::from(bytes[0]) << 8 | u16::from(bytes[1]))
    }

    /// Borrows `len` bytes starting at `address`. Fails without side effects
    /// if any byte of the range lies outside of memory.
    pub(super) fn read_slice(&self, address: u16, len: usize) -> Result<&[u8], Chip8Error> {
        let range = Self::checked_range(address, len)?;
        Ok(&self.bytes[range])
    }

    /// Copies `data` into memory starting at `address`. Either all bytes are
    /// written or, if the range does not fit, none are.
    pub(super) fn write_slice(&mut self, address: u16, data: &[u8]) -> Result<(), Chip8Error> {
        let range = Self::checked_range(address, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    fn checked_range(address: u16, len: usize) -> Result<std::ops::Range<usize>, Chip8Error> {
        let start = address as usize;
        let end = start + len;
        if end > CHIP8_MEMORY_SIZE {
            // report the first byte that does not exist
            return Err(Chip8Error::OutOfBoundsAddress {
                address: start.max(CHIP8_MEMORY_SIZE),
            });
        }
        Ok(start..end)
    }
}
