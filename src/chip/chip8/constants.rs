/// Size of the main memory in bytes.
pub const CHIP8_MEMORY_SIZE: usize = 4096;

/// Address at which programs are loaded and execution starts.
pub const CHIP8_PROGRAM_OFFSET: u16 = 0x200;

/// The largest program that fits between `CHIP8_PROGRAM_OFFSET` and the end of memory.
pub const CHIP8_MAX_PROGRAM_SIZE: usize = CHIP8_MEMORY_SIZE - CHIP8_PROGRAM_OFFSET as usize;

pub const CHIP8_REGISTER_COUNT: usize = 16;

/// VF, written by every instruction that defines a carry, borrow or collision flag.
pub const CHIP8_FLAG_REGISTER: usize = 0xF;

pub const CHIP8_STACK_SIZE: usize = 16;

pub const CHIP8_KEY_COUNT: usize = 16;

pub const CHIP8_DISPLAY_WIDTH: usize = 64;

pub const CHIP8_DISPLAY_HEIGHT: usize = 32;

pub const CHIP8_CHARSET_OFFSET: u16 = 0x00;

/// Each glyph of the charset is 5 rows of 8 pixels.
pub const CHIP8_CHARSET_GLYPH_LEN: u16 = 5;

pub const CHIP8_CHARSET_LEN: u16 = 0x50; // 80

pub const CHIP8_CHARSET: [u8; CHIP8_CHARSET_LEN as usize] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Frequency of the delay and sound timers.
pub const CHIP8_TIMER_FREQUENCY: u32 = 60;

/// Frequency at which a host samples the display.
pub const CHIP8_REFRESH_FREQUENCY: u32 = 60;

/// Instruction rate used when the host does not configure one.
pub const CHIP8_DEFAULT_CYCLES_PER_SECOND: u32 = 700;
