use crate::chip::chip8::{constants::CHIP8_FLAG_REGISTER, Chip8};

/// Skips the next instruction if `condition` holds, otherwise just moves on to it.
pub fn conditional_skip(state: &mut Chip8, condition: bool) {
    if condition {
        increment_program_counter(state);
    }
    increment_program_counter(state);
}

pub fn increment_program_counter(state: &mut Chip8) {
    state.program_counter = state.program_counter.wrapping_add(2);
}

/// Stores a result in Vx after setting VF, so that for x = F the result wins.
pub fn set_with_flag(state: &mut Chip8, x: u8, value: u8, flag: bool) {
    state.registers[CHIP8_FLAG_REGISTER] = flag as u8;
    state.registers[x as usize] = value;
}
