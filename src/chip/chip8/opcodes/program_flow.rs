use crate::chip::chip8::{error::Chip8Error, util, Chip8};

/// 1nnn
pub(super) fn jp(state: &mut Chip8, address: u16) {
    state.program_counter = address;
}

/// 2nnn: pushes the address of the instruction following the CALL.
pub(super) fn call(state: &mut Chip8, address: u16) -> Result<(), Chip8Error> {
    let pc = state.program_counter;
    state.stack.push(pc.wrapping_add(2), pc)?;
    state.program_counter = address;
    Ok(())
}

/// 3xkk
pub(super) fn se_byte(state: &mut Chip8, x: u8, byte: u8) {
    let condition = state.registers[x as usize] == byte;
    util::conditional_skip(state, condition);
}

/// 4xkk
pub(super) fn sne_byte(state: &mut Chip8, x: u8, byte: u8) {
    let condition = state.registers[x as usize] != byte;
    util::conditional_skip(state, condition);
}

/// 5xy0
pub(super) fn se_reg(state: &mut Chip8, x: u8, y: u8) {
    let condition = state.registers[x as usize] == state.registers[y as usize];
    util::conditional_skip(state, condition);
}

/// 9xy0
pub(super) fn sne_reg(state: &mut Chip8, x: u8, y: u8) {
    let condition = state.registers[x as usize] != state.registers[y as usize];
    util::conditional_skip(state, condition);
}

/// Bnnn: the target is validated when it is fetched.
pub(super) fn jp_v0(state: &mut Chip8, address: u16) {
    state.program_counter = address.wrapping_add(state.registers[0] as u16);
}

/// Ex9E
pub(super) fn skp(state: &mut Chip8, x: u8) {
    let condition = state.is_key_pressed(state.registers[x as usize]);
    util::conditional_skip(state, condition);
}

/// ExA1
pub(super) fn sknp(state: &mut Chip8, x: u8) {
    let condition = !state.is_key_pressed(state.registers[x as usize]);
    util::conditional_skip(state, condition);
}
