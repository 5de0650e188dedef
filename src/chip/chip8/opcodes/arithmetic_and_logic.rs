use rand::Rng;

use crate::chip::chip8::{
    constants::{
        CHIP8_CHARSET_GLYPH_LEN, CHIP8_CHARSET_OFFSET, CHIP8_FLAG_REGISTER, CHIP8_KEY_COUNT,
    },
    error::Chip8Error,
    util, Chip8,
};

/// Applies `f` to Vx and Vy, storing the value in Vx. If `f` also yields a
/// flag, VF is set to it before Vx is written.
fn modify_registers(state: &mut Chip8, x: u8, y: u8, f: fn(u8, u8) -> (u8, Option<bool>)) {
    let (value, flag) = f(state.registers[x as usize], state.registers[y as usize]);
    match flag {
        Some(flag) => util::set_with_flag(state, x, value, flag),
        None => state.registers[x as usize] = value,
    }
    util::increment_program_counter(state);
}

/// 6xkk
pub(super) fn ld_byte(state: &mut Chip8, x: u8, byte: u8) {
    state.registers[x as usize] = byte;
    util::increment_program_counter(state);
}

/// 7xkk: VF is left alone.
pub(super) fn add_byte(state: &mut Chip8, x: u8, byte: u8) {
    state.registers[x as usize] = state.registers[x as usize].wrapping_add(byte);
    util::increment_program_counter(state);
}

/// 8xy0
pub(super) fn ld_reg(state: &mut Chip8, x: u8, y: u8) {
    modify_registers(state, x, y, |_, vy| (vy, None));
}

/// 8xy1
pub(super) fn or(state: &mut Chip8, x: u8, y: u8) {
    modify_registers(state, x, y, |vx, vy| (vx | vy, None));
}

/// 8xy2
pub(super) fn and(state: &mut Chip8, x: u8, y: u8) {
    modify_registers(state, x, y, |vx, vy| (vx & vy, None));
}

/// 8xy3
pub(super) fn xor(state: &mut Chip8, x: u8, y: u8) {
    modify_registers(state, x, y, |vx, vy| (vx ^ vy, None));
}

/// 8xy4: VF = carry
pub(super) fn add_reg(state: &mut Chip8, x: u8, y: u8) {
    modify_registers(state, x, y, |vx, vy| {
        let (result, overflow) = vx.overflowing_add(vy);
        (result, Some(overflow))
    });
}

/// 8xy5: VF = Vx > Vy
pub(super) fn sub(state: &mut Chip8, x: u8, y: u8) {
    modify_registers(state, x, y, |vx, vy| (vx.wrapping_sub(vy), Some(vx > vy)));
}

/// 8xy6: VF = the bit shifted out
pub(super) fn shr(state: &mut Chip8, x: u8) {
    modify_registers(state, x, x, |vx, _| (vx >> 1, Some(vx & 0x01 != 0)));
}

/// 8xy7: VF = Vy > Vx
pub(super) fn subn(state: &mut Chip8, x: u8, y: u8) {
    modify_registers(state, x, y, |vx, vy| (vy.wrapping_sub(vx), Some(vy > vx)));
}

/// 8xyE: VF = the bit shifted out
pub(super) fn shl(state: &mut Chip8, x: u8) {
    modify_registers(state, x, x, |vx, _| (vx << 1, Some(vx & 0x80 != 0)));
}

/// Annn
pub(super) fn ld_i(state: &mut Chip8, address: u16) {
    state.index = address;
    util::increment_program_counter(state);
}

/// Cxkk
pub(super) fn rnd(state: &mut Chip8, x: u8, byte: u8) {
    let sample: u8 = state.rng.gen();
    state.registers[x as usize] = sample & byte;
    util::increment_program_counter(state);
}

/// Dxyn: XORs the n bytes at I onto the screen at (Vx, Vy). VF reports
/// whether any lit pixel got erased.
pub(super) fn drw(state: &mut Chip8, x: u8, y: u8, n: u8) -> Result<(), Chip8Error> {
    let x = state.registers[x as usize] as usize;
    let y = state.registers[y as usize] as usize;

    // fetch the whole sprite first so a bad I faults before the screen changes
    let mut sprite = [0u8; 0xF];
    let rows = n as usize;
    sprite[..rows].copy_from_slice(state.memory.read_slice(state.index, rows)?);

    let mut collision = false;
    for (y_pos, &pixel_byte) in sprite[..rows].iter().enumerate() {
        let mut pixel_mask: u8 = 0x80;
        for x_pos in 0..8 {
            if pixel_byte & pixel_mask != 0 {
                collision |= state.output_pins.toggle(x + x_pos, y + y_pos);
            }
            pixel_mask >>= 1;
        }
    }

    state.registers[CHIP8_FLAG_REGISTER] = collision as u8;
    util::increment_program_counter(state);
    Ok(())
}

/// Fx07
pub(super) fn ld_vx_dt(state: &mut Chip8, x: u8) {
    state.registers[x as usize] = state.delay_timer;
    util::increment_program_counter(state);
}

/// Fx0A: without a pressed key the program counter stays put, so the
/// instruction is fetched again on the next cycle.
pub(super) fn ld_vx_k(state: &mut Chip8, x: u8) {
    if let Some(key) = (0..CHIP8_KEY_COUNT).find(|&key| state.input_pins[key]) {
        state.registers[x as usize] = key as u8;
        util::increment_program_counter(state);
    }
}

/// Fx15
pub(super) fn ld_dt_vx(state: &mut Chip8, x: u8) {
    state.delay_timer = state.registers[x as usize];
    util::increment_program_counter(state);
}

/// Fx18
pub(super) fn ld_st_vx(state: &mut Chip8, x: u8) {
    state.sound_timer = state.registers[x as usize];
    util::increment_program_counter(state);
}

/// Fx1E: VF is left alone.
pub(super) fn add_i_vx(state: &mut Chip8, x: u8) {
    state.index = state.index.wrapping_add(state.registers[x as usize] as u16);
    util::increment_program_counter(state);
}

/// Fx29
pub(super) fn ld_f_vx(state: &mut Chip8, x: u8) {
    let character = state.registers[x as usize] as u16;
    state.index = CHIP8_CHARSET_OFFSET + character * CHIP8_CHARSET_GLYPH_LEN;
    util::increment_program_counter(state);
}

/// Fx33
pub(super) fn ld_b_vx(state: &mut Chip8, x: u8) -> Result<(), Chip8Error> {
    let value = state.registers[x as usize];
    let digits = [value / 100, (value / 10) % 10, value % 10];
    state.memory.write_slice(state.index, &digits)?;
    util::increment_program_counter(state);
    Ok(())
}

/// Fx55: stores V0 through Vx, inclusive, starting at I.
pub(super) fn ld_i_vx(state: &mut Chip8, x: u8) -> Result<(), Chip8Error> {
    let count = x as usize + 1;
    state
        .memory
        .write_slice(state.index, &state.registers[..count])?;
    util::increment_program_counter(state);
    Ok(())
}

/// Fx65: fills V0 through Vx, inclusive, from I.
pub(super) fn ld_vx_i(state: &mut Chip8, x: u8) -> Result<(), Chip8Error> {
    let count = x as usize + 1;
    let bytes = state.memory.read_slice(state.index, count)?;
    state.registers[..count].copy_from_slice(bytes);
    util::increment_program_counter(state);
    Ok(())
}
