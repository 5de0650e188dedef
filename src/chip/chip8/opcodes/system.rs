use crate::chip::chip8::{error::Chip8Error, util, Chip8};

/// 0nnn: machine code routines do not exist on an interpreter, so the call is
/// stepped over.
pub(super) fn sys(state: &mut Chip8, address: u16) {
    log::debug!(
        "ignoring SYS {:#05X} at {:#05X}",
        address,
        state.program_counter
    );
    util::increment_program_counter(state);
}

/// 00E0
pub(super) fn cls(state: &mut Chip8) {
    state.output_pins.clear();
    util::increment_program_counter(state);
}

/// 00EE: the popped address already points behind the CALL.
pub(super) fn ret(state: &mut Chip8) -> Result<(), Chip8Error> {
    state.program_counter = state.stack.pop(state.program_counter)?;
    Ok(())
}
