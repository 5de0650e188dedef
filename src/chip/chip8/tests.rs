use crate::chip::chip8::{Chip8, Chip8Error};
use crate::chip::{Chip, CycleOutcome, LoadProgramError};

fn prepare_state_with_program(instructions: &[u16]) -> Chip8 {
    let mut chip8 = Chip8::with_seed(0);
    let program: Vec<u8> = instructions
        .iter()
        .flat_map(|instruction| instruction.to_be_bytes())
        .collect();
    chip8.load_program_bytes(&program).unwrap();
    chip8
}

fn prepare_state_with_single_instruction(instruction: u16) -> Chip8 {
    prepare_state_with_program(&[instruction])
}

fn do_cycle(instruction: u16, before_cycle: fn(&mut Chip8), after_cycle: fn(&mut Chip8)) {
    let mut state = prepare_state_with_single_instruction(instruction);

    before_cycle(&mut state);
    assert_eq!(state.cycle(), Ok(CycleOutcome::Executed));
    after_cycle(&mut state);
}

#[test]
fn test_clear_screen() {
    do_cycle(
        0x00E0,
        |state| {
            state.output_pins.toggle(10, 10);
            state.clear_redraw();
        },
        |state| {
            assert!(state.read_output_pins().iter().all(|pixel| !pixel));
            assert!(state.needs_redraw());
            assert_eq!(state.program_counter, 0x202);
        },
    )
}

#[test]
fn test_sys_is_ignored() {
    do_cycle(
        0x0123,
        |_| {},
        |state| {
            assert_eq!(state.program_counter, 0x202);
        },
    )
}

#[test]
fn test_jump() {
    do_cycle(
        0x1CAF,
        |state| {
            assert_eq!(state.program_counter, 0x200);
        },
        |state| {
            assert_eq!(state.program_counter, 0xCAF);
        },
    )
}

#[test]
fn test_call() {
    do_cycle(
        0x2CAF,
        |state| {
            assert_eq!(state.program_counter, 0x200);
        },
        |state| {
            assert_eq!(state.program_counter, 0xCAF);
            assert_eq!(state.stack.pointer(), 1);
            assert_eq!(state.stack.peek(), Some(0x202));
        },
    )
}

#[test]
fn test_call_and_return() {
    // 0x200: CALL 0x300, 0x300: RET
    let mut state = prepare_state_with_single_instruction(0x2300);
    state.memory.write_slice(0x300, &[0x00, 0xEE]).unwrap();
    let sp = state.stack.pointer();

    assert_eq!(state.cycle(), Ok(CycleOutcome::Executed));
    assert_eq!(state.program_counter, 0x300);
    assert_eq!(state.stack.pointer(), sp + 1);

    assert_eq!(state.cycle(), Ok(CycleOutcome::Executed));
    assert_eq!(state.program_counter, 0x202);
    assert_eq!(state.stack.pointer(), sp);
}

#[test]
fn test_skip_if_equal() {
    do_cycle(
        0x34AF,
        |state| {
            state.registers[4] = 0xAF;
            assert_eq!(state.program_counter, 0x200);
        },
        |state| {
            assert_eq!(state.program_counter, 0x204);
        },
    );

    do_cycle(
        0x34BF,
        |state| {
            state.registers[4] = 0xAF;
            assert_eq!(state.program_counter, 0x200);
        },
        |state| {
            assert_eq!(state.program_counter, 0x202);
        },
    );
}

#[test]
fn test_skip_if_not_equal() {
    do_cycle(
        0x44BF,
        |state| {
            state.registers[4] = 0xAF;
        },
        |state| {
            assert_eq!(state.program_counter, 0x204);
        },
    );

    do_cycle(
        0x44AF,
        |state| {
            state.registers[4] = 0xAF;
        },
        |state| {
            assert_eq!(state.program_counter, 0x202);
        },
    );
}

#[test]
fn test_skip_if_registers_equal() {
    do_cycle(
        0x5120,
        |state| {
            state.registers[1] = 7;
            state.registers[2] = 7;
        },
        |state| {
            assert_eq!(state.program_counter, 0x204);
        },
    );

    do_cycle(
        0x5120,
        |state| {
            state.registers[1] = 7;
            state.registers[2] = 8;
        },
        |state| {
            assert_eq!(state.program_counter, 0x202);
        },
    );
}

#[test]
fn test_skip_if_registers_not_equal() {
    do_cycle(
        0x9120,
        |state| {
            state.registers[1] = 7;
            state.registers[2] = 8;
        },
        |state| {
            assert_eq!(state.program_counter, 0x204);
        },
    );

    do_cycle(
        0x9120,
        |state| {
            state.registers[1] = 7;
            state.registers[2] = 7;
        },
        |state| {
            assert_eq!(state.program_counter, 0x202);
        },
    );
}

#[test]
fn test_load_byte() {
    for x in 0..16u16 {
        for &kk in &[0x00u16, 0x01, 0x7F, 0xFF] {
            let mut state = prepare_state_with_single_instruction(0x6000 | x << 8 | kk);
            assert_eq!(state.cycle(), Ok(CycleOutcome::Executed));
            assert_eq!(state.registers[x as usize], kk as u8);
        }
    }
}

#[test]
fn test_add_byte_wraps_without_flag() {
    do_cycle(
        0x7AFF,
        |state| {
            state.registers[0xA] = 2;
            state.registers[0xF] = 0x55;
        },
        |state| {
            assert_eq!(state.registers[0xA], 1);
            assert_eq!(state.registers[0xF], 0x55);
        },
    )
}

#[test]
fn test_bitwise_operations() {
    do_cycle(
        0x8121,
        |state| {
            state.registers[1] = 0b1100;
            state.registers[2] = 0b1010;
        },
        |state| {
            assert_eq!(state.registers[1], 0b1110);
        },
    );

    do_cycle(
        0x8122,
        |state| {
            state.registers[1] = 0b1100;
            state.registers[2] = 0b1010;
        },
        |state| {
            assert_eq!(state.registers[1], 0b1000);
        },
    );

    do_cycle(
        0x8123,
        |state| {
            state.registers[1] = 0b1100;
            state.registers[2] = 0b1010;
        },
        |state| {
            assert_eq!(state.registers[1], 0b0110);
        },
    );

    do_cycle(
        0x8120,
        |state| {
            state.registers[2] = 0x99;
        },
        |state| {
            assert_eq!(state.registers[1], 0x99);
        },
    );
}

#[test]
fn test_add_registers() {
    do_cycle(
        0x8014,
        |state| {
            state.registers[0] = 0xFF;
            state.registers[1] = 0x01;
        },
        |state| {
            assert_eq!(state.registers[0], 0x00);
            assert_eq!(state.registers[0xF], 1);
        },
    );

    do_cycle(
        0x8014,
        |state| {
            state.registers[0] = 0x10;
            state.registers[1] = 0x01;
            state.registers[0xF] = 1;
        },
        |state| {
            assert_eq!(state.registers[0], 0x11);
            assert_eq!(state.registers[0xF], 0);
        },
    );
}

#[test]
fn test_sub_registers() {
    do_cycle(
        0x8015,
        |state| {
            state.registers[0] = 5;
            state.registers[1] = 3;
        },
        |state| {
            assert_eq!(state.registers[0], 2);
            assert_eq!(state.registers[0xF], 1);
        },
    );

    do_cycle(
        0x8015,
        |state| {
            state.registers[0] = 3;
            state.registers[1] = 5;
        },
        |state| {
            assert_eq!(state.registers[0], 254);
            assert_eq!(state.registers[0xF], 0);
        },
    );

    do_cycle(
        0x8017,
        |state| {
            state.registers[0] = 3;
            state.registers[1] = 5;
        },
        |state| {
            assert_eq!(state.registers[0], 2);
            assert_eq!(state.registers[0xF], 1);
        },
    );
}

#[test]
fn test_shifts() {
    do_cycle(
        0x8106,
        |state| {
            state.registers[1] = 0b0000_0101;
        },
        |state| {
            assert_eq!(state.registers[1], 0b0000_0010);
            assert_eq!(state.registers[0xF], 1);
        },
    );

    do_cycle(
        0x810E,
        |state| {
            state.registers[1] = 0b1000_0001;
        },
        |state| {
            assert_eq!(state.registers[1], 0b0000_0010);
            assert_eq!(state.registers[0xF], 1);
        },
    );

    do_cycle(
        0x810E,
        |state| {
            state.registers[1] = 0b0100_0000;
            state.registers[0xF] = 1;
        },
        |state| {
            assert_eq!(state.registers[1], 0b1000_0000);
            assert_eq!(state.registers[0xF], 0);
        },
    );
}

#[test]
fn test_result_wins_over_flag_in_vf() {
    do_cycle(
        0x8FE4,
        |state| {
            state.registers[0xF] = 200;
            state.registers[0xE] = 100;
        },
        |state| {
            assert_eq!(state.registers[0xF], 44);
        },
    )
}

#[test]
fn test_load_index_and_jump_with_offset() {
    do_cycle(
        0xA123,
        |_| {},
        |state| {
            assert_eq!(state.index, 0x123);
        },
    );

    do_cycle(
        0xB300,
        |state| {
            state.registers[0] = 0x10;
        },
        |state| {
            assert_eq!(state.program_counter, 0x310);
        },
    );
}

#[test]
fn test_random_is_masked() {
    do_cycle(
        0xC000,
        |state| {
            state.registers[0] = 0xAB;
        },
        |state| {
            assert_eq!(state.registers[0], 0);
        },
    );

    do_cycle(
        0xC00F,
        |_| {},
        |state| {
            assert_eq!(state.registers[0] & 0xF0, 0);
        },
    );
}

#[test]
fn test_random_is_reproducible_with_a_seed() {
    let mut first = prepare_state_with_single_instruction(0xC0FF);
    let mut second = prepare_state_with_single_instruction(0xC0FF);
    first.cycle().unwrap();
    second.cycle().unwrap();
    assert_eq!(first.registers[0], second.registers[0]);
}

#[test]
fn test_draw_collision() {
    // draw the "0" glyph twice at (0, 0)
    let mut state = prepare_state_with_program(&[0xD015, 0xD015]);
    state.index = 0;

    assert_eq!(state.cycle(), Ok(CycleOutcome::Executed));
    assert_eq!(state.registers[0xF], 0);
    assert!(state.needs_redraw());
    assert!((0..4).all(|x| state.output_pins.pixel(x, 0)));
    assert!(!state.output_pins.pixel(1, 1));
    assert!(state.output_pins.pixel(0, 1));

    state.clear_redraw();
    assert_eq!(state.cycle(), Ok(CycleOutcome::Executed));
    assert_eq!(state.registers[0xF], 1);
    assert!(state.needs_redraw());
    assert!(state.read_output_pins().iter().all(|pixel| !pixel));
}

#[test]
fn test_draw_wraps_around_the_edges() {
    do_cycle(
        0xD011,
        |state| {
            state.memory.write_slice(0x300, &[0b1010_0101]).unwrap();
            state.index = 0x300;
            state.registers[0] = 60;
            state.registers[1] = 31;
        },
        |state| {
            let row: Vec<bool> = [60, 61, 62, 63, 0, 1, 2, 3]
                .iter()
                .map(|&x| state.output_pins.pixel(x, 31))
                .collect();
            assert_eq!(
                row,
                vec![true, false, true, false, false, true, false, true]
            );
            assert_eq!(state.registers[0xF], 0);
        },
    );

    do_cycle(
        0xD012,
        |state| {
            state.memory.write_slice(0x300, &[0x80, 0x80]).unwrap();
            state.index = 0x300;
            state.registers[1] = 31;
        },
        |state| {
            assert!(state.output_pins.pixel(0, 31));
            assert!(state.output_pins.pixel(0, 0));
        },
    );
}

#[test]
fn test_draw_out_of_bounds_leaves_screen_untouched() {
    let mut state = prepare_state_with_single_instruction(0xD013);
    state.index = 0xFFE;

    assert_eq!(
        state.cycle(),
        Err(Chip8Error::OutOfBoundsAddress { address: 0x1000 })
    );
    assert!(!state.needs_redraw());
    assert!(state.read_output_pins().iter().all(|pixel| !pixel));
    assert_eq!(state.program_counter, 0x200);
}

#[test]
fn test_skip_on_key() {
    do_cycle(
        0xE19E,
        |state| {
            state.registers[1] = 0xA;
            state.set_input_pin(0xA, true);
        },
        |state| {
            assert_eq!(state.program_counter, 0x204);
        },
    );

    do_cycle(
        0xE19E,
        |state| {
            state.registers[1] = 0xA;
        },
        |state| {
            assert_eq!(state.program_counter, 0x202);
        },
    );

    do_cycle(
        0xE1A1,
        |state| {
            state.registers[1] = 0xA;
            state.set_input_pin(0xB, true);
        },
        |state| {
            assert_eq!(state.program_counter, 0x204);
        },
    );

    do_cycle(
        0xE1A1,
        |state| {
            state.registers[1] = 0xA;
            state.set_input_pin(0xA, true);
        },
        |state| {
            assert_eq!(state.program_counter, 0x202);
        },
    );
}

#[test]
fn test_wait_for_key_blocks() {
    let mut state = prepare_state_with_single_instruction(0xF30A);

    assert_eq!(state.cycle(), Ok(CycleOutcome::AwaitingInput));
    assert_eq!(state.program_counter, 0x200);
    assert_eq!(state.cycle(), Ok(CycleOutcome::AwaitingInput));
    assert_eq!(state.program_counter, 0x200);

    state.set_input_pin(0xB, true);
    assert_eq!(state.cycle(), Ok(CycleOutcome::Executed));
    assert_eq!(state.registers[3], 0xB);
    assert_eq!(state.program_counter, 0x202);
}

#[test]
fn test_timers_decay_without_underflow() {
    do_cycle(
        0xF015,
        |state| {
            state.registers[0] = 10;
        },
        |state| {
            assert_eq!(state.delay_timer, 10);
            for _ in 0..10 {
                state.tick_timers();
            }
            assert_eq!(state.delay_timer, 0);
            state.tick_timers();
            state.tick_timers();
            assert_eq!(state.delay_timer, 0);
        },
    );

    do_cycle(
        0xF207,
        |state| {
            state.delay_timer = 42;
        },
        |state| {
            assert_eq!(state.registers[2], 42);
        },
    );
}

#[test]
fn test_tone_follows_sound_timer() {
    do_cycle(
        0xF018,
        |state| {
            state.registers[0] = 2;
            assert!(!state.tone_active());
        },
        |state| {
            assert!(state.tone_active());
            state.tick_timers();
            assert!(state.tone_active());
            state.tick_timers();
            assert!(!state.tone_active());
        },
    )
}

#[test]
fn test_add_to_index() {
    do_cycle(
        0xF01E,
        |state| {
            state.index = 0x300;
            state.registers[0] = 0x20;
            state.registers[0xF] = 0x77;
        },
        |state| {
            assert_eq!(state.index, 0x320);
            assert_eq!(state.registers[0xF], 0x77);
        },
    )
}

#[test]
fn test_font_lookup() {
    do_cycle(
        0xF229,
        |state| {
            state.registers[2] = 0xA;
        },
        |state| {
            assert_eq!(state.index, 50);
            assert_eq!(
                state.memory.read_slice(state.index, 5).unwrap(),
                &[0xF0, 0x90, 0xF0, 0x90, 0x90]
            );
        },
    )
}

#[test]
fn test_bcd() {
    do_cycle(
        0xF533,
        |state| {
            state.registers[5] = 234;
            state.index = 0x300;
        },
        |state| {
            assert_eq!(state.memory.read_slice(0x300, 3).unwrap(), &[2, 3, 4]);
            assert_eq!(state.registers[5], 234);
        },
    );

    do_cycle(
        0xF533,
        |state| {
            state.registers[5] = 7;
            state.index = 0x300;
        },
        |state| {
            assert_eq!(state.memory.read_slice(0x300, 3).unwrap(), &[0, 0, 7]);
        },
    );
}

#[test]
fn test_store_and_load_registers() {
    do_cycle(
        0xF355,
        |state| {
            state.registers[..5].copy_from_slice(&[1, 2, 3, 4, 5]);
            state.index = 0x300;
        },
        |state| {
            assert_eq!(state.memory.read_slice(0x300, 5).unwrap(), &[1, 2, 3, 4, 0]);
            assert_eq!(state.index, 0x300);
        },
    );

    do_cycle(
        0xF265,
        |state| {
            state.memory.write_slice(0x300, &[9, 8, 7, 6]).unwrap();
            state.registers[3] = 0x33;
            state.index = 0x300;
        },
        |state| {
            assert_eq!(&state.registers[..4], &[9, 8, 7, 0x33]);
            assert_eq!(state.index, 0x300);
        },
    );
}

#[test]
fn test_block_access_out_of_bounds() {
    let mut state = prepare_state_with_single_instruction(0xF255);
    state.index = 0xFFE;
    state.registers[..3].copy_from_slice(&[1, 2, 3]);
    assert_eq!(
        state.cycle(),
        Err(Chip8Error::OutOfBoundsAddress { address: 0x1000 })
    );
    assert_eq!(state.memory.read_slice(0xFFE, 2).unwrap(), &[0, 0]);

    let mut state = prepare_state_with_single_instruction(0xF033);
    state.index = 0xFFF;
    assert_eq!(
        state.cycle(),
        Err(Chip8Error::OutOfBoundsAddress { address: 0x1000 })
    );
}

#[test]
fn test_unknown_instruction_is_skipped() {
    let mut state = prepare_state_with_program(&[0x5121, 0xFFFF, 0x6A01]);

    assert_eq!(state.cycle(), Ok(CycleOutcome::SkippedUnknown(0x5121)));
    assert_eq!(state.program_counter, 0x202);
    assert_eq!(state.cycle(), Ok(CycleOutcome::SkippedUnknown(0xFFFF)));
    assert_eq!(state.cycle(), Ok(CycleOutcome::Executed));
    assert_eq!(state.registers[0xA], 1);
    assert!(state.halt_reason().is_none());
}

#[test]
fn test_stack_overflow_halts() {
    // calls itself forever
    let mut state = prepare_state_with_single_instruction(0x2200);
    for _ in 0..15 {
        assert_eq!(state.cycle(), Ok(CycleOutcome::Executed));
    }

    let fault = Chip8Error::StackOverflow { pc: 0x200 };
    assert_eq!(state.cycle(), Err(fault.clone()));
    assert!(fault.is_fatal());
    assert_eq!(state.halt_reason(), Some(&fault));

    // the machine stays halted
    assert_eq!(state.cycle(), Err(fault));
    assert_eq!(state.program_counter, 0x200);
    assert_eq!(state.stack.pointer(), 15);
}

#[test]
fn test_stack_underflow_halts() {
    let mut state = prepare_state_with_single_instruction(0x00EE);
    assert_eq!(
        state.cycle(),
        Err(Chip8Error::StackUnderflow { pc: 0x200 })
    );
    assert_eq!(state.program_counter, 0x200);
}

#[test]
fn test_program_counter_out_of_memory() {
    let mut state = prepare_state_with_single_instruction(0x1FFF);
    assert_eq!(state.cycle(), Ok(CycleOutcome::Executed));
    assert_eq!(
        state.cycle(),
        Err(Chip8Error::OutOfBoundsAddress { address: 0x1000 })
    );
}

#[test]
fn test_reset_clears_halt() {
    let mut state = prepare_state_with_single_instruction(0x00EE);
    state.registers[4] = 4;
    state.set_input_pin(2, true);
    assert!(state.cycle().is_err());

    state.reset();
    assert!(state.halt_reason().is_none());
    assert_eq!(state.program_counter(), 0x200);
    assert_eq!(state.registers, [0; 16]);
    assert_eq!(state.stack.pointer(), 0);
    assert!(!state.is_key_pressed(2));
    assert_eq!(state.memory.read_slice(0x200, 2).unwrap(), &[0, 0]);
    assert_eq!(state.memory.read_slice(0x000, 1).unwrap(), &[0xF0]);
    assert!(state.needs_redraw());
}

#[test]
fn test_input_pins() {
    let mut state = Chip8::new();
    state.set_input_pin(0xF, true);
    state.set_input_pin(0x3, true);
    assert!(state.is_key_pressed(0xF));
    assert!(state.is_key_pressed(0x13));
    state.set_input_pin(0xF, false);
    assert!(!state.is_key_pressed(0xF));
    state.reset_input_pins();
    assert!(!state.is_key_pressed(0x3));
}

#[test]
#[should_panic]
fn test_input_pin_out_of_range() {
    Chip8::new().set_input_pin(0x10, true);
}

#[test]
fn test_program_size_limit() {
    let mut state = Chip8::new();
    assert!(state.load_program_bytes(&[0xAB; 0x1000 - 0x200]).is_ok());
    assert_eq!(state.memory.read_slice(0xFFF, 1).unwrap(), &[0xAB]);

    let mut state = Chip8::new();
    assert!(matches!(
        state.load_program_bytes(&[0; 0x1000 - 0x200 + 1]),
        Err(LoadProgramError::ProgramTooLarge {
            size: 3585,
            max_size: 3584
        })
    ));
    assert_eq!(state.memory.read_slice(0x200, 1).unwrap(), &[0]);
}

#[test]
fn test_load_program_from_missing_file() {
    let mut state = Chip8::new();
    assert!(matches!(
        state.load_program("/definitely/not/a/rom.ch8"),
        Err(LoadProgramError::CouldNotReadFile { .. })
    ));
}

#[test]
fn test_load_program_from_file() {
    let path = std::env::temp_dir().join("chip-8-vm-test-rom.ch8");
    std::fs::write(&path, [0x6A, 0x2A]).unwrap();

    let mut state = Chip8::new();
    assert_eq!(state.load_program(path.to_str().unwrap()).unwrap(), 2);
    assert_eq!(state.cycle(), Ok(CycleOutcome::Executed));
    assert_eq!(state.registers[0xA], 0x2A);

    std::fs::remove_file(path).unwrap();
}
