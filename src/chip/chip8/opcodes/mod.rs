mod arithmetic_and_logic;
mod program_flow;
mod system;

use std::fmt;

use crate::chip::chip8::{error::Chip8Error, Chip8};

/// Represents a Chip 8 opcode. A Chip 8 opcode is two bytes long.
#[derive(Debug, Clone, Copy)]
pub(super) struct Opcode {
    /// The instruction class is the most significant nibble of the opcode.
    /// Note that we use a u8 to represent the instruction class here for
    /// convenience, but ensure that a valid opcode can only be constructed
    /// if the four most significant bits of the u8 are 0.
    instruction_class: u8,
    /// The payload constitutes the remaining nibbles of the opcode.
    payload: OpcodePayload,
}

/// Represents the payload of a Chip 8 opcode. That is the opcode without
/// the most significant nibble.
#[derive(Debug, Clone, Copy)]
struct OpcodePayload {
    /// The nibbles of the payload, each in range 0x0 - 0xF (inclusive).
    nibbles: [u8; 3],
}

impl OpcodePayload {
    /// Interprets the payload as an address in the range 0x000 to 0xFFF
    /// (inclusive). This is `nnn`.
    fn address(&self) -> u16 {
        (self.nibbles[0] as u16) << 8 | (self.nibbles[1] as u16) << 4 | self.nibbles[2] as u16
    }

    /// Interprets the first nibble as a register index `x` and the remaining
    /// nibbles as an immediate byte `kk`.
    fn reg_and_value(&self) -> (u8, u8) {
        (self.nibbles[0], (self.nibbles[1] << 4) | self.nibbles[2])
    }

    /// Interprets the payload as three one-nibble operands `x`, `y` and `n`.
    fn operands(&self) -> (u8, u8, u8) {
        (self.nibbles[0], self.nibbles[1], self.nibbles[2])
    }
}

impl Opcode {
    /// Constructs a new `Opcode` given its big-endian byte representation.
    pub(super) fn new(opcode: &[u8; 2]) -> Opcode {
        Opcode {
            instruction_class: opcode[0] >> 4,
            payload: OpcodePayload {
                nibbles: [opcode[0] & 0xF, opcode[1] >> 4, opcode[1] & 0xF],
            },
        }
    }

    /// The raw instruction word.
    pub(super) fn word(&self) -> u16 {
        (self.instruction_class as u16) << 12 | self.payload.address()
    }

    fn nibbles(&self) -> (u8, u8, u8, u8) {
        let (x, y, n) = self.payload.operands();
        (self.instruction_class, x, y, n)
    }
}

impl From<u16> for Opcode {
    fn from(word: u16) -> Self {
        Opcode::new(&word.to_be_bytes())
    }
}

/// A decoded instruction, carrying exactly the operands its handler needs.
/// `x` and `y` name registers, `byte` is the immediate `kk`, `address` is `nnn`
/// and `n` is the sprite height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 0nnn, a call into machine code on the original hardware.
    Sys { address: u16 },
    Cls,
    Ret,
    Jp { address: u16 },
    Call { address: u16 },
    SeByte { x: u8, byte: u8 },
    SneByte { x: u8, byte: u8 },
    SeReg { x: u8, y: u8 },
    LdByte { x: u8, byte: u8 },
    AddByte { x: u8, byte: u8 },
    LdReg { x: u8, y: u8 },
    Or { x: u8, y: u8 },
    And { x: u8, y: u8 },
    Xor { x: u8, y: u8 },
    AddReg { x: u8, y: u8 },
    Sub { x: u8, y: u8 },
    Shr { x: u8 },
    Subn { x: u8, y: u8 },
    Shl { x: u8 },
    SneReg { x: u8, y: u8 },
    LdI { address: u16 },
    JpV0 { address: u16 },
    Rnd { x: u8, byte: u8 },
    Drw { x: u8, y: u8, n: u8 },
    Skp { x: u8 },
    Sknp { x: u8 },
    LdVxDt { x: u8 },
    LdVxK { x: u8 },
    LdDtVx { x: u8 },
    LdStVx { x: u8 },
    AddIVx { x: u8 },
    LdFVx { x: u8 },
    LdBVx { x: u8 },
    LdIVx { x: u8 },
    LdVxI { x: u8 },
}

/// Decodes a raw instruction word. Words that match no instruction yield
/// `Chip8Error::UnknownInstruction`.
pub fn decode(word: u16) -> Result<Instruction, Chip8Error> {
    Instruction::try_from(Opcode::from(word))
}

impl TryFrom<Opcode> for Instruction {
    type Error = Chip8Error;

    fn try_from(opcode: Opcode) -> Result<Self, Self::Error> {
        use Instruction::*;

        let address = opcode.payload.address();
        let (x, byte) = opcode.payload.reg_and_value();
        let (_, y, n) = opcode.payload.operands();

        let instruction = match opcode.nibbles() {
            (0x0, 0x0, 0xE, 0x0) => Cls,
            (0x0, 0x0, 0xE, 0xE) => Ret,
            (0x0, ..) => Sys { address },
            (0x1, ..) => Jp { address },
            (0x2, ..) => Call { address },
            (0x3, ..) => SeByte { x, byte },
            (0x4, ..) => SneByte { x, byte },
            (0x5, .., 0x0) => SeReg { x, y },
            (0x6, ..) => LdByte { x, byte },
            (0x7, ..) => AddByte { x, byte },
            (0x8, .., 0x0) => LdReg { x, y },
            (0x8, .., 0x1) => Or { x, y },
            (0x8, .., 0x2) => And { x, y },
            (0x8, .., 0x3) => Xor { x, y },
            (0x8, .., 0x4) => AddReg { x, y },
            (0x8, .., 0x5) => Sub { x, y },
            (0x8, .., 0x6) => Shr { x },
            (0x8, .., 0x7) => Subn { x, y },
            (0x8, .., 0xE) => Shl { x },
            (0x9, .., 0x0) => SneReg { x, y },
            (0xA, ..) => LdI { address },
            (0xB, ..) => JpV0 { address },
            (0xC, ..) => Rnd { x, byte },
            (0xD, ..) => Drw { x, y, n },
            (0xE, _, 0x9, 0xE) => Skp { x },
            (0xE, _, 0xA, 0x1) => Sknp { x },
            (0xF, _, 0x0, 0x7) => LdVxDt { x },
            (0xF, _, 0x0, 0xA) => LdVxK { x },
            (0xF, _, 0x1, 0x5) => LdDtVx { x },
            (0xF, _, 0x1, 0x8) => LdStVx { x },
            (0xF, _, 0x1, 0xE) => AddIVx { x },
            (0xF, _, 0x2, 0x9) => LdFVx { x },
            (0xF, _, 0x3, 0x3) => LdBVx { x },
            (0xF, _, 0x5, 0x5) => LdIVx { x },
            (0xF, _, 0x6, 0x5) => LdVxI { x },
            _ => {
                return Err(Chip8Error::UnknownInstruction {
                    opcode: opcode.word(),
                })
            }
        };
        Ok(instruction)
    }
}

impl Instruction {
    /// Executes `self` on the given state. Each handler leaves the program
    /// counter where the next cycle has to fetch from; nothing is added
    /// afterwards.
    ///
    /// # Errors
    /// A failing handler returns the fault before mutating any state.
    pub(super) fn execute(self, state: &mut Chip8) -> Result<(), Chip8Error> {
        use Instruction::*;

        match self {
            Sys { address } => system::sys(state, address),
            Cls => system::cls(state),
            Ret => system::ret(state)?,
            Jp { address } => program_flow::jp(state, address),
            Call { address } => program_flow::call(state, address)?,
            SeByte { x, byte } => program_flow::se_byte(state, x, byte),
            SneByte { x, byte } => program_flow::sne_byte(state, x, byte),
            SeReg { x, y } => program_flow::se_reg(state, x, y),
            SneReg { x, y } => program_flow::sne_reg(state, x, y),
            JpV0 { address } => program_flow::jp_v0(state, address),
            Skp { x } => program_flow::skp(state, x),
            Sknp { x } => program_flow::sknp(state, x),
            LdByte { x, byte } => arithmetic_and_logic::ld_byte(state, x, byte),
            AddByte { x, byte } => arithmetic_and_logic::add_byte(state, x, byte),
            LdReg { x, y } => arithmetic_and_logic::ld_reg(state, x, y),
            Or { x, y } => arithmetic_and_logic::or(state, x, y),
            And { x, y } => arithmetic_and_logic::and(state, x, y),
            Xor { x, y } => arithmetic_and_logic::xor(state, x, y),
            AddReg { x, y } => arithmetic_and_logic::add_reg(state, x, y),
            Sub { x, y } => arithmetic_and_logic::sub(state, x, y),
            Shr { x } => arithmetic_and_logic::shr(state, x),
            Subn { x, y } => arithmetic_and_logic::subn(state, x, y),
            Shl { x } => arithmetic_and_logic::shl(state, x),
            LdI { address } => arithmetic_and_logic::ld_i(state, address),
            Rnd { x, byte } => arithmetic_and_logic::rnd(state, x, byte),
            Drw { x, y, n } => arithmetic_and_logic::drw(state, x, y, n)?,
            LdVxDt { x } => arithmetic_and_logic::ld_vx_dt(state, x),
            LdVxK { x } => arithmetic_and_logic::ld_vx_k(state, x),
            LdDtVx { x } => arithmetic_and_logic::ld_dt_vx(state, x),
            LdStVx { x } => arithmetic_and_logic::ld_st_vx(state, x),
            AddIVx { x } => arithmetic_and_logic::add_i_vx(state, x),
            LdFVx { x } => arithmetic_and_logic::ld_f_vx(state, x),
            LdBVx { x } => arithmetic_and_logic::ld_b_vx(state, x)?,
            LdIVx { x } => arithmetic_and_logic::ld_i_vx(state, x)?,
            LdVxI { x } => arithmetic_and_logic::ld_vx_i(state, x)?,
        };
        Ok(())
    }
}

/// Renders the instruction in the usual assembler syntax.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;

        match *self {
            Sys { address } => write!(f, "SYS {:#05X}", address),
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp { address } => write!(f, "JP {:#05X}", address),
            Call { address } => write!(f, "CALL {:#05X}", address),
            SeByte { x, byte } => write!(f, "SE V{:X}, {:#04X}", x, byte),
            SneByte { x, byte } => write!(f, "SNE V{:X}, {:#04X}", x, byte),
            SeReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            LdByte { x, byte } => write!(f, "LD V{:X}, {:#04X}", x, byte),
            AddByte { x, byte } => write!(f, "ADD V{:X}, {:#04X}", x, byte),
            LdReg { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr { x } => write!(f, "SHR V{:X}", x),
            Subn { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl { x } => write!(f, "SHL V{:X}", x),
            SneReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI { address } => write!(f, "LD I, {:#05X}", address),
            JpV0 { address } => write!(f, "JP V0, {:#05X}", address),
            Rnd { x, byte } => write!(f, "RND V{:X}, {:#04X}", x, byte),
            Drw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Skp { x } => write!(f, "SKP V{:X}", x),
            Sknp { x } => write!(f, "SKNP V{:X}", x),
            LdVxDt { x } => write!(f, "LD V{:X}, DT", x),
            LdVxK { x } => write!(f, "LD V{:X}, K", x),
            LdDtVx { x } => write!(f, "LD DT, V{:X}", x),
            LdStVx { x } => write!(f, "LD ST, V{:X}", x),
            AddIVx { x } => write!(f, "ADD I, V{:X}", x),
            LdFVx { x } => write!(f, "LD F, V{:X}", x),
            LdBVx { x } => write!(f, "LD B, V{:X}", x),
            LdIVx { x } => write!(f, "LD [I], V{:X}", x),
            LdVxI { x } => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04X}", self.word())
    }
}
