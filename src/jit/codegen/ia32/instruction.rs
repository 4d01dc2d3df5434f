use std::fmt;

use arbitrary_int::u3;
use bitbybit::{bitenum, bitfield};
use num_traits::ops::bytes::ToBytes;

use super::{error::EncodeError, registers::Register};

/// This is the output of any opcode and pretty much can be outputted directly to instruction stream
/// only difference is that we don't encode Option<>
///
/// Structure is: (everything is 1 byte unless otherwise specified)
/// PrimaryOpcode | MOD/RM | Displacement (1/4) | Immediate (1/4)
///
/// There are no prefixes, we only ever emit the default 32 bit operand size.
#[derive(Clone, Debug)]
pub struct Instruction {
    pub primary_opcode: u8,
    pub mod_rm: Option<ModRM>,

    pub displacement: Option<Displacement>,
    pub immediate: Option<Immediate>,
}

/// Primary opcodes of the forms we know how to emit
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// MOV r/m32, imm32 (C7 /0 id)
    MovImm32 = 0xC7,

    /// INT imm8 (CD ib)
    Interrupt = 0xCD,
}

impl Opcode {
    pub fn from_primary(primary_opcode: u8) -> Option<Opcode> {
        match primary_opcode {
            0xC7 => Some(Opcode::MovImm32),
            0xCD => Some(Opcode::Interrupt),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Displacement {
    ZeroByteDisplacement,
    OneByteDisplacement(i8),
    FourByteDisplacement(i32),
}

impl Displacement {
    /// Validates that `value` fits the displacement field that `mode` implies
    pub fn for_mode(mode: AddressingMode, value: i32) -> Result<Option<Displacement>, EncodeError> {
        match mode {
            AddressingMode::RegisterDirect | AddressingMode::ZeroByteDisplacement if value != 0 => {
                Err(EncodeError::UnsupportedOperand {
                    operand: format!("displacement {}", value),
                    reason: "addressing mode has no displacement field",
                })
            }
            AddressingMode::RegisterDirect => Ok(None),
            AddressingMode::ZeroByteDisplacement => Ok(Some(Displacement::ZeroByteDisplacement)),
            AddressingMode::OneByteDisplacement => i8::try_from(value)
                .map(|byte| Some(Displacement::OneByteDisplacement(byte)))
                .map_err(|_| EncodeError::UnsupportedOperand {
                    operand: format!("displacement {}", value),
                    reason: "does not fit in an 8 bit displacement",
                }),
            AddressingMode::FourByteDisplacement => {
                Ok(Some(Displacement::FourByteDisplacement(value)))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Immediate {
    Imm8(u8),
    Imm32(i32),
}

/// The addressing mode of the registers, this is the first 2 bits of the ModRM
#[bitenum(u2, exhaustive: true)]
#[derive(Debug, PartialEq, Eq)]
pub enum AddressingMode {
    /// Dereference the memory location at the register but there is no additional displacement
    ZeroByteDisplacement = 0b00,
    /// Dereference the memory location at the register and apply the 1-byte displacement that is stored after MOD R/M but before the immediate
    OneByteDisplacement = 0b01,
    /// Dereference the memory location at the register and apply the 4-byte displacement that is stored after MOD R/M but before the immediate
    FourByteDisplacement = 0b10,
    /// No indirect lookups of memory locations just use the direct value stored in the register
    RegisterDirect = 0b11,
}

impl AddressingMode {
    pub fn from_displacement(displacement: Option<Displacement>) -> AddressingMode {
        match displacement {
            Some(Displacement::ZeroByteDisplacement) => AddressingMode::ZeroByteDisplacement,
            Some(Displacement::OneByteDisplacement(_)) => AddressingMode::OneByteDisplacement,
            Some(Displacement::FourByteDisplacement(_)) => AddressingMode::FourByteDisplacement,
            None => AddressingMode::RegisterDirect,
        }
    }
}

/// This primarily specifies addressing mode, a source/destination register, and optionally an opcode extension
/// Default is 0b11 since it's the RegisterDirect.
///
/// Layout is `mode (7..6) | register or opcode extension (5..3) | register or memory (2..0)`
#[bitfield(u8, default: 0b11_000_000)]
#[derive(Debug)]
pub struct ModRM {
    #[bits(6..=7, rw)]
    pub addressing_mode: AddressingMode,

    /// Either a register operand or, for single operand forms like `C7 /0`, the opcode extension
    #[bits(3..=5, rw)]
    pub register: u3,

    #[bits(0..=2, rw)]
    pub register_memory: u3,
}

impl ModRM {
    pub fn compose(mode: AddressingMode, register_or_extension: u3, register_memory: u3) -> ModRM {
        ModRM::default()
            .with_addressing_mode(mode)
            .with_register(register_or_extension)
            .with_register_memory(register_memory)
    }
}

/// Packs `mode << 6 | middle << 3 | operand`, each field masked to its width first
pub fn compose_addressing_byte(mode: AddressingMode, middle: u8, operand: u8) -> u8 {
    ModRM::compose(mode, u3::new(middle & 0b111), u3::new(operand & 0b111)).raw_value()
}

/// Byte `index` (0 is the least significant) of the two's complement pattern of `value`
pub fn little_endian_byte(value: i32, index: u32) -> u8 {
    (value as u32)
        .checked_shr(index.saturating_mul(8))
        .map_or(0, |shifted| (shifted & 0xFF) as u8)
}

impl Instruction {
    fn emit<const COUNT: usize, T: ToBytes<Bytes = [u8; COUNT]>>(out: &mut Vec<u8>, value: T) -> usize {
        out.extend_from_slice(&ToBytes::to_le_bytes(&value));
        COUNT
    }

    pub fn len(&self) -> usize {
        let displacement = match self.displacement {
            None | Some(Displacement::ZeroByteDisplacement) => 0,
            Some(Displacement::OneByteDisplacement(_)) => 1,
            Some(Displacement::FourByteDisplacement(_)) => 4,
        };
        let immediate = match self.immediate {
            None => 0,
            Some(Immediate::Imm8(_)) => 1,
            Some(Immediate::Imm32(_)) => 4,
        };

        1 + usize::from(self.mod_rm.is_some()) + displacement + immediate
    }

    /// Appends the encoded bytes to `out`, returning how many were written
    pub fn write_out(&self, out: &mut Vec<u8>) -> usize {
        let mut count = Instruction::emit(out, self.primary_opcode);

        if let Some(mod_rm) = self.mod_rm {
            count += Instruction::emit(out, mod_rm.raw_value());
        }

        if let Some(displacement) = self.displacement {
            count += match displacement {
                Displacement::ZeroByteDisplacement => 0,
                Displacement::OneByteDisplacement(byte) => Instruction::emit(out, byte),
                Displacement::FourByteDisplacement(double_word) => {
                    Instruction::emit(out, double_word)
                }
            }
        }

        if let Some(immediate) = self.immediate {
            count += match immediate {
                Immediate::Imm8(byte) => Instruction::emit(out, byte),
                Immediate::Imm32(double_word) => {
                    out.extend((0..4).map(|index| little_endian_byte(double_word, index)));
                    4
                }
            }
        }

        count
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let register_direct = self
            .mod_rm
            .filter(|mod_rm| mod_rm.addressing_mode() == AddressingMode::RegisterDirect)
            .and_then(|mod_rm| Register::from_u3(mod_rm.register_memory()));

        match (Opcode::from_primary(self.primary_opcode), register_direct, self.immediate) {
            (Some(Opcode::MovImm32), Some(register), Some(Immediate::Imm32(value))) => {
                write!(f, "mov {}, {:#x}", register, value)
            }
            (Some(Opcode::Interrupt), None, Some(Immediate::Imm8(vector))) => {
                write!(f, "int {:#x}", vector)
            }
            _ => {
                let mut bytes = vec![];
                self.write_out(&mut bytes);
                let bytes: Vec<String> = bytes.iter().map(|byte| format!("{:#04x}", byte)).collect();
                write!(f, "db {}", bytes.join(", "))
            }
        }
    }
}
