use arbitrary_int::u3;

use super::{
    instruction::{AddressingMode, Immediate, Instruction, ModRM},
    registers::Register,
};

/// How the operands of an opcode are laid out, only the two encodings our forms need.
///
/// emit(Instruction::new(InstructionInput::new(0xC7).with_extension(u3::new(0)), OperandEncoding::MemoryImmediate(Register::EAX, Immediate::Imm32(4))))
#[derive(Clone, Debug)]
pub enum OperandEncoding {
    /// "I", Operand 1 = imm8/32
    /// has no MOD/RM byte
    Immediate(Immediate),

    /// "MI", Operand 1 = ModRM:r/m (w), Operand 2 = imm8/32
    /// r/m is always register direct, memory operands aren't supported
    MemoryImmediate(Register, Immediate),
}

pub struct InstructionInput {
    pub primary_opcode: u8,
    pub opcode_extension: Option<u3>,
}

impl InstructionInput {
    pub fn new(primary_opcode: u8) -> InstructionInput {
        InstructionInput {
            primary_opcode,
            opcode_extension: None,
        }
    }

    pub fn with_extension(mut self, opcode_extension: u3) -> InstructionInput {
        self.opcode_extension = Some(opcode_extension);
        self
    }
}

impl Instruction {
    pub fn new(input: InstructionInput, encoding: OperandEncoding) -> Instruction {
        match encoding {
            OperandEncoding::Immediate(imm) => Instruction {
                primary_opcode: input.primary_opcode,
                mod_rm: None,
                displacement: None,
                immediate: Some(imm),
            },
            OperandEncoding::MemoryImmediate(dst, imm) => Instruction {
                primary_opcode: input.primary_opcode,
                // "/digit" forms put the extension where a second register would go
                mod_rm: Some(ModRM::compose(
                    AddressingMode::RegisterDirect,
                    input.opcode_extension.unwrap_or(u3::new(0)),
                    dst.as_u3(),
                )),
                displacement: None,
                immediate: Some(imm),
            },
        }
    }
}
