use arbitrary_int::u3;

use super::{
    codegen::InstructionStream,
    error::EncodeError,
    instruction::{Immediate, Instruction, Opcode},
    operand_encoding::{InstructionInput, OperandEncoding},
    registers::Register,
};

/// MOV r/m32, imm32 ("C7 /0 id"), always 6 bytes
pub fn mov(stream: &mut InstructionStream, dst: Register, value: i32) {
    stream.push(Instruction::new(
        InstructionInput::new(Opcode::MovImm32 as u8).with_extension(u3::new(0)),
        OperandEncoding::MemoryImmediate(dst, Immediate::Imm32(value)),
    ));
}

/// INT imm8 ("CD ib"), always 2 bytes
pub fn int(stream: &mut InstructionStream, vector: u8) {
    stream.push(Instruction::new(
        InstructionInput::new(Opcode::Interrupt as u8),
        OperandEncoding::Immediate(Immediate::Imm8(vector)),
    ));
}

/// Narrows a pointer into a 32 bit immediate.
///
/// The generated code runs with 32 bit registers so the address has to sit in the low 4GiB,
/// the bit pattern is kept as is (addresses above 2GiB come out negative).
pub fn address_immediate<T>(ptr: *const T) -> Result<i32, EncodeError> {
    let address = ptr as usize;
    u32::try_from(address)
        .map(|address| address as i32)
        .map_err(|_| EncodeError::UnsupportedOperand {
            operand: format!("address {:#x}", address),
            reason: "does not fit in a 32 bit immediate",
        })
}
