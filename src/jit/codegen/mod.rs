pub mod ia32;

pub use self::ia32::{
    codegen::InstructionStream, error::EncodeError, ops, registers::Register,
};
