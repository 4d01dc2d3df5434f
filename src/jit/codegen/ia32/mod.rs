pub mod codegen;
pub mod error;
pub mod instruction;
pub mod operand_encoding;
pub mod ops;
pub mod registers;
