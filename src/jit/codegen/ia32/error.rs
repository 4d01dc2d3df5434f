use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// The operand can't be represented by the instruction form it was given to,
    /// nothing is emitted when this is returned.
    #[error("Unsupported operand {operand}: {reason}")]
    UnsupportedOperand { operand: String, reason: &'static str },
}
