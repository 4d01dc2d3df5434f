use std::fmt;

use arbitrary_int::u3;

/// The 32 bit general purpose registers we can target.
///
/// The discriminant is the 3 bit code used to select the register in the `register_memory`
/// (or `register`) field of a MOD/RM byte.  Note that the hardware order is A, C, D, B
/// and not alphabetical.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    EAX = 0b000,
    ECX = 0b001,
    EDX = 0b010,
    EBX = 0b011,
}

impl Register {
    pub const ALL: [Register; 4] = [Register::EAX, Register::ECX, Register::EDX, Register::EBX];

    pub fn as_u3(&self) -> u3 {
        u3::new(*self as u8)
    }

    /// ESP/EBP/ESI/EDI share the upper half of the code space but we never emit them
    pub fn from_u3(code: u3) -> Option<Register> {
        match code.value() {
            0b000 => Some(Register::EAX),
            0b001 => Some(Register::ECX),
            0b010 => Some(Register::EDX),
            0b011 => Some(Register::EBX),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Register::EAX => "eax",
            Register::ECX => "ecx",
            Register::EDX => "edx",
            Register::EBX => "ebx",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
