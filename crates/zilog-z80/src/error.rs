//! Errors for the Z80 core.

use std::fmt;

/// A programming-contract fault from the generic register accessors.
///
/// Instruction execution never produces one of these; they only arise when a
/// host addresses the register file by a numeric index that does not name a
/// register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// 8-bit index outside 0-7, or 6 (the `(HL)` operand slot).
    InvalidReg8(u8),
    /// 16-bit pair index outside 0-3.
    InvalidReg16(u8),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidReg8(6) => write!(f, "register index 6 is the (HL) operand, not a register"),
            Self::InvalidReg8(index) => write!(f, "invalid 8-bit register index {index}"),
            Self::InvalidReg16(index) => write!(f, "invalid register pair index {index}"),
        }
    }
}

impl std::error::Error for RegisterError {}
