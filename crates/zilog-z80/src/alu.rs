//! Arithmetic and logic with Z80 flag semantics.
//!
//! Every function is pure: operands and incoming flags in, result and the
//! complete new flag byte out. Flags an instruction leaves unaffected are
//! carried over from the `flags` argument.

use crate::flags::{CF, HF, NF, PF, SF, SZ53P, XF, YF, ZF, sz53};

/// Result of an 8-bit ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

/// The eight accumulator operations, in opcode order (bits 5-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    /// Decode from the `yyy` field of an `ALU A,r` opcode.
    #[must_use]
    pub const fn from_opcode(op: u8) -> Self {
        match (op >> 3) & 7 {
            0 => Self::Add,
            1 => Self::Adc,
            2 => Self::Sub,
            3 => Self::Sbc,
            4 => Self::And,
            5 => Self::Xor,
            6 => Self::Or,
            _ => Self::Cp,
        }
    }

    /// Apply to the accumulator. `CP` returns `a` unchanged as the value.
    #[must_use]
    pub fn apply(self, a: u8, operand: u8, flags: u8) -> AluResult {
        let carry = flags & CF != 0;
        match self {
            Self::Add => add8(a, operand, false),
            Self::Adc => add8(a, operand, carry),
            Self::Sub => sub8(a, operand, false),
            Self::Sbc => sub8(a, operand, carry),
            Self::And => logic(a & operand, HF),
            Self::Xor => logic(a ^ operand, 0),
            Self::Or => logic(a | operand, 0),
            Self::Cp => {
                let diff = sub8(a, operand, false);
                // X/Y come from the operand, not the discarded difference
                AluResult {
                    value: a,
                    flags: (diff.flags & !(YF | XF)) | (operand & (YF | XF)),
                }
            }
        }
    }
}

fn logic(value: u8, extra: u8) -> AluResult {
    AluResult { value, flags: SZ53P[usize::from(value)] | extra }
}

/// Add with optional carry in.
#[must_use]
pub fn add8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let wide = u16::from(a) + u16::from(b) + u16::from(c);
    let value = wide as u8;

    let mut flags = sz53(value);
    if (a & 0x0F) + (b & 0x0F) + c > 0x0F {
        flags |= HF;
    }
    if (a ^ b) & 0x80 == 0 && (a ^ value) & 0x80 != 0 {
        flags |= PF;
    }
    if wide > 0xFF {
        flags |= CF;
    }
    AluResult { value, flags }
}

/// Subtract with optional borrow in.
#[must_use]
pub fn sub8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let value = a.wrapping_sub(b).wrapping_sub(c);

    let mut flags = sz53(value) | NF;
    if (a & 0x0F) < (b & 0x0F) + c {
        flags |= HF;
    }
    if (a ^ b) & 0x80 != 0 && (b ^ value) & 0x80 == 0 {
        flags |= PF;
    }
    if u16::from(a) < u16::from(b) + u16::from(c) {
        flags |= CF;
    }
    AluResult { value, flags }
}

/// `INC r`. Carry is preserved from `flags`.
#[must_use]
pub fn inc8(a: u8, flags: u8) -> AluResult {
    AluResult {
        value: a.wrapping_add(1),
        flags: crate::flags::INC_FLAGS[usize::from(a)] | (flags & CF),
    }
}

/// `DEC r`. Carry is preserved from `flags`.
#[must_use]
pub fn dec8(a: u8, flags: u8) -> AluResult {
    AluResult {
        value: a.wrapping_sub(1),
        flags: crate::flags::DEC_FLAGS[usize::from(a)] | (flags & CF),
    }
}

/// The CB-prefixed rotate and shift group, in opcode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    /// Undocumented: shift left, bit 0 set.
    Sll,
    Srl,
}

impl ShiftOp {
    #[must_use]
    pub const fn from_opcode(op: u8) -> Self {
        match (op >> 3) & 7 {
            0 => Self::Rlc,
            1 => Self::Rrc,
            2 => Self::Rl,
            3 => Self::Rr,
            4 => Self::Sla,
            5 => Self::Sra,
            6 => Self::Sll,
            _ => Self::Srl,
        }
    }

    /// Shift `value` and compute CB-group flags (S, Z, Y, X, P, C; H=N=0).
    #[must_use]
    pub fn apply(self, value: u8, flags: u8) -> AluResult {
        let carry_in = flags & CF;
        let (result, carry_out) = match self {
            Self::Rlc => (value.rotate_left(1), value >> 7),
            Self::Rrc => (value.rotate_right(1), value & 1),
            Self::Rl => (value << 1 | carry_in, value >> 7),
            Self::Rr => (value >> 1 | carry_in << 7, value & 1),
            Self::Sla => (value << 1, value >> 7),
            Self::Sra => (value >> 1 | (value & 0x80), value & 1),
            Self::Sll => (value << 1 | 1, value >> 7),
            Self::Srl => (value >> 1, value & 1),
        };
        AluResult { value: result, flags: SZ53P[usize::from(result)] | carry_out }
    }

    /// Accumulator forms (`RLCA`, `RRCA`, `RLA`, `RRA`): S, Z and P preserved,
    /// H and N cleared, X/Y from the result.
    #[must_use]
    pub fn apply_accumulator(self, a: u8, flags: u8) -> AluResult {
        let full = self.apply(a, flags);
        AluResult {
            value: full.value,
            flags: (flags & (SF | ZF | PF)) | (full.value & (YF | XF)) | (full.flags & CF),
        }
    }
}

/// `BIT n,v`. `xy_source` supplies bits 5 and 3: the operand for registers,
/// WZ high byte for `(HL)`, and the effective address high byte for `(IX+d)`.
#[must_use]
pub fn bit(n: u8, value: u8, xy_source: u8, flags: u8) -> u8 {
    let tested = value & (1 << n);
    let mut f = (flags & CF) | HF | (xy_source & (YF | XF));
    if tested == 0 {
        f |= ZF | PF;
    }
    if tested & 0x80 != 0 {
        f |= SF;
    }
    f
}

/// `ADD HL,rr` and the indexed forms: S, Z and P/V preserved.
#[must_use]
pub fn add16(a: u16, b: u16, flags: u8) -> (u16, u8) {
    let wide = u32::from(a) + u32::from(b);
    let result = wide as u16;

    let mut f = (flags & (SF | ZF | PF)) | ((result >> 8) as u8 & (YF | XF));
    if (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF {
        f |= HF;
    }
    if wide > 0xFFFF {
        f |= CF;
    }
    (result, f)
}

/// `ADC HL,rr`.
#[must_use]
pub fn adc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let wide = u32::from(a) + u32::from(b) + u32::from(c);
    let result = wide as u16;

    let mut f = (result >> 8) as u8 & (SF | YF | XF);
    if result == 0 {
        f |= ZF;
    }
    if (a & 0x0FFF) + (b & 0x0FFF) + c > 0x0FFF {
        f |= HF;
    }
    if (a ^ b) & 0x8000 == 0 && (a ^ result) & 0x8000 != 0 {
        f |= PF;
    }
    if wide > 0xFFFF {
        f |= CF;
    }
    (result, f)
}

/// `SBC HL,rr`.
#[must_use]
pub fn sbc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(c);

    let mut f = NF | ((result >> 8) as u8 & (SF | YF | XF));
    if result == 0 {
        f |= ZF;
    }
    if (a & 0x0FFF) < (b & 0x0FFF) + c {
        f |= HF;
    }
    if (a ^ b) & 0x8000 != 0 && (b ^ result) & 0x8000 == 0 {
        f |= PF;
    }
    if u32::from(a) < u32::from(b) + u32::from(c) {
        f |= CF;
    }
    (result, f)
}
