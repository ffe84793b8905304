//! Z80 register file.

use crate::error::RegisterError;

/// The complete Z80 register file.
///
/// 16-bit pairs are stored as independent 8-bit halves, so writing one half
/// can never disturb its sibling. Pair accessors compose and split them.
/// Arithmetic on every field wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    // Main registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    /// Shadow bank (AF', BC', DE', HL').
    pub alt: RegisterSet,

    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    /// Interrupt vector base.
    pub i: u8,
    /// Memory refresh counter. Bit 7 is only changed by `LD R,A`.
    pub r: u8,

    /// WZ/MEMPTR - internal temporary register.
    /// Leaks into the undocumented X/Y flags of `BIT n,(HL)`.
    pub wz: u16,

    pub iff1: bool,
    pub iff2: bool,
    /// Interrupt mode, 0-2.
    pub im: u8,
    pub halted: bool,
}

impl Default for Registers {
    /// Power-on state: AF and SP read back `FFFFh`, everything else is clear.
    fn default() -> Self {
        Self {
            a: 0xFF,
            f: 0xFF,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            alt: RegisterSet::default(),
            ix: 0,
            iy: 0,
            sp: 0xFFFF,
            pc: 0,
            i: 0,
            r: 0,
            wz: 0,
            iff1: false,
            iff2: false,
            im: 0,
            halted: false,
        }
    }
}

/// One bank of the general registers: A, F, B, C, D, E, H and L.
///
/// The active bank lives in the flat fields of [`Registers`]; the shadow bank
/// is a second `RegisterSet`. Exchanges copy values between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterSet {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
}

impl Default for RegisterSet {
    fn default() -> Self {
        Self {
            a: 0xFF,
            f: 0xFF,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
        }
    }
}

impl RegisterSet {
    #[must_use]
    pub const fn af(&self) -> u16 {
        pair(self.a, self.f)
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        pair(self.b, self.c)
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        pair(self.d, self.e)
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        pair(self.h, self.l)
    }
}

/// An 8-bit register, numbered by its opcode encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    B = 0,
    C = 1,
    D = 2,
    E = 3,
    H = 4,
    L = 5,
    A = 7,
}

impl TryFrom<u8> for Reg8 {
    type Error = RegisterError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Self::B),
            1 => Ok(Self::C),
            2 => Ok(Self::D),
            3 => Ok(Self::E),
            4 => Ok(Self::H),
            5 => Ok(Self::L),
            7 => Ok(Self::A),
            _ => Err(RegisterError::InvalidReg8(index)),
        }
    }
}

/// A register pair as encoded by the `rp` field of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    Bc = 0,
    De = 1,
    Hl = 2,
    Sp = 3,
}

impl TryFrom<u8> for Reg16 {
    type Error = RegisterError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Self::Bc),
            1 => Ok(Self::De),
            2 => Ok(Self::Hl),
            3 => Ok(Self::Sp),
            _ => Err(RegisterError::InvalidReg16(index)),
        }
    }
}

const fn pair(hi: u8, lo: u8) -> u16 {
    (hi as u16) << 8 | lo as u16
}

const fn split(value: u16) -> (u8, u8) {
    ((value >> 8) as u8, value as u8)
}

impl Registers {
    #[must_use]
    pub const fn af(&self) -> u16 {
        pair(self.a, self.f)
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        pair(self.b, self.c)
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        pair(self.d, self.e)
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        pair(self.h, self.l)
    }

    pub fn set_af(&mut self, value: u16) {
        (self.a, self.f) = split(value);
    }

    pub fn set_bc(&mut self, value: u16) {
        (self.b, self.c) = split(value);
    }

    pub fn set_de(&mut self, value: u16) {
        (self.d, self.e) = split(value);
    }

    pub fn set_hl(&mut self, value: u16) {
        (self.h, self.l) = split(value);
    }

    /// AF' (the shadow accumulator and flags).
    #[must_use]
    pub const fn af_alt(&self) -> u16 {
        self.alt.af()
    }

    #[must_use]
    pub const fn bc_alt(&self) -> u16 {
        self.alt.bc()
    }

    #[must_use]
    pub const fn de_alt(&self) -> u16 {
        self.alt.de()
    }

    #[must_use]
    pub const fn hl_alt(&self) -> u16 {
        self.alt.hl()
    }

    pub fn set_af_alt(&mut self, value: u16) {
        (self.alt.a, self.alt.f) = split(value);
    }

    pub fn set_bc_alt(&mut self, value: u16) {
        (self.alt.b, self.alt.c) = split(value);
    }

    pub fn set_de_alt(&mut self, value: u16) {
        (self.alt.d, self.alt.e) = split(value);
    }

    pub fn set_hl_alt(&mut self, value: u16) {
        (self.alt.h, self.alt.l) = split(value);
    }

    #[must_use]
    pub const fn ixh(&self) -> u8 {
        (self.ix >> 8) as u8
    }

    #[must_use]
    pub const fn ixl(&self) -> u8 {
        self.ix as u8
    }

    #[must_use]
    pub const fn iyh(&self) -> u8 {
        (self.iy >> 8) as u8
    }

    #[must_use]
    pub const fn iyl(&self) -> u8 {
        self.iy as u8
    }

    pub fn set_ixh(&mut self, value: u8) {
        self.ix = (self.ix & 0x00FF) | u16::from(value) << 8;
    }

    pub fn set_ixl(&mut self, value: u8) {
        self.ix = (self.ix & 0xFF00) | u16::from(value);
    }

    pub fn set_iyh(&mut self, value: u8) {
        self.iy = (self.iy & 0x00FF) | u16::from(value) << 8;
    }

    pub fn set_iyl(&mut self, value: u8) {
        self.iy = (self.iy & 0xFF00) | u16::from(value);
    }

    /// The active bank as a value.
    #[must_use]
    pub const fn main_set(&self) -> RegisterSet {
        RegisterSet {
            a: self.a,
            f: self.f,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
        }
    }

    pub fn set_main_set(&mut self, set: RegisterSet) {
        let RegisterSet { a, f, b, c, d, e, h, l } = set;
        (self.a, self.f, self.b, self.c) = (a, f, b, c);
        (self.d, self.e, self.h, self.l) = (d, e, h, l);
    }

    /// `EX AF,AF'`.
    pub fn exchange_af(&mut self) {
        let main = self.main_set();
        let alt = self.alt;
        self.set_main_set(RegisterSet { a: alt.a, f: alt.f, ..main });
        self.alt = RegisterSet { a: main.a, f: main.f, ..alt };
    }

    /// `EXX`: swap BC, DE and HL with their shadows. AF is untouched.
    pub fn exx(&mut self) {
        let main = self.main_set();
        let alt = self.alt;
        self.set_main_set(RegisterSet { a: main.a, f: main.f, ..alt });
        self.alt = RegisterSet { a: alt.a, f: alt.f, ..main };
    }

    /// Swap the whole main bank (AF, BC, DE, HL) with the shadow bank.
    pub fn exchange_shadow(&mut self) {
        let main = self.main_set();
        self.set_main_set(self.alt);
        self.alt = main;
    }

    /// Advance the refresh counter by one M1 cycle. Bit 7 is preserved.
    pub fn increment_r(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }

    #[must_use]
    pub const fn get8(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::B => self.b,
            Reg8::C => self.c,
            Reg8::D => self.d,
            Reg8::E => self.e,
            Reg8::H => self.h,
            Reg8::L => self.l,
            Reg8::A => self.a,
        }
    }

    pub fn set8(&mut self, reg: Reg8, value: u8) {
        match reg {
            Reg8::B => self.b = value,
            Reg8::C => self.c = value,
            Reg8::D => self.d = value,
            Reg8::E => self.e = value,
            Reg8::H => self.h = value,
            Reg8::L => self.l = value,
            Reg8::A => self.a = value,
        }
    }

    #[must_use]
    pub const fn get16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::Bc => self.bc(),
            Reg16::De => self.de(),
            Reg16::Hl => self.hl(),
            Reg16::Sp => self.sp,
        }
    }

    pub fn set16(&mut self, reg: Reg16, value: u16) {
        match reg {
            Reg16::Bc => self.set_bc(value),
            Reg16::De => self.set_de(value),
            Reg16::Hl => self.set_hl(value),
            Reg16::Sp => self.sp = value,
        }
    }

    /// Read an 8-bit register by its opcode encoding (0-5, 7).
    pub fn reg8(&self, index: u8) -> Result<u8, RegisterError> {
        Reg8::try_from(index).map(|reg| self.get8(reg))
    }

    /// Write an 8-bit register by its opcode encoding (0-5, 7).
    pub fn set_reg8(&mut self, index: u8, value: u8) -> Result<(), RegisterError> {
        let reg = Reg8::try_from(index)?;
        self.set8(reg, value);
        Ok(())
    }

    /// Read a register pair by its `rp` encoding (0-3).
    pub fn reg16(&self, index: u8) -> Result<u16, RegisterError> {
        Reg16::try_from(index).map(|reg| self.get16(reg))
    }

    /// Write a register pair by its `rp` encoding (0-3).
    pub fn set_reg16(&mut self, index: u8, value: u16) -> Result<(), RegisterError> {
        let reg = Reg16::try_from(index)?;
        self.set16(reg, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_do_not_alias() {
        let mut regs = Registers::default();
        regs.set_hl(0x1234);
        regs.l = 0xFF;
        assert_eq!(regs.h, 0x12);
        assert_eq!(regs.hl(), 0x12FF);

        regs.ix = 0xABCD;
        regs.set_ixl(0x00);
        assert_eq!(regs.ixh(), 0xAB);
        regs.set_ixh(0x11);
        assert_eq!(regs.ix, 0x1100);
    }

    #[test]
    fn exchange_af_is_independent_of_exx() {
        let mut regs = Registers::default();
        regs.set_af(0x1122);
        regs.set_bc(0x3344);
        regs.exchange_af();
        assert_eq!(regs.af_alt(), 0x1122);
        assert_eq!(regs.bc(), 0x3344);
        regs.exx();
        assert_eq!(regs.bc_alt(), 0x3344);
        assert_eq!(regs.af(), 0xFFFF);
    }

    #[test]
    fn shadow_bank_swaps_by_value() {
        let mut regs = Registers::default();
        regs.set_hl(0x1234);
        regs.a = 0x56;
        regs.alt = RegisterSet { h: 0xAB, l: 0xCD, ..RegisterSet::default() };

        regs.exchange_shadow();
        assert_eq!(regs.hl(), 0xABCD);
        assert_eq!(regs.a, 0xFF);
        assert_eq!(regs.alt.hl(), 0x1234);
        assert_eq!(regs.alt.a, 0x56);

        // Changing the active bank never reaches the shadow copy
        regs.set_hl(0x0000);
        assert_eq!(regs.hl_alt(), 0x1234);
        regs.exchange_shadow();
        assert_eq!(regs.hl(), 0x1234);
        assert_eq!(regs.main_set().a, 0x56);
    }

    #[test]
    fn refresh_keeps_bit_seven() {
        let mut regs = Registers { r: 0xFF, ..Registers::default() };
        regs.increment_r();
        assert_eq!(regs.r, 0x80);
        regs.r = 0x7F;
        regs.increment_r();
        assert_eq!(regs.r, 0x00);
    }

    #[test]
    fn generic_accessors_reject_bad_indices() {
        let mut regs = Registers::default();
        assert_eq!(regs.set_reg8(7, 0x42), Ok(()));
        assert_eq!(regs.reg8(7), Ok(0x42));
        assert_eq!(regs.reg8(6), Err(RegisterError::InvalidReg8(6)));
        assert_eq!(regs.reg8(9), Err(RegisterError::InvalidReg8(9)));
        assert_eq!(regs.set_reg16(3, 0x8000), Ok(()));
        assert_eq!(regs.sp, 0x8000);
        assert_eq!(regs.reg16(4), Err(RegisterError::InvalidReg16(4)));
    }
}
