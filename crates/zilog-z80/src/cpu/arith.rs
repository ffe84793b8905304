//! Arithmetic, logic and accumulator operations.

use emu_core::Bus;

use super::Z80;
use crate::alu::{self, AluOp, ShiftOp};
use crate::flags::{CF, DAA_TABLE, HF, NF, PF, SF, SZ53P, XF, YF, ZF, daa_index};

/// `ALU A,r` and `ALU A,(HL)`.
pub(super) fn alu_r(cpu: &mut Z80, bus: &mut dyn Bus) {
    let src = cpu.opcode & 7;
    let operand = if src == 6 {
        let address = cpu.memory_operand(bus, 5);
        cpu.read_memory(bus, address)
    } else {
        cpu.reg8(src)
    };
    accumulate(cpu, operand);
}

/// `ALU A,n`.
pub(super) fn alu_n(cpu: &mut Z80, bus: &mut dyn Bus) {
    let operand = cpu.read_operand(bus);
    accumulate(cpu, operand);
}

fn accumulate(cpu: &mut Z80, operand: u8) {
    let result = AluOp::from_opcode(cpu.opcode).apply(cpu.regs.a, operand, cpu.regs.f);
    cpu.regs.a = result.value;
    cpu.set_flags(result.flags);
}

/// `INC r` and `INC (HL)`.
pub(super) fn inc_r(cpu: &mut Z80, bus: &mut dyn Bus) {
    step_r(cpu, bus, alu::inc8);
}

/// `DEC r` and `DEC (HL)`.
pub(super) fn dec_r(cpu: &mut Z80, bus: &mut dyn Bus) {
    step_r(cpu, bus, alu::dec8);
}

fn step_r(cpu: &mut Z80, bus: &mut dyn Bus, op: fn(u8, u8) -> alu::AluResult) {
    let r = (cpu.opcode >> 3) & 7;
    if r == 6 {
        let address = cpu.memory_operand(bus, 5);
        let value = cpu.read_memory(bus, address);
        cpu.clock(1);
        let result = op(value, cpu.regs.f);
        cpu.write_memory(bus, address, result.value);
        cpu.set_flags(result.flags);
    } else {
        let result = op(cpu.reg8(r), cpu.regs.f);
        cpu.set_reg8(r, result.value);
        cpu.set_flags(result.flags);
    }
}

/// `INC rr`.
pub(super) fn inc_rp(cpu: &mut Z80, _bus: &mut dyn Bus) {
    step_rp(cpu, 1);
}

/// `DEC rr`.
pub(super) fn dec_rp(cpu: &mut Z80, _bus: &mut dyn Bus) {
    step_rp(cpu, -1);
}

fn step_rp(cpu: &mut Z80, delta: i16) {
    let rp = (cpu.opcode >> 4) & 3;
    cpu.clock(2);
    let old = cpu.reg16(rp);
    cpu.set_reg16(rp, old.wrapping_add_signed(delta));
    if rp == 3 {
        let mnemonic = if delta > 0 { "inc sp" } else { "dec sp" };
        cpu.record_sp(|| mnemonic.to_string(), old);
    }
}

/// `ADD HL,rr` (and `ADD IX,rr` / `ADD IY,rr`).
pub(super) fn add_hl_rp(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let rp = (cpu.opcode >> 4) & 3;
    let hl = cpu.index_reg();
    let operand = cpu.reg16(rp);
    cpu.clock(7);
    let (result, f) = alu::add16(hl, operand, cpu.regs.f);
    cpu.regs.wz = hl.wrapping_add(1);
    cpu.set_index_reg(result);
    cpu.set_flags(f);
}

/// ED `ADC HL,rr`.
pub(super) fn adc_hl(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let rp = (cpu.opcode >> 4) & 3;
    let hl = cpu.regs.hl();
    let operand = cpu.reg16(rp);
    cpu.clock(7);
    let (result, f) = alu::adc16(hl, operand, cpu.regs.f & CF != 0);
    cpu.regs.wz = hl.wrapping_add(1);
    cpu.regs.set_hl(result);
    cpu.set_flags(f);
}

/// ED `SBC HL,rr`.
pub(super) fn sbc_hl(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let rp = (cpu.opcode >> 4) & 3;
    let hl = cpu.regs.hl();
    let operand = cpu.reg16(rp);
    cpu.clock(7);
    let (result, f) = alu::sbc16(hl, operand, cpu.regs.f & CF != 0);
    cpu.regs.wz = hl.wrapping_add(1);
    cpu.regs.set_hl(result);
    cpu.set_flags(f);
}

/// `RLCA`, `RRCA`, `RLA`, `RRA`.
pub(super) fn rotate_a(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let result = ShiftOp::from_opcode(cpu.opcode).apply_accumulator(cpu.regs.a, cpu.regs.f);
    cpu.regs.a = result.value;
    cpu.set_flags(result.flags);
}

pub(super) fn daa(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let packed = DAA_TABLE[daa_index(cpu.regs.a, cpu.regs.f)];
    cpu.regs.a = (packed >> 8) as u8;
    cpu.set_flags(packed as u8);
}

pub(super) fn cpl(cpu: &mut Z80, _bus: &mut dyn Bus) {
    cpu.regs.a = !cpu.regs.a;
    let f = (cpu.regs.f & (SF | ZF | PF | CF)) | HF | NF | (cpu.regs.a & (YF | XF));
    cpu.set_flags(f);
}

/// X/Y for SCF and CCF: `(Q ^ F) | A`, where Q is the flag byte the previous
/// instruction wrote (0 if it left F alone).
fn carry_op_xy(cpu: &Z80) -> u8 {
    ((cpu.prev_q ^ cpu.regs.f) | cpu.regs.a) & (YF | XF)
}

pub(super) fn scf(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let f = (cpu.regs.f & (SF | ZF | PF)) | carry_op_xy(cpu) | CF;
    cpu.set_flags(f);
}

pub(super) fn ccf(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let old = cpu.regs.f;
    let mut f = (old & (SF | ZF | PF)) | carry_op_xy(cpu);
    if old & CF != 0 {
        f |= HF;
    } else {
        f |= CF;
    }
    cpu.set_flags(f);
}

/// `NEG` and its seven undocumented mirrors.
pub(super) fn neg(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let result = alu::sub8(0, cpu.regs.a, false);
    cpu.regs.a = result.value;
    cpu.set_flags(result.flags);
}

/// `RRD`: rotate the low nibbles of A and (HL) right.
pub(super) fn rrd(cpu: &mut Z80, bus: &mut dyn Bus) {
    let hl = cpu.regs.hl();
    let mem = cpu.read_memory(bus, hl);
    cpu.clock(4);
    let a = cpu.regs.a;
    cpu.write_memory(bus, hl, (a << 4) | (mem >> 4));
    cpu.regs.a = (a & 0xF0) | (mem & 0x0F);
    finish_nibble_rotate(cpu, hl);
}

/// `RLD`: rotate the low nibbles of A and (HL) left.
pub(super) fn rld(cpu: &mut Z80, bus: &mut dyn Bus) {
    let hl = cpu.regs.hl();
    let mem = cpu.read_memory(bus, hl);
    cpu.clock(4);
    let a = cpu.regs.a;
    cpu.write_memory(bus, hl, (mem << 4) | (a & 0x0F));
    cpu.regs.a = (a & 0xF0) | (mem >> 4);
    finish_nibble_rotate(cpu, hl);
}

fn finish_nibble_rotate(cpu: &mut Z80, hl: u16) {
    cpu.regs.wz = hl.wrapping_add(1);
    let f = SZ53P[usize::from(cpu.regs.a)] | (cpu.regs.f & CF);
    cpu.set_flags(f);
}
