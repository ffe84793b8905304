//! CB-prefixed rotates, shifts and bit operations, plain and indexed.

use emu_core::Bus;

use super::Z80;
use crate::alu::{self, ShiftOp};

fn bit_number(cpu: &Z80) -> u8 {
    (cpu.opcode >> 3) & 7
}

/// RES clears, SET sets; bit 6 of the opcode tells them apart.
fn res_set(op: u8, value: u8) -> u8 {
    let mask = 1 << ((op >> 3) & 7);
    if op & 0x40 == 0 { value & !mask } else { value | mask }
}

pub(super) fn shift_r(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let r = cpu.opcode & 7;
    let result = ShiftOp::from_opcode(cpu.opcode).apply(cpu.plain_reg8(r), cpu.regs.f);
    cpu.set_plain_reg8(r, result.value);
    cpu.set_flags(result.flags);
}

pub(super) fn shift_hl(cpu: &mut Z80, bus: &mut dyn Bus) {
    let hl = cpu.regs.hl();
    let value = cpu.read_memory(bus, hl);
    cpu.clock(1);
    let result = ShiftOp::from_opcode(cpu.opcode).apply(value, cpu.regs.f);
    cpu.write_memory(bus, hl, result.value);
    cpu.set_flags(result.flags);
}

pub(super) fn bit_r(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let value = cpu.plain_reg8(cpu.opcode & 7);
    let f = alu::bit(bit_number(cpu), value, value, cpu.regs.f);
    cpu.set_flags(f);
}

/// `BIT n,(HL)`: X/Y leak from the high byte of WZ.
pub(super) fn bit_hl(cpu: &mut Z80, bus: &mut dyn Bus) {
    let value = cpu.read_memory(bus, cpu.regs.hl());
    cpu.clock(1);
    let f = alu::bit(bit_number(cpu), value, (cpu.regs.wz >> 8) as u8, cpu.regs.f);
    cpu.set_flags(f);
}

pub(super) fn res_set_r(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let r = cpu.opcode & 7;
    let value = res_set(cpu.opcode, cpu.plain_reg8(r));
    cpu.set_plain_reg8(r, value);
}

pub(super) fn res_set_hl(cpu: &mut Z80, bus: &mut dyn Bus) {
    let hl = cpu.regs.hl();
    let value = cpu.read_memory(bus, hl);
    cpu.clock(1);
    cpu.write_memory(bus, hl, res_set(cpu.opcode, value));
}

/// Store a DDCB/FDCB result to `(IX+d)` and, unless the register field is 6,
/// copy it into that register as well.
fn write_back_indexed(cpu: &mut Z80, bus: &mut dyn Bus, value: u8) {
    cpu.write_memory(bus, cpu.indexed_address, value);
    let r = cpu.opcode & 7;
    if r != 6 {
        cpu.set_plain_reg8(r, value);
    }
}

pub(super) fn shift_indexed(cpu: &mut Z80, bus: &mut dyn Bus) {
    let value = cpu.read_memory(bus, cpu.indexed_address);
    cpu.clock(1);
    let result = ShiftOp::from_opcode(cpu.opcode).apply(value, cpu.regs.f);
    write_back_indexed(cpu, bus, result.value);
    cpu.set_flags(result.flags);
}

/// `BIT n,(IX+d)`: X/Y come from the high byte of the effective address.
pub(super) fn bit_indexed(cpu: &mut Z80, bus: &mut dyn Bus) {
    let value = cpu.read_memory(bus, cpu.indexed_address);
    cpu.clock(1);
    let xy = (cpu.indexed_address >> 8) as u8;
    let f = alu::bit(bit_number(cpu), value, xy, cpu.regs.f);
    cpu.set_flags(f);
}

pub(super) fn res_set_indexed(cpu: &mut Z80, bus: &mut dyn Bus) {
    let value = cpu.read_memory(bus, cpu.indexed_address);
    cpu.clock(1);
    write_back_indexed(cpu, bus, res_set(cpu.opcode, value));
}
