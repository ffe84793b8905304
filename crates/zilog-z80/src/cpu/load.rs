//! 8- and 16-bit loads and register exchanges.

use emu_core::Bus;

use super::{IndexMode, Z80};
use crate::flags::{CF, PF};

/// `LD r,r'`, `LD r,(HL)` and `LD (HL),r` (0x40-0x7F except HALT).
///
/// When one side is `(IX+d)`, the other side names the real H or L.
pub(super) fn ld_r_r(cpu: &mut Z80, bus: &mut dyn Bus) {
    let dst = (cpu.opcode >> 3) & 7;
    let src = cpu.opcode & 7;
    if src == 6 {
        let address = cpu.memory_operand(bus, 5);
        let value = cpu.read_memory(bus, address);
        cpu.set_plain_reg8(dst, value);
    } else if dst == 6 {
        let address = cpu.memory_operand(bus, 5);
        let value = cpu.plain_reg8(src);
        cpu.write_memory(bus, address, value);
    } else {
        let value = cpu.reg8(src);
        cpu.set_reg8(dst, value);
    }
}

/// `LD r,n` and `LD (HL),n`.
pub(super) fn ld_r_n(cpu: &mut Z80, bus: &mut dyn Bus) {
    let dst = (cpu.opcode >> 3) & 7;
    if dst == 6 {
        if cpu.index == IndexMode::Hl {
            let value = cpu.read_operand(bus);
            cpu.write_memory(bus, cpu.regs.hl(), value);
        } else {
            let address = cpu.memory_operand(bus, 0);
            let value = cpu.read_operand(bus);
            cpu.clock(2);
            cpu.write_memory(bus, address, value);
        }
    } else {
        let value = cpu.read_operand(bus);
        cpu.set_reg8(dst, value);
    }
}

/// `LD rr,nn`.
pub(super) fn ld_rp_nn(cpu: &mut Z80, bus: &mut dyn Bus) {
    let rp = (cpu.opcode >> 4) & 3;
    let value = cpu.read_operand_word(bus);
    let old_sp = cpu.regs.sp;
    cpu.set_reg16(rp, value);
    if rp == 3 {
        cpu.record_sp(|| format!("ld sp,{value:04X}H"), old_sp);
    }
}

/// The `z = 2` column: loads through BC, DE or an absolute address.
pub(super) fn ld_indirect(cpu: &mut Z80, bus: &mut dyn Bus) {
    let a = cpu.regs.a;
    match (cpu.opcode >> 3) & 7 {
        // LD (BC),A / LD (DE),A
        y @ (0 | 2) => {
            let address = if y == 0 { cpu.regs.bc() } else { cpu.regs.de() };
            cpu.write_memory(bus, address, a);
            cpu.regs.wz = u16::from(a) << 8 | (address.wrapping_add(1) & 0xFF);
        }
        // LD A,(BC) / LD A,(DE)
        y @ (1 | 3) => {
            let address = if y == 1 { cpu.regs.bc() } else { cpu.regs.de() };
            cpu.regs.a = cpu.read_memory(bus, address);
            cpu.regs.wz = address.wrapping_add(1);
        }
        // LD (nn),HL
        4 => {
            let address = cpu.read_operand_word(bus);
            let value = cpu.index_reg();
            cpu.write_word(bus, address, value);
            cpu.regs.wz = address.wrapping_add(1);
        }
        // LD HL,(nn)
        5 => {
            let address = cpu.read_operand_word(bus);
            let value = cpu.read_word(bus, address);
            cpu.set_index_reg(value);
            cpu.regs.wz = address.wrapping_add(1);
        }
        // LD (nn),A
        6 => {
            let address = cpu.read_operand_word(bus);
            cpu.write_memory(bus, address, a);
            cpu.regs.wz = u16::from(a) << 8 | (address.wrapping_add(1) & 0xFF);
        }
        // LD A,(nn)
        _ => {
            let address = cpu.read_operand_word(bus);
            cpu.regs.a = cpu.read_memory(bus, address);
            cpu.regs.wz = address.wrapping_add(1);
        }
    }
}

/// ED `LD (nn),rr`.
pub(super) fn ld_nn_rp(cpu: &mut Z80, bus: &mut dyn Bus) {
    let rp = (cpu.opcode >> 4) & 3;
    let address = cpu.read_operand_word(bus);
    let value = cpu.reg16(rp);
    cpu.write_word(bus, address, value);
    cpu.regs.wz = address.wrapping_add(1);
}

/// ED `LD rr,(nn)`.
pub(super) fn ld_rp_mem(cpu: &mut Z80, bus: &mut dyn Bus) {
    let rp = (cpu.opcode >> 4) & 3;
    let address = cpu.read_operand_word(bus);
    let value = cpu.read_word(bus, address);
    let old_sp = cpu.regs.sp;
    cpu.set_reg16(rp, value);
    cpu.regs.wz = address.wrapping_add(1);
    if rp == 3 {
        cpu.record_sp(|| format!("ld sp,({address:04X}H)"), old_sp);
    }
}

pub(super) fn ld_i_a(cpu: &mut Z80, _bus: &mut dyn Bus) {
    cpu.clock(1);
    cpu.regs.i = cpu.regs.a;
}

pub(super) fn ld_r_a(cpu: &mut Z80, _bus: &mut dyn Bus) {
    cpu.clock(1);
    cpu.regs.r = cpu.regs.a;
}

/// `LD A,I` and `LD A,R`: P/V reflects IFF2.
pub(super) fn ld_a_ir(cpu: &mut Z80, _bus: &mut dyn Bus) {
    cpu.clock(1);
    let value = if cpu.opcode == 0x57 { cpu.regs.i } else { cpu.regs.r };
    cpu.regs.a = value;
    let mut f = crate::flags::sz53(value) | (cpu.regs.f & CF);
    if cpu.regs.iff2 {
        f |= PF;
    }
    cpu.set_flags(f);
    cpu.after_ld_a_ir = true;
}

pub(super) fn ex_af(cpu: &mut Z80, _bus: &mut dyn Bus) {
    cpu.regs.exchange_af();
}

pub(super) fn exx(cpu: &mut Z80, _bus: &mut dyn Bus) {
    cpu.regs.exx();
}

/// `EX DE,HL` always swaps with HL, whatever the prefix.
pub(super) fn ex_de_hl(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let de = cpu.regs.de();
    cpu.regs.set_de(cpu.regs.hl());
    cpu.regs.set_hl(de);
}
