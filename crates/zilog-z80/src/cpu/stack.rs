//! PUSH, POP and direct stack pointer manipulation.

use emu_core::Bus;

use super::Z80;
use crate::debug::StackAccess;

/// Name and value of the `rp2` pair (BC, DE, HL/IX/IY, AF).
fn rp2(cpu: &Z80) -> (u8, &'static str) {
    let rp = (cpu.opcode >> 4) & 3;
    let name = if rp == 3 { "af" } else { cpu.reg16_name(rp) };
    (rp, name)
}

pub(super) fn push(cpu: &mut Z80, bus: &mut dyn Bus) {
    let (rp, name) = rp2(cpu);
    let value = if rp == 3 { cpu.regs.af() } else { cpu.reg16(rp) };
    let sp = cpu.regs.sp;
    cpu.clock(1);
    cpu.push_word(bus, value);
    cpu.record_stack(|| format!("push {name}"), StackAccess::Push, sp, value);
}

pub(super) fn pop(cpu: &mut Z80, bus: &mut dyn Bus) {
    let (rp, name) = rp2(cpu);
    let sp = cpu.regs.sp;
    let value = cpu.pop_word(bus);
    if rp == 3 {
        cpu.regs.set_af(value);
    } else {
        cpu.set_reg16(rp, value);
    }
    cpu.record_stack(|| format!("pop {name}"), StackAccess::Pop, sp, value);
}

/// `EX (SP),HL` and the indexed forms.
pub(super) fn ex_sp_hl(cpu: &mut Z80, bus: &mut dyn Bus) {
    let sp = cpu.regs.sp;
    let lo = cpu.read_memory(bus, sp);
    let hi = cpu.read_memory(bus, sp.wrapping_add(1));
    cpu.clock(1);
    let [reg_lo, reg_hi] = cpu.index_reg().to_le_bytes();
    cpu.write_memory(bus, sp.wrapping_add(1), reg_hi);
    cpu.write_memory(bus, sp, reg_lo);
    cpu.clock(2);
    let value = u16::from_le_bytes([lo, hi]);
    cpu.set_index_reg(value);
    cpu.regs.wz = value;
    let name = cpu.index_name();
    cpu.record_stack(
        || format!("ex (sp),{name}"),
        StackAccess::Exchange,
        sp,
        u16::from_le_bytes([reg_lo, reg_hi]),
    );
}

/// `LD SP,HL` and the indexed forms.
pub(super) fn ld_sp_hl(cpu: &mut Z80, _bus: &mut dyn Bus) {
    cpu.clock(2);
    let old_sp = cpu.regs.sp;
    cpu.regs.sp = cpu.index_reg();
    let name = cpu.index_name();
    cpu.record_sp(|| format!("ld sp,{name}"), old_sp);
}
