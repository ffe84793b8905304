//! NOP, HALT and interrupt-enable control.

use emu_core::Bus;
use log::debug;

use super::Z80;

/// `NOP`, and every undefined ED opcode (the prefix fetch already cost 4).
pub(super) fn nop(_cpu: &mut Z80, _bus: &mut dyn Bus) {}

/// `HALT`: PC stays on the opcode until an interrupt steps past it.
pub(super) fn halt(cpu: &mut Z80, _bus: &mut dyn Bus) {
    cpu.regs.halted = true;
    cpu.regs.pc = cpu.regs.pc.wrapping_sub(1);
}

pub(super) fn di(cpu: &mut Z80, _bus: &mut dyn Bus) {
    cpu.regs.iff1 = false;
    cpu.regs.iff2 = false;
}

pub(super) fn ei(cpu: &mut Z80, _bus: &mut dyn Bus) {
    cpu.regs.iff1 = true;
    cpu.regs.iff2 = true;
    cpu.ei_delay = true;
}

/// `IM 0/1/2`, including the undocumented mirrors (ED 4E/6E select mode 0).
pub(super) fn im(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let mode = match (cpu.opcode >> 3) & 3 {
        2 => 1,
        3 => 2,
        _ => 0,
    };
    if cpu.regs.im != mode {
        debug!("interrupt mode {mode} at {:04X}", cpu.op_address);
    }
    cpu.regs.im = mode;
}
