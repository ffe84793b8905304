//! Port input and output.

use emu_core::Bus;

use super::Z80;
use crate::flags::{CF, SZ53P};

/// `IN A,(n)`: the port address is `A << 8 | n`. Flags are untouched.
pub(super) fn in_a_n(cpu: &mut Z80, bus: &mut dyn Bus) {
    let n = cpu.read_operand(bus);
    let port = u16::from(cpu.regs.a) << 8 | u16::from(n);
    cpu.regs.a = cpu.read_port(bus, port);
    cpu.regs.wz = port.wrapping_add(1);
}

/// `OUT (n),A`: the port address is `A << 8 | n`.
pub(super) fn out_n_a(cpu: &mut Z80, bus: &mut dyn Bus) {
    let n = cpu.read_operand(bus);
    let a = cpu.regs.a;
    let port = u16::from(a) << 8 | u16::from(n);
    cpu.write_port(bus, port, a);
    cpu.regs.wz = u16::from(a) << 8 | u16::from(n.wrapping_add(1));
}

/// `IN r,(C)`; ED 70 (`IN (C)`) sets flags and discards the byte.
pub(super) fn in_r_c(cpu: &mut Z80, bus: &mut dyn Bus) {
    let port = cpu.regs.bc();
    let value = cpu.read_port(bus, port);
    cpu.regs.wz = port.wrapping_add(1);
    let r = (cpu.opcode >> 3) & 7;
    if r != 6 {
        cpu.set_plain_reg8(r, value);
    }
    let f = SZ53P[usize::from(value)] | (cpu.regs.f & CF);
    cpu.set_flags(f);
}

/// `OUT (C),r`; ED 71 (`OUT (C),0`) writes zero on NMOS parts.
pub(super) fn out_c_r(cpu: &mut Z80, bus: &mut dyn Bus) {
    let port = cpu.regs.bc();
    let r = (cpu.opcode >> 3) & 7;
    let value = if r == 6 { 0 } else { cpu.plain_reg8(r) };
    cpu.write_port(bus, port, value);
    cpu.regs.wz = port.wrapping_add(1);
}
