//! Block transfer, search and I/O (LDI, CPI, INI, OUTI and relatives).
//!
//! Opcode bit 3 selects decrementing addresses, bit 4 the repeating form.

use emu_core::Bus;

use super::Z80;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, sz53p};

fn step(op: u8) -> i16 {
    if op & 0x08 == 0 { 1 } else { -1 }
}

fn repeats(op: u8) -> bool {
    op & 0x10 != 0
}

impl Z80 {
    /// End of a repeating iteration that must go round again: 5 internal
    /// tacts, PC back on the instruction.
    ///
    /// Returns true if the caller should run the next iteration now. The
    /// opcode bytes are fetched again first, so R and contention behave as
    /// if the instruction had been re-executed.
    fn repeat_block(&mut self, bus: &mut dyn Bus) -> bool {
        self.clock(5);
        let start = self.regs.pc.wrapping_sub(2);
        self.regs.pc = start;
        self.regs.wz = start.wrapping_add(1);
        if self.config.stepwise_block_repeat {
            return false;
        }
        self.fetch_opcode(bus);
        self.fetch_opcode(bus);
        true
    }

    /// X/Y of a repeating iteration come from the high byte of PC.
    fn repeat_xy(&self) -> u8 {
        (self.regs.pc.wrapping_sub(2) >> 8) as u8 & (XF | YF)
    }
}

/// `LDI`, `LDD`, `LDIR`, `LDDR`: 16 tacts, 21 per repeat.
pub(super) fn transfer(cpu: &mut Z80, bus: &mut dyn Bus) {
    let step = step(cpu.opcode);
    loop {
        let value = cpu.read_memory(bus, cpu.regs.hl());
        cpu.write_memory(bus, cpu.regs.de(), value);
        cpu.clock(2);
        cpu.regs.set_hl(cpu.regs.hl().wrapping_add_signed(step));
        cpu.regs.set_de(cpu.regs.de().wrapping_add_signed(step));
        cpu.regs.set_bc(cpu.regs.bc().wrapping_sub(1));

        let n = value.wrapping_add(cpu.regs.a);
        let kept = cpu.regs.f & (SF | ZF | CF);
        let more = cpu.regs.bc() != 0;
        if repeats(cpu.opcode) && more {
            let f = kept | PF | cpu.repeat_xy();
            cpu.set_flags(f);
            if cpu.repeat_block(bus) {
                continue;
            }
            return;
        }
        let mut f = kept | (n & XF) | if n & 0x02 != 0 { YF } else { 0 };
        if more {
            f |= PF;
        }
        cpu.set_flags(f);
        return;
    }
}

/// `CPI`, `CPD`, `CPIR`, `CPDR`: repeats stop on a match or BC = 0.
pub(super) fn compare(cpu: &mut Z80, bus: &mut dyn Bus) {
    let step = step(cpu.opcode);
    loop {
        let value = cpu.read_memory(bus, cpu.regs.hl());
        cpu.clock(5);
        cpu.regs.wz = cpu.regs.wz.wrapping_add_signed(step);
        cpu.regs.set_hl(cpu.regs.hl().wrapping_add_signed(step));
        cpu.regs.set_bc(cpu.regs.bc().wrapping_sub(1));

        let a = cpu.regs.a;
        let result = a.wrapping_sub(value);
        let half = (a & 0x0F) < (value & 0x0F);
        let more = cpu.regs.bc() != 0;
        let mut f = (cpu.regs.f & CF) | NF | (result & SF);
        if result == 0 {
            f |= ZF;
        }
        if half {
            f |= HF;
        }
        if more {
            f |= PF;
        }

        if repeats(cpu.opcode) && more && result != 0 {
            cpu.set_flags(f | cpu.repeat_xy());
            if cpu.repeat_block(bus) {
                continue;
            }
            return;
        }
        let n = result.wrapping_sub(u8::from(half));
        f |= (n & XF) | if n & 0x02 != 0 { YF } else { 0 };
        cpu.set_flags(f);
        return;
    }
}

/// Flags shared by the block I/O instructions. `k` is the transferred byte
/// plus the adjusted C (input) or L (output).
fn io_flags(cpu: &Z80, value: u8, k: u16, repeating: bool) -> u8 {
    let b = cpu.regs.b;
    let carry = k > 0xFF;
    let p = (k as u8 & 7) ^ b;

    let mut f = b & (SF | YF | XF);
    if b == 0 {
        f |= ZF;
    }
    if value & 0x80 != 0 {
        f |= NF;
    }
    if !repeating {
        if carry {
            f |= HF | CF;
        }
        return f | (sz53p(p) & PF);
    }

    // Repeating: X/Y from PC, H and P/V recomputed from the B that the next
    // iteration will decrement.
    f = (f & !(YF | XF)) | cpu.repeat_xy();
    if carry {
        f |= CF;
        if value & 0x80 != 0 {
            if b & 0x0F == 0 {
                f |= HF;
            }
            f |= sz53p(p ^ (b.wrapping_sub(1) & 7)) & PF;
        } else {
            if b & 0x0F == 0x0F {
                f |= HF;
            }
            f |= sz53p(p ^ (b.wrapping_add(1) & 7)) & PF;
        }
    } else {
        f |= sz53p(p ^ (b & 7)) & PF;
    }
    f
}

/// `INI`, `IND`, `INIR`, `INDR`.
pub(super) fn input(cpu: &mut Z80, bus: &mut dyn Bus) {
    let step = step(cpu.opcode);
    loop {
        cpu.clock(1);
        let port = cpu.regs.bc();
        let value = cpu.read_port(bus, port);
        cpu.regs.wz = port.wrapping_add_signed(step);
        cpu.write_memory(bus, cpu.regs.hl(), value);
        cpu.regs.b = cpu.regs.b.wrapping_sub(1);
        cpu.regs.set_hl(cpu.regs.hl().wrapping_add_signed(step));

        let k = u16::from(value) + u16::from(cpu.regs.c.wrapping_add_signed(step as i8));
        let repeating = repeats(cpu.opcode) && cpu.regs.b != 0;
        let f = io_flags(cpu, value, k, repeating);
        cpu.set_flags(f);
        if repeating && cpu.repeat_block(bus) {
            continue;
        }
        return;
    }
}

/// `OUTI`, `OUTD`, `OTIR`, `OTDR`: B is decremented before it reaches the
/// port address.
pub(super) fn output(cpu: &mut Z80, bus: &mut dyn Bus) {
    let step = step(cpu.opcode);
    loop {
        cpu.clock(1);
        let value = cpu.read_memory(bus, cpu.regs.hl());
        cpu.regs.b = cpu.regs.b.wrapping_sub(1);
        let port = cpu.regs.bc();
        cpu.write_port(bus, port, value);
        cpu.regs.wz = port.wrapping_add_signed(step);
        cpu.regs.set_hl(cpu.regs.hl().wrapping_add_signed(step));

        let k = u16::from(value) + u16::from(cpu.regs.l);
        let repeating = repeats(cpu.opcode) && cpu.regs.b != 0;
        let f = io_flags(cpu, value, k, repeating);
        cpu.set_flags(f);
        if repeating && cpu.repeat_block(bus) {
            continue;
        }
        return;
    }
}
