//! Jumps, calls, returns and restarts.

use emu_core::Bus;

use super::Z80;
use crate::debug::StackAccess;

const CONDITIONS: [&str; 8] = ["nz", "z", "nc", "c", "po", "pe", "p", "m"];

fn condition_name(cpu: &Z80) -> &'static str {
    CONDITIONS[usize::from((cpu.opcode >> 3) & 7)]
}

pub(super) fn jp_nn(cpu: &mut Z80, bus: &mut dyn Bus) {
    let target = cpu.read_operand_word(bus);
    cpu.regs.wz = target;
    cpu.regs.pc = target;
    cpu.record_branch(|| format!("jp {target:04X}H"), target, true);
}

/// `JP cc,nn`: the operand is always read, WZ always loaded.
pub(super) fn jp_cc(cpu: &mut Z80, bus: &mut dyn Bus) {
    let target = cpu.read_operand_word(bus);
    cpu.regs.wz = target;
    let taken = cpu.condition(cpu.opcode >> 3);
    if taken {
        cpu.regs.pc = target;
    }
    let cc = condition_name(cpu);
    cpu.record_branch(|| format!("jp {cc},{target:04X}H"), cpu.regs.pc, taken);
}

/// `JP (HL)`, `JP (IX)`, `JP (IY)`: no memory access despite the syntax.
pub(super) fn jp_hl(cpu: &mut Z80, _bus: &mut dyn Bus) {
    let target = cpu.index_reg();
    cpu.regs.pc = target;
    let name = cpu.index_name();
    cpu.record_branch(|| format!("jp ({name})"), target, true);
}

fn relative_target(cpu: &Z80, d: u8) -> u16 {
    cpu.regs.pc.wrapping_add_signed(i16::from(d as i8))
}

pub(super) fn jr(cpu: &mut Z80, bus: &mut dyn Bus) {
    let d = cpu.read_operand(bus);
    cpu.clock(5);
    let target = relative_target(cpu, d);
    cpu.regs.wz = target;
    cpu.regs.pc = target;
    cpu.record_branch(|| format!("jr {target:04X}H"), target, true);
}

/// `JR NZ/Z/NC/C,d`: 7 tacts falling through, 12 taken.
pub(super) fn jr_cc(cpu: &mut Z80, bus: &mut dyn Bus) {
    let d = cpu.read_operand(bus);
    let target = relative_target(cpu, d);
    let cc = (cpu.opcode >> 3) & 3;
    let taken = cpu.condition(cc);
    if taken {
        cpu.clock(5);
        cpu.regs.wz = target;
        cpu.regs.pc = target;
    }
    let name = CONDITIONS[usize::from(cc)];
    cpu.record_branch(|| format!("jr {name},{target:04X}H"), cpu.regs.pc, taken);
}

pub(super) fn djnz(cpu: &mut Z80, bus: &mut dyn Bus) {
    cpu.clock(1);
    let d = cpu.read_operand(bus);
    let target = relative_target(cpu, d);
    cpu.regs.b = cpu.regs.b.wrapping_sub(1);
    let taken = cpu.regs.b != 0;
    if taken {
        cpu.clock(5);
        cpu.regs.wz = target;
        cpu.regs.pc = target;
    }
    cpu.record_branch(|| format!("djnz {target:04X}H"), cpu.regs.pc, taken);
}

fn enter_subroutine(cpu: &mut Z80, bus: &mut dyn Bus, target: u16, mnemonic: &dyn Fn() -> String) {
    let sp = cpu.regs.sp;
    let return_address = cpu.regs.pc;
    cpu.push_word(bus, return_address);
    cpu.regs.pc = target;
    cpu.record_stack(mnemonic, StackAccess::Push, sp, return_address);
    cpu.record_branch(mnemonic, target, true);
}

pub(super) fn call(cpu: &mut Z80, bus: &mut dyn Bus) {
    let target = cpu.read_operand_word(bus);
    cpu.regs.wz = target;
    cpu.clock(1);
    enter_subroutine(cpu, bus, target, &|| format!("call {target:04X}H"));
}

/// `CALL cc,nn`: 10 tacts falling through, 17 taken.
pub(super) fn call_cc(cpu: &mut Z80, bus: &mut dyn Bus) {
    let target = cpu.read_operand_word(bus);
    cpu.regs.wz = target;
    let cc = condition_name(cpu);
    if cpu.condition(cpu.opcode >> 3) {
        cpu.clock(1);
        enter_subroutine(cpu, bus, target, &|| format!("call {cc},{target:04X}H"));
    } else {
        cpu.record_branch(|| format!("call {cc},{target:04X}H"), cpu.regs.pc, false);
    }
}

pub(super) fn rst(cpu: &mut Z80, bus: &mut dyn Bus) {
    let target = u16::from(cpu.opcode & 0x38);
    cpu.clock(1);
    cpu.regs.wz = target;
    enter_subroutine(cpu, bus, target, &|| format!("rst {target:02X}H"));
}

fn leave_subroutine(cpu: &mut Z80, bus: &mut dyn Bus, mnemonic: &dyn Fn() -> String) {
    let sp = cpu.regs.sp;
    let target = cpu.pop_word(bus);
    cpu.regs.wz = target;
    cpu.regs.pc = target;
    cpu.record_stack(mnemonic, StackAccess::Pop, sp, target);
    cpu.record_branch(mnemonic, target, true);
}

pub(super) fn ret(cpu: &mut Z80, bus: &mut dyn Bus) {
    leave_subroutine(cpu, bus, &|| "ret".to_string());
}

/// `RET cc`: 5 tacts falling through, 11 taken.
pub(super) fn ret_cc(cpu: &mut Z80, bus: &mut dyn Bus) {
    cpu.clock(1);
    let cc = condition_name(cpu);
    if cpu.condition(cpu.opcode >> 3) {
        leave_subroutine(cpu, bus, &|| format!("ret {cc}"));
    } else {
        cpu.record_branch(|| format!("ret {cc}"), cpu.regs.pc, false);
    }
}

/// `RETN` and `RETI` (and their mirrors): IFF1 is restored from IFF2.
pub(super) fn retn(cpu: &mut Z80, bus: &mut dyn Bus) {
    cpu.regs.iff1 = cpu.regs.iff2;
    let mnemonic = if cpu.opcode == 0x4D { "reti" } else { "retn" };
    leave_subroutine(cpu, bus, &|| mnemonic.to_string());
}
