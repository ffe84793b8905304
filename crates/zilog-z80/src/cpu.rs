//! Z80 CPU core.
//!
//! `execute_one` runs one complete instruction, prefixes included, or accepts
//! one pending interrupt. Memory and port traffic goes through [`Bus`] in the
//! order the hardware issues it, and the tact counter advances access by
//! access so a host's wait-state hooks see real timestamps.
//!
//! A run of DD/FD prefixes is the one exception to "one call, one
//! instruction": when an index prefix is followed by another, the call ends
//! with the later prefix latched, and the next call carries on from it
//! without sampling INT or NMI.

mod arith;
mod bit;
mod block;
mod branch;
mod control;
mod dispatch;
mod extended;
mod interrupt;
mod load;
mod stack;

use emu_core::{Bus, Cpu, Observable, Value};
use log::debug;

pub use interrupt::{IM1_VECTOR, NMI_VECTOR};

use crate::debug::{
    BranchEvent, BranchObserver, StackAccess, StackContentEvent, StackObserver, StackPointerEvent,
};
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::registers::Registers;
use crate::tracking::AccessTracker;

/// Which register an `HL`-shaped operand resolves to under the current prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexMode {
    Hl,
    Ix,
    Iy,
}

/// Behaviour switches for a [`Z80`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Z80Config {
    /// Return from `execute_one` after each iteration of LDIR, CPIR, INIR,
    /// OTIR and their decrementing forms, with PC rewound to the instruction.
    /// Off by default: a repeat runs to completion inside one call.
    pub stepwise_block_repeat: bool,
}

/// Latches carried between instructions that are not part of the register
/// file. Snapshot loaders and conformance harnesses need them to resume
/// execution mid-stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InternalState {
    /// EI was the last instruction executed.
    pub ei_delay: bool,
    /// `LD A,I` or `LD A,R` was the last instruction executed.
    pub after_ld_a_ir: bool,
    /// Flags written by the last instruction, 0 if it left F alone.
    pub q: u8,
    /// DD or FD fetched but not yet followed by an opcode.
    pub index_prefix: Option<u8>,
}

/// The Z80 CPU.
pub struct Z80 {
    regs: Registers,
    config: Z80Config,
    /// T-states since reset.
    tacts: u64,

    /// Final opcode byte of the instruction being executed.
    opcode: u8,
    index: IndexMode,
    /// Index prefix carried into the next call.
    latched_index: Option<IndexMode>,
    /// Address of the instruction being executed, after redundant prefixes.
    op_address: u16,
    /// Effective address of a DDCB/FDCB instruction.
    indexed_address: u16,

    /// Data bus byte while INT is asserted.
    int_line: Option<u8>,
    nmi_pending: bool,
    /// EI was the last instruction; INT is not sampled before the next one.
    ei_delay: bool,
    /// F as written by the current instruction, or 0 if it left F alone.
    q: u8,
    /// `q` of the previous instruction (feeds SCF/CCF X/Y).
    prev_q: u8,
    /// The previous instruction was `LD A,I` or `LD A,R`.
    after_ld_a_ir: bool,

    branch_observer: Option<Box<dyn BranchObserver>>,
    stack_observer: Option<Box<dyn StackObserver>>,
    tracker: Option<Box<AccessTracker>>,
}

impl Z80 {
    /// Create a CPU in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Z80Config::default())
    }

    #[must_use]
    pub fn with_config(config: Z80Config) -> Self {
        Self {
            regs: Registers::default(),
            config,
            tacts: 0,
            opcode: 0,
            index: IndexMode::Hl,
            latched_index: None,
            op_address: 0,
            indexed_address: 0,
            int_line: None,
            nmi_pending: false,
            ei_delay: false,
            q: 0,
            prev_q: 0,
            after_ld_a_ir: false,
            branch_observer: None,
            stack_observer: None,
            tracker: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> Z80Config {
        self.config
    }

    /// Read-only view of the register file.
    #[must_use]
    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    /// Mutable register access for hosts loading snapshots or test state.
    pub fn regs_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// T-states elapsed since reset.
    #[must_use]
    pub fn tacts(&self) -> u64 {
        self.tacts
    }

    #[must_use]
    pub fn internal_state(&self) -> InternalState {
        InternalState {
            ei_delay: self.ei_delay,
            after_ld_a_ir: self.after_ld_a_ir,
            q: self.q,
            index_prefix: self.latched_index.map(|index| match index {
                IndexMode::Iy => 0xFD,
                _ => 0xDD,
            }),
        }
    }

    pub fn set_internal_state(&mut self, state: InternalState) {
        self.ei_delay = state.ei_delay;
        self.after_ld_a_ir = state.after_ld_a_ir;
        self.q = state.q;
        self.latched_index = match state.index_prefix {
            Some(0xDD) => Some(IndexMode::Ix),
            Some(0xFD) => Some(IndexMode::Iy),
            _ => None,
        };
    }

    /// Let the host burn T-states outside instruction execution (for example
    /// while it holds the CPU off the bus).
    pub fn delay(&mut self, tacts: u32) {
        self.clock(tacts);
    }

    /// Move the tact counter forward to `tacts`, for example to line up with
    /// a frame position restored from a snapshot. The counter never runs
    /// backwards; an earlier value is ignored.
    pub fn set_tacts(&mut self, tacts: u64) {
        if tacts < self.tacts {
            debug!("ignoring set_tacts({tacts}) behind counter {}", self.tacts);
            return;
        }
        self.tacts = tacts;
    }

    /// Replace the branch observer. `None` disables branch events.
    pub fn set_branch_observer(&mut self, observer: Option<Box<dyn BranchObserver>>) {
        self.branch_observer = observer;
    }

    /// Replace the stack observer. `None` disables stack events.
    pub fn set_stack_observer(&mut self, observer: Option<Box<dyn StackObserver>>) {
        self.stack_observer = observer;
    }

    /// Start recording execution, read and write addresses.
    pub fn enable_access_tracking(&mut self) {
        if self.tracker.is_none() {
            self.tracker = Some(Box::default());
        }
    }

    /// Stop recording and drop the maps.
    pub fn disable_access_tracking(&mut self) {
        self.tracker = None;
    }

    #[must_use]
    pub fn access_tracker(&self) -> Option<&AccessTracker> {
        self.tracker.as_deref()
    }

    pub fn access_tracker_mut(&mut self) -> Option<&mut AccessTracker> {
        self.tracker.as_deref_mut()
    }

    /// Execute one instruction, or accept one pending interrupt, and return
    /// the T-states consumed. A redundant DD/FD prefix also ends the call.
    pub fn execute_one(&mut self, bus: &mut dyn Bus) -> u32 {
        let start = self.tacts;
        let int_blocked = std::mem::take(&mut self.ei_delay);
        let after_ld_a_ir = std::mem::take(&mut self.after_ld_a_ir);
        self.prev_q = self.q;
        self.q = 0;

        if let Some(index) = self.latched_index.take() {
            self.continue_indexed(bus, index);
        } else if self.nmi_pending {
            self.nmi_pending = false;
            self.accept_nmi(bus);
        } else if let Some(data) = self.int_line.filter(|_| self.regs.iff1 && !int_blocked) {
            if after_ld_a_ir {
                self.regs.f &= !PF;
            }
            self.accept_interrupt(bus, data);
        } else if self.regs.halted {
            // HALT keeps issuing refresh cycles at the HALT opcode
            self.memory_wait(bus, self.regs.pc);
            self.clock(4);
            self.regs.increment_r();
        } else {
            self.execute_instruction(bus);
        }

        (self.tacts - start) as u32
    }

    fn execute_instruction(&mut self, bus: &mut dyn Bus) {
        self.op_address = self.regs.pc;
        match self.fetch_opcode(bus) {
            0xDD => self.continue_indexed(bus, IndexMode::Ix),
            0xFD => self.continue_indexed(bus, IndexMode::Iy),
            op => {
                self.index = IndexMode::Hl;
                self.execute_opcode(bus, op);
            }
        }
    }

    /// Fetch the byte after a DD/FD prefix. A further index prefix makes the
    /// current one redundant: it is latched and the call ends.
    fn continue_indexed(&mut self, bus: &mut dyn Bus, index: IndexMode) {
        self.index = index;
        self.op_address = self.regs.pc.wrapping_sub(1);
        match self.fetch_opcode(bus) {
            0xDD => self.latched_index = Some(IndexMode::Ix),
            0xFD => self.latched_index = Some(IndexMode::Iy),
            op => self.execute_opcode(bus, op),
        }
    }

    fn execute_opcode(&mut self, bus: &mut dyn Bus, op: u8) {
        match op {
            0xCB if self.index == IndexMode::Hl => {
                self.opcode = self.fetch_opcode(bus);
                dispatch::CB[usize::from(self.opcode)](self, bus);
            }
            0xCB => {
                let d = self.read_operand(bus) as i8;
                self.opcode = self.read_operand(bus);
                self.clock(2);
                self.indexed_address = self.index_reg().wrapping_add_signed(i16::from(d));
                self.regs.wz = self.indexed_address;
                dispatch::INDEXED_CB[usize::from(self.opcode)](self, bus);
            }
            0xED => {
                // ED cancels any DD/FD in front of it
                self.index = IndexMode::Hl;
                self.opcode = self.fetch_opcode(bus);
                dispatch::ED[usize::from(self.opcode)](self, bus);
            }
            _ => {
                self.opcode = op;
                dispatch::BASE[usize::from(op)](self, bus);
            }
        }
    }

    /// Length of the instruction at PC if it is call-like (CALL, RST, DJNZ,
    /// HALT or a block repeat), otherwise 0.
    ///
    /// A debugger steps over such an instruction by running until PC equals
    /// `pc + length`. Memory is read through the bus; no tacts elapse.
    pub fn call_instruction_length(&self, bus: &mut dyn Bus) -> u16 {
        let pc = self.regs.pc;
        match bus.read(pc) {
            0xCD | 0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => 3,
            0x10 => 2,
            0x76 => 1,
            op if op & 0xC7 == 0xC7 => 1,
            0xED => match bus.read(pc.wrapping_add(1)) {
                0xB0..=0xB3 | 0xB8..=0xBB => 2,
                _ => 0,
            },
            _ => 0,
        }
    }

    // =========================================================================
    // Bus access
    // =========================================================================

    fn clock(&mut self, tacts: u32) {
        self.tacts += u64::from(tacts);
    }

    fn memory_wait(&mut self, bus: &mut dyn Bus, address: u16) {
        let wait = bus.memory_wait(address, self.tacts);
        self.clock(wait);
    }

    /// M1 cycle: opcode read, refresh, 4 tacts.
    fn fetch_opcode(&mut self, bus: &mut dyn Bus) -> u8 {
        let pc = self.regs.pc;
        self.memory_wait(bus, pc);
        let op = bus.read(pc);
        self.clock(4);
        self.regs.pc = pc.wrapping_add(1);
        self.regs.increment_r();
        if let Some(tracker) = &mut self.tracker {
            tracker.execution.touch(pc);
        }
        op
    }

    /// Operand byte at PC.
    fn read_operand(&mut self, bus: &mut dyn Bus) -> u8 {
        let pc = self.regs.pc;
        self.memory_wait(bus, pc);
        let value = bus.read(pc);
        self.clock(3);
        self.regs.pc = pc.wrapping_add(1);
        if let Some(tracker) = &mut self.tracker {
            tracker.execution.touch(pc);
        }
        value
    }

    fn read_operand_word(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.read_operand(bus);
        let hi = self.read_operand(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn read_memory(&mut self, bus: &mut dyn Bus, address: u16) -> u8 {
        self.memory_wait(bus, address);
        let value = bus.read(address);
        self.clock(3);
        if let Some(tracker) = &mut self.tracker {
            tracker.read.touch(address);
        }
        value
    }

    fn write_memory(&mut self, bus: &mut dyn Bus, address: u16, value: u8) {
        self.memory_wait(bus, address);
        bus.write(address, value);
        self.clock(3);
        if let Some(tracker) = &mut self.tracker {
            tracker.write.touch(address);
        }
    }

    fn read_word(&mut self, bus: &mut dyn Bus, address: u16) -> u16 {
        let lo = self.read_memory(bus, address);
        let hi = self.read_memory(bus, address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn write_word(&mut self, bus: &mut dyn Bus, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write_memory(bus, address, lo);
        self.write_memory(bus, address.wrapping_add(1), hi);
    }

    fn read_port(&mut self, bus: &mut dyn Bus, port: u16) -> u8 {
        let wait = bus.port_wait(port, self.tacts);
        self.clock(wait);
        let value = bus.read_port(port);
        self.clock(4);
        value
    }

    fn write_port(&mut self, bus: &mut dyn Bus, port: u16, value: u8) {
        let wait = bus.port_wait(port, self.tacts);
        self.clock(wait);
        bus.write_port(port, value);
        self.clock(4);
    }

    /// Push high byte first, 6 tacts.
    fn push_word(&mut self, bus: &mut dyn Bus, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write_memory(bus, self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write_memory(bus, self.regs.sp, lo);
    }

    fn pop_word(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.read_memory(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.read_memory(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    // =========================================================================
    // Operand decoding
    // =========================================================================

    fn set_flags(&mut self, f: u8) {
        self.regs.f = f;
        self.q = f;
    }

    /// HL, IX or IY according to the active prefix.
    fn index_reg(&self) -> u16 {
        match self.index {
            IndexMode::Hl => self.regs.hl(),
            IndexMode::Ix => self.regs.ix,
            IndexMode::Iy => self.regs.iy,
        }
    }

    fn set_index_reg(&mut self, value: u16) {
        match self.index {
            IndexMode::Hl => self.regs.set_hl(value),
            IndexMode::Ix => self.regs.ix = value,
            IndexMode::Iy => self.regs.iy = value,
        }
    }

    fn index_name(&self) -> &'static str {
        match self.index {
            IndexMode::Hl => "hl",
            IndexMode::Ix => "ix",
            IndexMode::Iy => "iy",
        }
    }

    /// Register operand `r` (0-5, 7). Under DD/FD, H and L mean the halves of
    /// IX or IY.
    fn reg8(&self, r: u8) -> u8 {
        match (r, self.index) {
            (4, IndexMode::Ix) => self.regs.ixh(),
            (5, IndexMode::Ix) => self.regs.ixl(),
            (4, IndexMode::Iy) => self.regs.iyh(),
            (5, IndexMode::Iy) => self.regs.iyl(),
            _ => self.plain_reg8(r),
        }
    }

    fn set_reg8(&mut self, r: u8, value: u8) {
        match (r, self.index) {
            (4, IndexMode::Ix) => self.regs.set_ixh(value),
            (5, IndexMode::Ix) => self.regs.set_ixl(value),
            (4, IndexMode::Iy) => self.regs.set_iyh(value),
            (5, IndexMode::Iy) => self.regs.set_iyl(value),
            _ => self.set_plain_reg8(r, value),
        }
    }

    /// Register operand `r` ignoring any index prefix.
    fn plain_reg8(&self, r: u8) -> u8 {
        match r {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            7 => self.regs.a,
            _ => unreachable!("(HL) slot decoded as a register"),
        }
    }

    fn set_plain_reg8(&mut self, r: u8, value: u8) {
        match r {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            7 => self.regs.a = value,
            _ => unreachable!("(HL) slot decoded as a register"),
        }
    }

    /// Register pair `rp` (BC, DE, HL/IX/IY, SP).
    fn reg16(&self, rp: u8) -> u16 {
        match rp {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.index_reg(),
            _ => self.regs.sp,
        }
    }

    fn set_reg16(&mut self, rp: u8, value: u16) {
        match rp {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.set_index_reg(value),
            _ => self.regs.sp = value,
        }
    }

    fn reg8_name(&self, r: u8) -> &'static str {
        match (r, self.index) {
            (4, IndexMode::Ix) => "ixh",
            (5, IndexMode::Ix) => "ixl",
            (4, IndexMode::Iy) => "iyh",
            (5, IndexMode::Iy) => "iyl",
            _ => ["b", "c", "d", "e", "h", "l", "(hl)", "a"][usize::from(r & 7)],
        }
    }

    fn reg16_name(&self, rp: u8) -> &'static str {
        match rp {
            0 => "bc",
            1 => "de",
            2 => self.index_name(),
            _ => "sp",
        }
    }

    /// Address of the `(HL)` operand, or `(IX+d)`/`(IY+d)` under a prefix.
    ///
    /// The indexed form reads the displacement and then spends `internal`
    /// tacts computing the address (5 normally, 2 for `LD (IX+d),n` which
    /// overlaps it with the immediate fetch).
    fn memory_operand(&mut self, bus: &mut dyn Bus, internal: u32) -> u16 {
        if self.index == IndexMode::Hl {
            return self.regs.hl();
        }
        let d = self.read_operand(bus) as i8;
        self.clock(internal);
        let address = self.index_reg().wrapping_add_signed(i16::from(d));
        self.regs.wz = address;
        address
    }

    /// Condition `cc` (NZ, Z, NC, C, PO, PE, P, M) against F.
    fn condition(&self, cc: u8) -> bool {
        let f = self.regs.f;
        match cc & 7 {
            0 => f & ZF == 0,
            1 => f & ZF != 0,
            2 => f & CF == 0,
            3 => f & CF != 0,
            4 => f & PF == 0,
            5 => f & PF != 0,
            6 => f & SF == 0,
            _ => f & SF != 0,
        }
    }

    // =========================================================================
    // Debug events
    // =========================================================================

    fn record_branch(&mut self, mnemonic: impl FnOnce() -> String, target: u16, taken: bool) {
        if let Some(observer) = self.branch_observer.as_mut() {
            let event = BranchEvent {
                address: self.op_address,
                mnemonic: mnemonic(),
                target,
                taken,
                tacts: self.tacts,
            };
            observer.on_branch(&event);
        }
    }

    fn record_sp(&mut self, mnemonic: impl FnOnce() -> String, old_sp: u16) {
        if let Some(observer) = self.stack_observer.as_mut() {
            let event = StackPointerEvent {
                address: self.op_address,
                mnemonic: mnemonic(),
                old_sp,
                new_sp: self.regs.sp,
                tacts: self.tacts,
            };
            observer.on_stack_pointer(&event);
        }
    }

    fn record_stack(
        &mut self,
        mnemonic: impl FnOnce() -> String,
        access: StackAccess,
        sp: u16,
        content: u16,
    ) {
        if let Some(observer) = self.stack_observer.as_mut() {
            let event = StackContentEvent {
                address: self.op_address,
                mnemonic: mnemonic(),
                access,
                sp,
                content,
                tacts: self.tacts,
            };
            observer.on_stack_content(&event);
        }
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Z80 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Z80")
            .field("regs", &self.regs)
            .field("tacts", &self.tacts)
            .field("int_line", &self.int_line)
            .field("nmi_pending", &self.nmi_pending)
            .finish_non_exhaustive()
    }
}

impl Cpu for Z80 {
    type Registers = Registers;

    fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        self.execute_one(bus)
    }

    fn pc(&self) -> u32 {
        u32::from(self.regs.pc)
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.regs.halted
    }

    fn interrupt(&mut self, data: u8) {
        self.request_interrupt(data);
    }

    fn nmi(&mut self) {
        self.request_nmi();
    }

    fn reset(&mut self) {
        Z80::reset(self);
    }
}

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        let flag = |bit: u8| Value::Bool(r.f & bit != 0);
        Some(match path {
            "a" => r.a.into(),
            "f" => r.f.into(),
            "b" => r.b.into(),
            "c" => r.c.into(),
            "d" => r.d.into(),
            "e" => r.e.into(),
            "h" => r.h.into(),
            "l" => r.l.into(),
            "af" => r.af().into(),
            "bc" => r.bc().into(),
            "de" => r.de().into(),
            "hl" => r.hl().into(),
            "af'" => r.af_alt().into(),
            "bc'" => r.bc_alt().into(),
            "de'" => r.de_alt().into(),
            "hl'" => r.hl_alt().into(),
            "ix" => r.ix.into(),
            "iy" => r.iy.into(),
            "ixh" => r.ixh().into(),
            "ixl" => r.ixl().into(),
            "iyh" => r.iyh().into(),
            "iyl" => r.iyl().into(),
            "sp" => r.sp.into(),
            "pc" => r.pc.into(),
            "i" => r.i.into(),
            "r" => r.r.into(),
            "wz" => r.wz.into(),
            "flags.s" => flag(SF),
            "flags.z" => flag(ZF),
            "flags.y" => flag(YF),
            "flags.h" => flag(HF),
            "flags.x" => flag(XF),
            "flags.pv" => flag(PF),
            "flags.n" => flag(NF),
            "flags.c" => flag(CF),
            "iff1" => r.iff1.into(),
            "iff2" => r.iff2.into(),
            "im" => r.im.into(),
            "halted" => r.halted.into(),
            "tacts" => self.tacts.into(),
            _ => return None,
        })
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "a", "f", "b", "c", "d", "e", "h", "l", "af", "bc", "de", "hl", "af'", "bc'", "de'",
            "hl'", "ix", "iy", "ixh", "ixl", "iyh", "iyl", "sp", "pc", "i", "r", "wz", "flags.s",
            "flags.z", "flags.y", "flags.h", "flags.x", "flags.pv", "flags.n", "flags.c", "iff1",
            "iff2", "im", "halted", "tacts",
        ]
    }
}
