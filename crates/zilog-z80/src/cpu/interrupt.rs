//! Reset, NMI and maskable interrupt handling.

use emu_core::Bus;
use log::{debug, trace, warn};

use super::Z80;
use crate::debug::StackAccess;

/// Fixed NMI service address.
pub const NMI_VECTOR: u16 = 0x0066;

/// IM 1 service address (also `RST 38h`).
pub const IM1_VECTOR: u16 = 0x0038;

impl Z80 {
    /// Hardware reset.
    ///
    /// Clears IFF1/IFF2, selects IM 0, zeroes PC, I and R, leaves HALT and
    /// drops any latched interrupt request. The remaining registers keep
    /// their values, as on the real part. The tact counter restarts at 0.
    pub fn reset(&mut self) {
        debug!("reset at {:04X}", self.regs.pc);
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.regs.im = 0;
        self.regs.pc = 0;
        self.regs.i = 0;
        self.regs.r = 0;
        self.regs.wz = 0;
        self.regs.halted = false;
        self.int_line = None;
        self.nmi_pending = false;
        self.ei_delay = false;
        self.latched_index = None;
        self.after_ld_a_ir = false;
        self.q = 0;
        self.prev_q = 0;
        self.tacts = 0;
    }

    /// Assert INT with `data` on the data bus.
    ///
    /// The request stays latched until it is accepted or withdrawn with
    /// [`Z80::cancel_interrupt`]. It is accepted at the start of the next
    /// `execute_one` in which IFF1 is set and the previous instruction was
    /// not EI. In IM 0 `data` is executed as an RST opcode; in IM 2 it is the
    /// low byte of the vector table address.
    pub fn request_interrupt(&mut self, data: u8) {
        self.int_line = Some(data);
    }

    /// Release INT without it being serviced.
    pub fn cancel_interrupt(&mut self) {
        self.int_line = None;
    }

    #[must_use]
    pub fn interrupt_pending(&self) -> bool {
        self.int_line.is_some()
    }

    /// Latch an NMI edge. It is accepted at the start of the next
    /// `execute_one`, regardless of IFF1.
    pub fn request_nmi(&mut self) {
        self.nmi_pending = true;
    }

    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    fn leave_halt(&mut self) {
        if self.regs.halted {
            self.regs.halted = false;
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
    }

    /// Push PC for an interrupt response and report it to the stack
    /// observer. The event address is the return address.
    fn push_return_address(&mut self, bus: &mut dyn Bus, mnemonic: &'static str) {
        let pc = self.regs.pc;
        let sp = self.regs.sp;
        self.push_word(bus, pc);
        self.op_address = pc;
        self.record_stack(|| mnemonic.to_string(), StackAccess::Push, sp, pc);
    }

    /// NMI acknowledge: 5 tacts, then PC pushed. 11 in total.
    pub(super) fn accept_nmi(&mut self, bus: &mut dyn Bus) {
        trace!("NMI accepted at {:04X}", self.regs.pc);
        self.leave_halt();
        self.memory_wait(bus, self.regs.pc);
        self.clock(5);
        self.regs.increment_r();
        self.regs.iff2 = self.regs.iff1;
        self.regs.iff1 = false;
        self.push_return_address(bus, "nmi");
        self.regs.pc = NMI_VECTOR;
        self.regs.wz = NMI_VECTOR;
    }

    /// INT acknowledge: 7 tacts (M1 plus two wait states), then PC pushed.
    /// IM 0 and IM 1 take 13 tacts, IM 2 takes 19 with the vector read.
    pub(super) fn accept_interrupt(&mut self, bus: &mut dyn Bus, data: u8) {
        trace!("INT accepted at {:04X}, IM {}, data {data:02X}", self.regs.pc, self.regs.im);
        self.int_line = None;
        self.leave_halt();
        self.clock(7);
        self.regs.increment_r();
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.push_return_address(bus, "int");

        let target = match self.regs.im {
            2 => {
                let table = u16::from(self.regs.i) << 8 | u16::from(data);
                self.read_word(bus, table)
            }
            1 => IM1_VECTOR,
            _ => {
                if data & 0xC7 == 0xC7 {
                    u16::from(data & 0x38)
                } else {
                    warn!("IM 0 data bus byte {data:02X} is not an RST, using RST 38h");
                    IM1_VECTOR
                }
            }
        };
        self.regs.pc = target;
        self.regs.wz = target;
    }
}
