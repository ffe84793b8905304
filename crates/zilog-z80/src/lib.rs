//! Zilog Z80 CPU interpreter for ZX Spectrum-class machines.
//!
//! Each call to [`Z80::execute_one`] runs one whole instruction against a
//! host-supplied [`emu_core::Bus`] and returns the T-states it took.
//!
//! ```
//! use emu_core::SimpleBus;
//! use zilog_z80::Z80;
//!
//! let mut bus = SimpleBus::new();
//! bus.load(0x8000, &[0x3E, 0x18, 0xD3, 0xFE, 0x76]); // LD A,18h; OUT (FEh),A; HALT
//! let mut cpu = Z80::new();
//! cpu.regs_mut().pc = 0x8000;
//! while !cpu.regs().halted {
//!     cpu.execute_one(&mut bus);
//! }
//! assert_eq!(cpu.regs().a, 0x18);
//! assert_eq!(bus.port_writes, vec![(0x18FE, 0x18)]);
//! ```

pub mod alu;
mod cpu;
mod debug;
mod error;
pub mod flags;
mod registers;
mod tracking;

pub use cpu::{IM1_VECTOR, InternalState, NMI_VECTOR, Z80, Z80Config};
pub use debug::{
    BranchEvent, BranchObserver, EventLog, StackAccess, StackContentEvent, StackObserver,
    StackPointerEvent,
};
pub use error::RegisterError;
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use registers::{Reg16, Reg8, RegisterSet, Registers};
pub use tracking::{AccessTracker, AddressMap};
