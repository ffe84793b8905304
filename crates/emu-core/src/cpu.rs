//! CPU core trait.

use crate::Bus;

/// A CPU core driven one instruction at a time.
///
/// The bus is passed in, not owned, so the host can share it with other
/// components between calls. A call never suspends mid-instruction.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Execute one instruction (or accept one pending interrupt) and return
    /// the T-states it consumed.
    fn step<B: Bus>(&mut self, bus: &mut B) -> u32;

    /// Returns the current program counter.
    ///
    /// Returns `u32` so hosts can treat 16-bit and wider cores alike.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;

    /// Assert the maskable interrupt line with `data` on the data bus.
    fn interrupt(&mut self, data: u8);

    /// Request a non-maskable interrupt.
    fn nmi(&mut self);

    /// Reset the CPU to its initial state.
    fn reset(&mut self);
}
