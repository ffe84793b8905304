//! Host-side contracts shared by CPU cores and the machines that drive them.
//!
//! A CPU sees the outside world only through [`Bus`]. The host sees the CPU
//! only through [`Cpu`] and [`Observable`].

mod bus;
mod clock;
mod cpu;
mod observable;

pub use bus::{Bus, SimpleBus};
pub use clock::MasterClock;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
