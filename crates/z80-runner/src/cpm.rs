//! Minimal CP/M environment for `.com` programs such as ZEXDOC/ZEXALL.
//!
//! Memory layout:
//! - 0x0000: warm boot, a HALT so the run ends when the program exits
//! - 0x0005: BDOS entry, a RET; calls are serviced before it executes
//! - 0x0006-0x0007: top of TPA, read by programs to set up their stack
//! - 0x0100: program load address

use emu_core::{Bus, SimpleBus};
use log::warn;
use zilog_z80::Z80;

pub const TPA_START: u16 = 0x0100;
const BDOS_ENTRY: u16 = 0x0005;
const TPA_TOP: u16 = 0xFE00;

/// Why a CP/M run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Jumped to 0x0000 or called BDOS function 0.
    WarmBoot,
    /// Hit the tact limit.
    TactLimit,
}

pub struct CpmMachine {
    pub cpu: Z80,
    pub bus: SimpleBus,
    /// Everything the program printed through BDOS.
    pub output: String,
}

impl CpmMachine {
    #[must_use]
    pub fn new(program: &[u8]) -> Self {
        let mut bus = SimpleBus::new();
        bus.load(TPA_START, program);
        bus.load(0x0000, &[0x76]);
        bus.load(BDOS_ENTRY, &[0xC9]);
        bus.load(0x0006, &TPA_TOP.to_le_bytes());

        let mut cpu = Z80::new();
        cpu.regs_mut().pc = TPA_START;
        cpu.regs_mut().sp = TPA_TOP;
        Self { cpu, bus, output: String::new() }
    }

    /// Run until the program exits or `max_tacts` elapse. `echo` receives
    /// console output as it is produced.
    pub fn run(&mut self, max_tacts: Option<u64>, mut echo: impl FnMut(&str)) -> Exit {
        loop {
            if max_tacts.is_some_and(|limit| self.cpu.tacts() >= limit) {
                return Exit::TactLimit;
            }
            let pc = self.cpu.regs().pc;
            if pc == 0x0000 || self.cpu.regs().halted {
                return Exit::WarmBoot;
            }
            if pc == BDOS_ENTRY {
                let text = self.bdos();
                match text {
                    Some(text) => {
                        echo(&text);
                        self.output.push_str(&text);
                    }
                    None => return Exit::WarmBoot,
                }
            }
            self.cpu.execute_one(&mut self.bus);
        }
    }

    /// Service the BDOS call in C. Returns the console text produced, or
    /// `None` for a system reset.
    fn bdos(&mut self) -> Option<String> {
        let regs = *self.cpu.regs();
        match regs.c {
            0 => None,
            2 => Some(char::from(regs.e).to_string()),
            9 => {
                let start = regs.de();
                let mut text = String::new();
                for offset in 0..=u16::MAX {
                    let ch = self.bus.read(start.wrapping_add(offset));
                    if ch == b'$' {
                        return Some(text);
                    }
                    text.push(char::from(ch));
                }
                warn!("BDOS 9 string at {start:04X} has no '$' terminator");
                Some(text)
            }
            function => {
                warn!("unsupported BDOS function {function}");
                Some(String::new())
            }
        }
    }
}
