//! Memory and I/O bus interface.

/// Memory and I/O port interface seen by a CPU.
///
/// The host owns everything behind this trait: address decoding, banking,
/// peripherals and the contention model. The CPU calls it synchronously from
/// inside instruction execution and never retains a reference.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a byte from an I/O port. The full 16-bit port address is supplied.
    fn read_port(&mut self, port: u16) -> u8;

    /// Write a byte to an I/O port.
    fn write_port(&mut self, port: u16, value: u8);

    /// Extra T-states to insert before a memory access at `tact`.
    ///
    /// Called immediately before every memory read, write and opcode fetch.
    fn memory_wait(&mut self, _address: u16, _tact: u64) -> u32 {
        0
    }

    /// Extra T-states to insert before a port access at `tact`.
    fn port_wait(&mut self, _port: u16, _tact: u64) -> u32 {
        0
    }
}

/// A flat 64 KiB RAM bus with a port log.
///
/// Port reads return the value programmed with [`SimpleBus::set_port`]
/// (default `0xFF`, a floating bus). Every port write is appended to
/// [`SimpleBus::port_writes`].
pub struct SimpleBus {
    /// Memory contents.
    pub memory: Box<[u8; 0x10000]>,
    /// Every `(port, value)` written, in order.
    pub port_writes: Vec<(u16, u8)>,
    port_inputs: Box<[u8; 0x10000]>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            port_writes: Vec::new(),
            port_inputs: Box::new([0xFF; 0x10000]),
        }
    }

    /// Copy `data` into memory starting at `address`, wrapping at 64 KiB.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        for (offset, &byte) in data.iter().enumerate() {
            self.memory[usize::from(address.wrapping_add(offset as u16))] = byte;
        }
    }

    /// Set the value returned by reads of `port`.
    pub fn set_port(&mut self, port: u16, value: u8) {
        self.port_inputs[usize::from(port)] = value;
    }

    /// Read a little-endian word without going through the CPU.
    #[must_use]
    pub fn peek_word(&self, address: u16) -> u16 {
        let lo = self.memory[usize::from(address)];
        let hi = self.memory[usize::from(address.wrapping_add(1))];
        u16::from_le_bytes([lo, hi])
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }

    fn read_port(&mut self, port: u16) -> u8 {
        self.port_inputs[usize::from(port)]
    }

    fn write_port(&mut self, port: u16, value: u8) {
        self.port_writes.push((port, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_wraps_at_top_of_memory() {
        let mut bus = SimpleBus::new();
        bus.load(0xFFFF, &[0x11, 0x22]);
        assert_eq!(bus.read(0xFFFF), 0x11);
        assert_eq!(bus.read(0x0000), 0x22);
        assert_eq!(bus.peek_word(0xFFFF), 0x2211);
    }

    #[test]
    fn ports_float_high_and_log_writes() {
        let mut bus = SimpleBus::new();
        assert_eq!(bus.read_port(0x00FE), 0xFF);
        bus.set_port(0x00FE, 0x1F);
        assert_eq!(bus.read_port(0x00FE), 0x1F);
        bus.write_port(0x12FE, 7);
        assert_eq!(bus.port_writes, vec![(0x12FE, 7)]);
        assert_eq!(bus.memory_wait(0x4000, 0), 0);
    }
}
