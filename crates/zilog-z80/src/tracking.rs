//! Per-address access bitmaps for debuggers and code-coverage views.

const WORDS: usize = 0x10000 / 64;

/// One bit per address of the 64 KiB space.
#[derive(Clone)]
pub struct AddressMap {
    bits: Box<[u64; WORDS]>,
}

impl AddressMap {
    #[must_use]
    pub fn new() -> Self {
        Self { bits: Box::new([0; WORDS]) }
    }

    pub fn touch(&mut self, address: u16) {
        let address = usize::from(address);
        self.bits[address / 64] |= 1u64 << (address % 64);
    }

    #[must_use]
    pub fn is_touched(&self, address: u16) -> bool {
        let address = usize::from(address);
        self.bits[address / 64] & (1u64 << (address % 64)) != 0
    }

    /// Number of distinct addresses touched.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn clear(&mut self) {
        self.bits.fill(0);
    }
}

impl Default for AddressMap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AddressMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressMap").field("touched", &self.count()).finish()
    }
}

/// Execution, read and write maps, filled while tracking is enabled.
///
/// Opcode and operand fetches mark `execution`; data reads mark `read`.
#[derive(Debug, Clone, Default)]
pub struct AccessTracker {
    pub execution: AddressMap,
    pub read: AddressMap,
    pub write: AddressMap,
}

impl AccessTracker {
    pub fn clear(&mut self) {
        self.execution.clear();
        self.read.clear();
        self.write.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_and_clear() {
        let mut map = AddressMap::new();
        map.touch(0x0000);
        map.touch(0xFFFF);
        map.touch(0xFFFF);
        assert!(map.is_touched(0xFFFF));
        assert!(!map.is_touched(0x8000));
        assert_eq!(map.count(), 2);
        map.clear();
        assert_eq!(map.count(), 0);
    }
}
