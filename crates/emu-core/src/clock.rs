//! Master clock configuration.

/// CPU clock of a machine, used to turn frame rates into tact budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterClock {
    /// CPU clock frequency in Hz.
    pub frequency_hz: u64,
}

impl MasterClock {
    /// The 48K Spectrum's 3.5 MHz CPU clock.
    pub const SPECTRUM_48K: Self = Self::new(3_500_000);

    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// T-states per frame at the given frame rate (integer division).
    #[must_use]
    pub const fn tacts_per_frame(&self, frames_per_second: u64) -> u64 {
        self.frequency_hz / frames_per_second
    }
}
