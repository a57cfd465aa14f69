#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick {
    pub frame: u64,
}

/// Cadence of the driver loop. The recorder's elapsed time is derived from
/// ticks, so wall-clock jitter in the driver never desyncs the ceiling check.
pub const TICK_MS: u64 = 250;

impl Tick {
    pub fn new() -> Self {
        Tick { frame: 0 }
    }

    pub fn next(&self) -> Self {
        Tick {
            frame: self.frame + 1,
        }
    }
}

impl Default for Tick {
    fn default() -> Self {
        Self::new()
    }
}
