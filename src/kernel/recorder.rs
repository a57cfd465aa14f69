use super::time::TICK_MS;

/// Hard ceiling on a single recording. Reaching it is identical in effect to
/// a manual stop, plus a user-visible notice.
pub const MAX_RECORDING_MS: u64 = 10 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderPhase {
    Idle,
    /// Microphone requested, waiting for the device.
    Armed,
    Recording,
    /// Capture stopped, blob handed to the persistence gate.
    Uploading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderSignal {
    CeilingReached,
}

/// Identity of one microphone session, minted at `arm()`. Mic effects and
/// capture completions carry it, so a late callback from an abandoned session
/// can never be mistaken for the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSession(pub u64);

/// Microphone lifecycle state machine. At most one session is active per
/// reactor; the reactor refuses `StartRecording` unless this is `Idle`, which
/// prevents concurrent sessions by construction rather than by locking.
///
/// The machine itself is pure: it accumulates chunks and counts ticks. The
/// actual hardware stream lives in the driver and is released 1:1 with the
/// reactor's acquire effects, on every exit path.
#[derive(Debug, Default)]
pub struct RecorderMachine {
    phase: RecorderPhase,
    samples: Vec<f32>,
    sample_rate: u32,
    elapsed_ms: u64,
    session: u64,
}

impl Default for RecorderPhase {
    fn default() -> Self {
        RecorderPhase::Idle
    }
}

impl RecorderMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RecorderPhase {
        self.phase
    }

    /// Elapsed recording time for display, whole seconds.
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_ms / 1000
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Identity of the current (or most recent) session. Never reused.
    pub fn session(&self) -> CaptureSession {
        CaptureSession(self.session)
    }

    /// Idle -> Armed. Returns false if a session is already active.
    pub fn arm(&mut self) -> bool {
        if self.phase != RecorderPhase::Idle {
            return false;
        }
        self.session += 1;
        self.phase = RecorderPhase::Armed;
        self.samples.clear();
        self.sample_rate = 0;
        self.elapsed_ms = 0;
        true
    }

    /// Armed -> Recording, once the device is live.
    pub fn on_ready(&mut self, sample_rate: u32) -> bool {
        if self.phase != RecorderPhase::Armed {
            return false;
        }
        self.phase = RecorderPhase::Recording;
        self.sample_rate = sample_rate;
        true
    }

    /// Accumulate a capture chunk. Ignored outside `Recording`, so a late
    /// chunk from an already-stopped stream cannot leak into the next session.
    pub fn push(&mut self, chunk: &[f32]) {
        if self.phase == RecorderPhase::Recording {
            self.samples.extend_from_slice(chunk);
        }
    }

    /// Advance logical time. Fires the ceiling signal once elapsed time hits
    /// the cap; elapsed never exceeds the cap by more than one tick because
    /// the reactor stops the session in the same step.
    pub fn on_tick(&mut self) -> Option<RecorderSignal> {
        if self.phase != RecorderPhase::Recording {
            return None;
        }
        self.elapsed_ms += TICK_MS;
        if self.elapsed_ms >= MAX_RECORDING_MS {
            return Some(RecorderSignal::CeilingReached);
        }
        None
    }

    /// Recording -> Uploading hand-off: yields the accumulated samples and
    /// their rate. The caller decides whether the blob is worth persisting.
    pub fn take_recording(&mut self) -> (Vec<f32>, u32) {
        let samples = std::mem::take(&mut self.samples);
        let rate = self.sample_rate;
        self.phase = RecorderPhase::Uploading;
        (samples, rate)
    }

    /// Terminal transition back to Idle, from any phase. Used after upload
    /// completion (success or failure), empty-capture stops, and device errors.
    pub fn reset(&mut self) {
        self.phase = RecorderPhase::Idle;
        self.samples.clear();
        self.sample_rate = 0;
        self.elapsed_ms = 0;
    }
}
