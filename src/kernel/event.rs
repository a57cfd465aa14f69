use crate::error::CoreError;
use crate::kernel::recorder::CaptureSession;
use crate::kernel::state::{Alignment, Provenance};
use crate::services::tts::Voice;

/// Everything that enters the kernel: user commands and async completions.
/// The reactor never awaits; the driver executes side effects and feeds the
/// results back through these.
#[derive(Debug)]
pub enum Event {
    Command(Command),
    Completion(Completion),
}

/// User-triggered operations, the analog of the editing controls.
#[derive(Debug)]
pub enum Command {
    /// Synthesize speech for the current text. Held as a preview until saved.
    Generate { voice: Voice },
    /// Persist the pending preview.
    SavePreview,
    /// Drop the pending preview without touching the persisted document.
    DiscardPreview,
    /// Persist an MP3 chosen by the user.
    Upload(UploadFile),
    StartRecording,
    StopRecording,
    /// Request timestamps for the saved audio against the current text.
    Align,
    EditText(String),
    EditSegment { index: usize, start: f64, end: f64 },
    ClearAudio,
}

/// A file handed over for upload. Validated before any effect is emitted.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Version of the (audio, text) pair an alignment call was issued against.
/// Results are applied only if the pair is still the same at completion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignEpoch {
    pub media_version: u64,
}

/// Synthesized audio as returned by the TTS collaborator.
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub audio_base64: String,
    pub mime_type: String,
}

/// Results of side effects, delivered asynchronously by the driver. They may
/// arrive long after the state that triggered them has moved on; the reactor
/// decides per-completion whether they still apply.
#[derive(Debug)]
pub enum Completion {
    Generated {
        result: Result<GeneratedAudio, CoreError>,
    },
    Persisted {
        provenance: Provenance,
        mime_type: String,
        result: Result<String, CoreError>,
    },
    /// Microphone acquired; capture is live at this rate. The session tag
    /// identifies which acquisition this stream belongs to.
    CaptureReady {
        session: CaptureSession,
        sample_rate: u32,
    },
    /// A batch of samples from a capture stream.
    CaptureChunk {
        session: CaptureSession,
        samples: Vec<f32>,
    },
    /// Device denied or the stream died.
    CaptureFailed {
        session: CaptureSession,
        message: String,
    },
    Aligned {
        epoch: AlignEpoch,
        result: Result<Alignment, CoreError>,
    },
}
