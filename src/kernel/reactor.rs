use tokio::sync::mpsc;
use tracing::{debug, info};

use super::event::{AlignEpoch, Command, Completion, Event};
use super::recorder::{CaptureSession, RecorderMachine, RecorderPhase, RecorderSignal};
use super::state::{ItemState, Provenance, StateDelta};
use super::time::Tick;
use crate::audio::encode;
use crate::provider;
use crate::services::tts::Voice;

/// Delay between a recording's auto-upload completing and the automatic
/// alignment call, so the storage backend has settled before transcription
/// fetches the blob.
pub const AUTO_ALIGN_SETTLE_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient user-facing message, the toast analog. Every terminal failure
/// produces one; nothing is silently swallowed except the documented
/// stale-alignment discard.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Instructions for the driver. The reactor never performs I/O itself; it
/// emits these and the driver reports back through `Completion` events.
#[derive(Debug, Clone)]
pub enum SideEffect {
    Notify(Notice),
    CallGenerate {
        text: String,
        voice: Voice,
    },
    /// Persist a base64 payload through the save endpoint.
    PersistBase64 {
        audio_base64: String,
        mime_type: String,
        folder: String,
        filename: String,
        provenance: Provenance,
    },
    /// Persist a raw blob through the multipart upload endpoint.
    PersistBlob {
        bytes: Vec<u8>,
        mime_type: String,
        folder: String,
        filename: String,
        provenance: Provenance,
    },
    AcquireMic {
        session: CaptureSession,
    },
    ReleaseMic {
        session: CaptureSession,
    },
    CallAlign {
        epoch: AlignEpoch,
        audio_url: String,
        text: String,
        settle_ms: u64,
    },
}

/// One outstanding network operation at a time. The analog of the UI disabling
/// its controls while a call is in flight; double-submission of a persist is
/// impossible by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Busy {
    Generating,
    Persisting,
    Aligning,
}

#[derive(Debug, Clone)]
pub struct ReactorConfig {
    /// Storage folder for everything this item persists.
    pub folder: String,
    /// Logical base name for recorder output files.
    pub recording_base: String,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            folder: "pronunciation/audio/new".to_string(),
            recording_base: "recording".to_string(),
        }
    }
}

pub struct Reactor {
    pub receiver: mpsc::Receiver<Event>,
    pub state: ItemState,
    pub recorder: RecorderMachine,
    pub tick: Tick,
    busy: Option<Busy>,
    config: ReactorConfig,
}

impl Reactor {
    pub fn new(receiver: mpsc::Receiver<Event>, config: ReactorConfig) -> Self {
        Self {
            receiver,
            state: ItemState::new(),
            recorder: RecorderMachine::new(),
            tick: Tick::new(),
            busy: None,
            config,
        }
    }

    /// Pure step: advances logical time, folds events into state, returns the
    /// side effects for the driver. MUST NOT await I/O or timers.
    pub fn tick_step(&mut self, events: Vec<Event>) -> Vec<SideEffect> {
        self.tick = self.tick.next();
        let mut effects = Vec::new();

        if let Some(RecorderSignal::CeilingReached) = self.recorder.on_tick() {
            effects.push(SideEffect::Notify(Notice::info(
                "recording stopped at the 10 minute limit",
            )));
            self.stop_recording(&mut effects);
        }

        for event in events {
            match event {
                Event::Command(command) => self.handle_command(command, &mut effects),
                Event::Completion(completion) => self.handle_completion(completion, &mut effects),
            }
        }

        effects
    }

    fn handle_command(&mut self, command: Command, effects: &mut Vec<SideEffect>) {
        match command {
            Command::Generate { voice } => {
                if self.refuse_if_busy("generate") || self.refuse_if_recording("generate") {
                    return;
                }
                let text = self.state.text().trim();
                if text.is_empty() {
                    effects.push(SideEffect::Notify(Notice::error(
                        "enter text to generate audio",
                    )));
                    return;
                }
                self.busy = Some(Busy::Generating);
                effects.push(SideEffect::CallGenerate {
                    text: text.to_string(),
                    voice,
                });
            }

            Command::SavePreview => {
                if self.refuse_if_busy("save") || self.refuse_if_recording("save") {
                    return;
                }
                let Some(preview) = self.state.preview() else {
                    effects.push(SideEffect::Notify(Notice::error(
                        "no audio to save, generate audio first",
                    )));
                    return;
                };
                self.busy = Some(Busy::Persisting);
                effects.push(SideEffect::PersistBase64 {
                    audio_base64: preview.audio_base64.clone(),
                    mime_type: preview.mime_type.clone(),
                    folder: self.config.folder.clone(),
                    filename: provider::unique_filename(self.state.text(), "mp3"),
                    provenance: Provenance::Generated,
                });
            }

            Command::DiscardPreview => {
                self.state.reduce(StateDelta::PreviewDiscarded);
            }

            Command::Upload(file) => {
                if self.refuse_if_busy("upload") || self.refuse_if_recording("upload") {
                    return;
                }
                if let Err(err) = provider::validate_upload(&file) {
                    effects.push(SideEffect::Notify(Notice::error(err.to_string())));
                    return;
                }
                self.busy = Some(Busy::Persisting);
                let filename = provider::unique_filename(&provider::upload_base(&file), "mp3");
                effects.push(SideEffect::PersistBlob {
                    bytes: file.bytes,
                    mime_type: file.mime_type,
                    folder: self.config.folder.clone(),
                    filename,
                    provenance: Provenance::Uploaded,
                });
            }

            Command::StartRecording => {
                if self.refuse_if_busy("record") {
                    return;
                }
                if !self.recorder.arm() {
                    debug!("recording already active, ignoring start");
                    return;
                }
                effects.push(SideEffect::AcquireMic {
                    session: self.recorder.session(),
                });
            }

            Command::StopRecording => match self.recorder.phase() {
                RecorderPhase::Recording => self.stop_recording(effects),
                RecorderPhase::Armed => {
                    // Stopped before the device came up. The late CaptureReady
                    // (if any) finds the session gone and triggers the release.
                    self.recorder.reset();
                }
                _ => debug!("no active recording to stop"),
            },

            Command::Align => {
                if self.refuse_if_busy("align") || self.refuse_if_recording("align") {
                    return;
                }
                if self.state.audio().is_empty() {
                    effects.push(SideEffect::Notify(Notice::error("save audio first")));
                    return;
                }
                if self.state.text().trim().is_empty() {
                    effects.push(SideEffect::Notify(Notice::error("enter text first")));
                    return;
                }
                self.busy = Some(Busy::Aligning);
                effects.push(SideEffect::CallAlign {
                    epoch: AlignEpoch {
                        media_version: self.state.media_version,
                    },
                    audio_url: self.state.audio().url.clone(),
                    text: self.state.text().to_string(),
                    settle_ms: 0,
                });
            }

            Command::EditText(text) => {
                self.state.reduce(StateDelta::TextEdited(text));
            }

            Command::EditSegment { index, start, end } => {
                self.state.reduce(StateDelta::SegmentEdited { index, start, end });
            }

            Command::ClearAudio => {
                self.state.reduce(StateDelta::AudioCleared);
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion, effects: &mut Vec<SideEffect>) {
        match completion {
            Completion::Generated { result } => {
                self.busy = None;
                match result.and_then(provider::preview_from_generated) {
                    Ok(preview) => {
                        self.state.reduce(StateDelta::PreviewReady(preview));
                        effects.push(SideEffect::Notify(Notice::success(
                            "audio generated, preview then save",
                        )));
                    }
                    Err(err) => {
                        effects.push(SideEffect::Notify(Notice::error(err.to_string())));
                    }
                }
            }

            Completion::Persisted {
                provenance,
                mime_type,
                result,
            } => {
                self.busy = None;
                if self.recorder.phase() == RecorderPhase::Uploading {
                    self.recorder.reset();
                }
                match result {
                    Ok(url) => {
                        self.state.reduce(StateDelta::AudioCommitted {
                            url: url.clone(),
                            provenance,
                            mime_type,
                        });
                        effects.push(SideEffect::Notify(Notice::success(match provenance {
                            Provenance::Generated => "audio saved",
                            Provenance::Uploaded => "audio uploaded",
                            Provenance::Recorded => "recording saved",
                        })));

                        // Recordings auto-align when text is present, using the
                        // freshly returned url rather than anything re-read
                        // later, so a slow flush elsewhere cannot stale it.
                        if provenance == Provenance::Recorded
                            && !self.state.text().trim().is_empty()
                        {
                            self.busy = Some(Busy::Aligning);
                            effects.push(SideEffect::CallAlign {
                                epoch: AlignEpoch {
                                    media_version: self.state.media_version,
                                },
                                audio_url: url,
                                text: self.state.text().to_string(),
                                settle_ms: AUTO_ALIGN_SETTLE_MS,
                            });
                        }
                    }
                    Err(err) => {
                        // A failed recording upload leaves no audio reference;
                        // the user re-records.
                        effects.push(SideEffect::Notify(Notice::error(err.to_string())));
                    }
                }
            }

            Completion::CaptureReady {
                session,
                sample_rate,
            } => {
                if session != self.recorder.session() || !self.recorder.on_ready(sample_rate) {
                    // The stream came up for a session that no longer exists.
                    // Release that stream specifically; the live session's
                    // stream (if any) is untouched.
                    debug!("capture ready for a dead session, releasing");
                    effects.push(SideEffect::ReleaseMic { session });
                }
            }

            Completion::CaptureChunk { session, samples } => {
                if session == self.recorder.session() {
                    self.recorder.push(&samples);
                }
            }

            Completion::CaptureFailed { session, message } => {
                if session != self.recorder.session() {
                    debug!("capture failure from a dead session: {}", message);
                    return;
                }
                match self.recorder.phase() {
                    RecorderPhase::Armed => {
                        self.recorder.reset();
                        effects.push(SideEffect::Notify(Notice::error(format!(
                            "microphone unavailable: {}",
                            message
                        ))));
                    }
                    RecorderPhase::Recording => {
                        effects.push(SideEffect::ReleaseMic { session });
                        self.recorder.reset();
                        effects.push(SideEffect::Notify(Notice::error(format!(
                            "recording failed: {}",
                            message
                        ))));
                    }
                    _ => debug!("capture failure outside a session: {}", message),
                }
            }

            Completion::Aligned { epoch, result } => {
                self.busy = None;
                if epoch.media_version != self.state.media_version {
                    // Intentional no-op: the result belongs to an (audio, text)
                    // pair that no longer exists.
                    info!(
                        "discarded stale alignment: epoch {} vs state {}",
                        epoch.media_version, self.state.media_version
                    );
                    return;
                }
                match result {
                    Ok(alignment) => {
                        let lines = alignment.segments.len();
                        self.state.reduce(StateDelta::AlignmentApplied(alignment));
                        effects.push(SideEffect::Notify(Notice::success(format!(
                            "got timestamps for {} lines",
                            lines
                        ))));
                    }
                    Err(err) => {
                        // Existing timestamps stay untouched on a failed
                        // regenerate.
                        effects.push(SideEffect::Notify(Notice::error(err.to_string())));
                    }
                }
            }
        }
    }

    /// Recording -> Uploading (or straight back to Idle for an empty capture).
    /// The mic release is unconditional on leaving `Recording`.
    fn stop_recording(&mut self, effects: &mut Vec<SideEffect>) {
        if self.recorder.phase() != RecorderPhase::Recording {
            return;
        }
        effects.push(SideEffect::ReleaseMic {
            session: self.recorder.session(),
        });
        let (samples, rate) = self.recorder.take_recording();
        match encode::wav_blob(&samples, rate) {
            Some(bytes) => {
                self.busy = Some(Busy::Persisting);
                effects.push(SideEffect::PersistBlob {
                    bytes,
                    mime_type: "audio/wav".to_string(),
                    folder: self.config.folder.clone(),
                    filename: provider::unique_filename(&self.config.recording_base, "wav"),
                    provenance: Provenance::Recorded,
                });
            }
            None => {
                // Stopped before any data arrived; silent no-op.
                self.recorder.reset();
            }
        }
    }

    fn refuse_if_busy(&self, what: &str) -> bool {
        if let Some(busy) = self.busy {
            debug!("{} refused, {:?} in flight", what, busy);
            return true;
        }
        false
    }

    /// A live recording session is exclusive: the other operations are refused
    /// until it ends, the same way the recording view replaces the editing
    /// controls. Combined with the busy gate this keeps `busy` untouched for
    /// the whole session, so `stop_recording`'s persist can never overwrite an
    /// operation already in flight.
    fn refuse_if_recording(&self, what: &str) -> bool {
        if self.recorder.phase() != RecorderPhase::Idle {
            debug!("{} refused, recording session active", what);
            return true;
        }
        false
    }
}
