use serde::{Deserialize, Serialize};

/// How the current audio asset was produced. Decides which editing affordances
/// the surrounding form shows and whether alignment auto-triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Generated,
    Uploaded,
    Recorded,
}

/// A persisted audio reference plus its provenance tag.
///
/// Invariant: `provenance` is `None` iff `url` is empty. The only way to set
/// one is to set both (`StateDelta::AudioCommitted` / `AudioCleared`), so a
/// torn (url, provenance) pair cannot be observed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioAsset {
    pub url: String,
    pub provenance: Option<Provenance>,
    pub mime_type: String,
}

impl AudioAsset {
    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }
}

/// One text line paired with its (start, end) window in the audio, seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub line: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordStamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// Result of a forced-alignment pass. Tied to a specific (audio, text) pair;
/// meaningless against anything else, which is why every change to either
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub segments: Vec<Segment>,
    pub raw_words: Vec<WordStamp>,
}

impl Alignment {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Synthesized audio held between "generate" and "save". Discarded on save,
/// discard, or teardown; never touches the persisted document by itself.
#[derive(Debug, Clone)]
pub struct PendingPreview {
    pub audio_base64: String,
    pub mime_type: String,
}

/// Strict state delta. This is the ONLY way the document mutates.
#[derive(Debug, Clone)]
pub enum StateDelta {
    TextEdited(String),
    PreviewReady(PendingPreview),
    PreviewDiscarded,
    /// The atomic combined update: url and provenance land in one reduction,
    /// never as two sequential writes an observer could interleave.
    AudioCommitted {
        url: String,
        provenance: Provenance,
        mime_type: String,
    },
    AudioCleared,
    AlignmentApplied(Alignment),
    /// Hand-edit of a single segment's window. Does not re-run alignment.
    SegmentEdited {
        index: usize,
        start: f64,
        end: f64,
    },
}

/// The audio document the reactor keeps in lockstep: free text, one audio
/// asset, and the alignment between them. Owned here exclusively; the driver
/// only ever observes it through the reactor.
#[derive(Debug, Default)]
pub struct ItemState {
    text: String,
    audio: AudioAsset,
    alignment: Alignment,
    preview: Option<PendingPreview>,
    /// Monotonic counter bumped whenever audio or text changes. In-flight
    /// alignment calls carry the value current at request time; a mismatch at
    /// completion means the result belongs to a pair that no longer exists.
    pub media_version: u64,
}

impl ItemState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn audio(&self) -> &AudioAsset {
        &self.audio
    }

    pub fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    pub fn preview(&self) -> Option<&PendingPreview> {
        self.preview.as_ref()
    }

    /// Pure reduction: State + Delta -> Mutated State.
    pub fn reduce(&mut self, delta: StateDelta) {
        match delta {
            StateDelta::TextEdited(text) => {
                if text == self.text {
                    return;
                }
                self.text = text;
                self.media_version += 1;
                // Timestamps were measured against the old text.
                self.alignment = Alignment::default();
            }
            StateDelta::PreviewReady(preview) => {
                self.preview = Some(preview);
            }
            StateDelta::PreviewDiscarded => {
                self.preview = None;
            }
            StateDelta::AudioCommitted {
                url,
                provenance,
                mime_type,
            } => {
                self.audio = AudioAsset {
                    url,
                    provenance: Some(provenance),
                    mime_type,
                };
                self.preview = None;
                self.media_version += 1;
                self.alignment = Alignment::default();
            }
            StateDelta::AudioCleared => {
                self.audio = AudioAsset::default();
                self.preview = None;
                self.media_version += 1;
                self.alignment = Alignment::default();
            }
            StateDelta::AlignmentApplied(alignment) => {
                // Full replacement, never a merge.
                self.alignment = alignment;
            }
            StateDelta::SegmentEdited { index, start, end } => {
                if let Some(segment) = self.alignment.segments.get_mut(index) {
                    segment.start = start;
                    segment.end = end;
                }
            }
        }
    }
}
