//! Mapping of forced-alignment responses onto the editor's text lines.
//!
//! The transcription collaborator returns per-line (start, end) windows plus
//! optional raw per-word stamps. The line text it echoes back may have been
//! normalized on the server side, so when the counts agree we keep the
//! editor's own lines and take only the timing from the response.

use crate::kernel::state::{Alignment, Segment, WordStamp};
use crate::services::transcribe::AlignmentResponse;

/// Each non-blank line of the text block becomes one expected segment.
pub fn expected_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the document alignment from a collaborator response.
///
/// When the response carries one segment per expected line, the editor's line
/// text wins and the response contributes timing only. On a count mismatch the
/// response segments are taken verbatim; the user sees what the server aligned
/// and can re-run after fixing the text.
pub fn apply(lines: &[String], response: AlignmentResponse) -> Alignment {
    let segments = if response.segments.len() == lines.len() {
        lines
            .iter()
            .zip(response.segments)
            .map(|(line, seg)| Segment {
                line: line.clone(),
                start: seg.start,
                end: seg.end,
            })
            .collect()
    } else {
        response
            .segments
            .into_iter()
            .map(|seg| Segment {
                line: seg.line,
                start: seg.start,
                end: seg.end,
            })
            .collect()
    };

    let raw_words = response
        .raw_words
        .unwrap_or_default()
        .into_iter()
        .map(|w| WordStamp {
            word: w.word,
            start: w.start,
            end: w.end,
        })
        .collect();

    Alignment { segments, raw_words }
}
