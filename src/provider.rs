//! Normalization of the three capture paths — synthesized, uploaded, recorded —
//! into validated pending audio, plus collision-resistant naming for storage.

use base64::Engine;

use crate::error::CoreError;
use crate::kernel::event::{GeneratedAudio, UploadFile};
use crate::kernel::state::PendingPreview;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_UPLOAD_MIME: [&str; 2] = ["audio/mpeg", "audio/mp3"];

/// Pre-flight checks for a user-chosen file. A violation means the file is
/// never sent anywhere.
pub fn validate_upload(file: &UploadFile) -> Result<(), CoreError> {
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(
            "audio file must be less than 10MB".to_string(),
        ));
    }
    let mime = file.mime_type.to_ascii_lowercase();
    if !ALLOWED_UPLOAD_MIME.contains(&mime.as_str()) {
        return Err(CoreError::Validation(
            "only MP3 files are allowed".to_string(),
        ));
    }
    Ok(())
}

/// Turn a TTS response into a pending preview. An empty or undecodable payload
/// is rejected here so the persist path can never see empty bytes.
pub fn preview_from_generated(generated: GeneratedAudio) -> Result<PendingPreview, CoreError> {
    if generated.audio_base64.trim().is_empty() {
        return Err(CoreError::InvalidInput(
            "synthesis returned no audio".to_string(),
        ));
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(generated.audio_base64.trim())
        .map_err(|_| CoreError::InvalidInput("synthesis returned invalid audio".to_string()))?;
    if decoded.is_empty() {
        return Err(CoreError::InvalidInput(
            "synthesis returned no audio".to_string(),
        ));
    }
    Ok(PendingPreview {
        audio_base64: generated.audio_base64.trim().to_string(),
        mime_type: generated.mime_type,
    })
}

/// Collision-resistant storage filename: sanitized base plus a uniqueness
/// suffix from current time and a short random token. Repeated saves under the
/// same logical name never overwrite each other.
pub fn unique_filename(base: &str, ext: &str) -> String {
    let mut slug: String = base
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    slug.truncate(40);
    if slug.trim_matches('_').is_empty() {
        slug = "audio".to_string();
    }

    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let token = uuid::Uuid::new_v4().simple().to_string();

    format!("{}-{}-{}.{}", slug, millis, &token[..8], ext)
}

/// Base name for an uploaded file: its stem, before the uniqueness suffix.
pub fn upload_base(file: &UploadFile) -> String {
    let stem = file
        .name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&file.name);
    if stem.trim().is_empty() {
        "upload".to_string()
    } else {
        stem.to_string()
    }
}
