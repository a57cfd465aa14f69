use lockstep::audio::encode::wav_blob;
use lockstep::kernel::event::{GeneratedAudio, UploadFile};
use lockstep::provider::{
    preview_from_generated, unique_filename, upload_base, validate_upload, MAX_UPLOAD_BYTES,
};

fn mp3_file(bytes: Vec<u8>) -> UploadFile {
    UploadFile {
        name: "clip.mp3".to_string(),
        mime_type: "audio/mpeg".to_string(),
        bytes,
    }
}

#[test]
fn filenames_are_sanitized_and_unique() {
    let a = unique_filename("Ship or Sheep?", "mp3");
    let b = unique_filename("Ship or Sheep?", "mp3");

    assert!(a.starts_with("ship_or_sheep_-"));
    assert!(a.ends_with(".mp3"));
    assert_ne!(a, b, "repeated saves never collide");
}

#[test]
fn long_bases_are_truncated() {
    let name = unique_filename(&"x".repeat(200), "wav");
    let slug = name.split('-').next().unwrap();
    assert_eq!(slug.len(), 40);
    assert!(name.ends_with(".wav"));
}

#[test]
fn blank_or_symbol_only_bases_fall_back() {
    let name = unique_filename("  !!! ", "mp3");
    assert!(name.starts_with("audio-"));
}

#[test]
fn upload_size_limit_is_enforced() {
    assert!(validate_upload(&mp3_file(vec![0; MAX_UPLOAD_BYTES])).is_ok());
    let err = validate_upload(&mp3_file(vec![0; MAX_UPLOAD_BYTES + 1])).unwrap_err();
    assert_eq!(err.to_string(), "audio file must be less than 10MB");
}

#[test]
fn upload_mime_must_be_mp3() {
    for mime in ["audio/mpeg", "audio/mp3", "AUDIO/MPEG"] {
        let file = UploadFile {
            mime_type: mime.to_string(),
            ..mp3_file(vec![1])
        };
        assert!(validate_upload(&file).is_ok(), "{} accepted", mime);
    }

    // Exact media types only: a type merely containing an allowed one as a
    // substring is still rejected.
    for mime in ["audio/wav", "xaudio/mp3y", "audio/mpeg3", "audio/mpeg; rate=44100"] {
        let file = UploadFile {
            mime_type: mime.to_string(),
            ..mp3_file(vec![1])
        };
        let err = validate_upload(&file).unwrap_err();
        assert_eq!(err.to_string(), "only MP3 files are allowed", "{}", mime);
    }
}

#[test]
fn upload_base_strips_the_extension() {
    assert_eq!(upload_base(&mp3_file(vec![])), "clip");

    let odd = UploadFile {
        name: ".mp3".to_string(),
        ..mp3_file(vec![])
    };
    assert_eq!(upload_base(&odd), "upload");
}

#[test]
fn generated_payload_must_decode_to_bytes() {
    let ok = preview_from_generated(GeneratedAudio {
        audio_base64: "aGVsbG8=".to_string(),
        mime_type: "audio/mpeg".to_string(),
    })
    .unwrap();
    assert_eq!(ok.audio_base64, "aGVsbG8=");
    assert_eq!(ok.mime_type, "audio/mpeg");

    for bad in ["", "   ", "%%%not-base64%%%"] {
        let result = preview_from_generated(GeneratedAudio {
            audio_base64: bad.to_string(),
            mime_type: "audio/mpeg".to_string(),
        });
        assert!(result.is_err(), "{:?} must be rejected", bad);
    }
}

#[test]
fn wav_blob_writes_a_riff_container() {
    let samples = vec![0.0f32, 0.5, -0.5, 1.5, -1.5];
    let bytes = wav_blob(&samples, 16000).expect("non-empty capture encodes");

    assert_eq!(&bytes[..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WAVE");
    // 44-byte header plus two bytes per sample.
    assert_eq!(bytes.len(), 44 + samples.len() * 2);
}

#[test]
fn wav_blob_refuses_empty_input() {
    assert!(wav_blob(&[], 16000).is_none());
    assert!(wav_blob(&[0.1], 0).is_none());
}
