use std::io::Cursor;

/// Assemble accumulated capture chunks into a single in-memory WAV blob,
/// 16-bit PCM mono. Returns `None` for an empty capture — stopping before any
/// data arrived is a valid no-op, not an error.
pub fn wav_blob(samples: &[f32], sample_rate: u32) -> Option<Vec<u8>> {
    if samples.is_empty() || sample_rate == 0 {
        return None;
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).ok()?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            let value = (clamped * i16::MAX as f32) as i16;
            writer.write_sample(value).ok()?;
        }
        writer.finalize().ok()?;
    }
    Some(cursor.into_inner())
}
