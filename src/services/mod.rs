pub mod jobs;
pub mod storage;
pub mod transcribe;
pub mod tts;
