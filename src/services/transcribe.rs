use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::error::ServiceError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscribeRequest<'a> {
    audio_url: &'a str,
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseSegment {
    pub line: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// Forced-alignment result as returned by the collaborator: one segment per
/// text line, plus optional raw per-word stamps.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentResponse {
    #[serde(default)]
    pub segments: Vec<ResponseSegment>,
    #[serde(default)]
    pub raw_words: Option<Vec<ResponseWord>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscribeEnvelope {
    success: bool,
    #[serde(default)]
    segments: Vec<ResponseSegment>,
    #[serde(default)]
    raw_words: Option<Vec<ResponseWord>>,
}

/// Client for the transcription/forced-alignment collaborator.
#[derive(Clone)]
pub struct TranscribeClient {
    client: Client,
    endpoint: String,
}

impl TranscribeClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            endpoint: config.endpoint("transcribe-audio"),
        }
    }

    pub async fn align(
        &self,
        audio_url: &str,
        text: &str,
    ) -> Result<AlignmentResponse, ServiceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&TranscribeRequest { audio_url, text })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status()));
        }

        let body: TranscribeEnvelope = response.json().await?;
        if !body.success {
            return Err(ServiceError::Backend("transcription failed".to_string()));
        }

        Ok(AlignmentResponse {
            segments: body.segments,
            raw_words: body.raw_words,
        })
    }
}
