use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::kernel::event::GeneratedAudio;

/// Voices offered by the synthesis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Alloy,
    Echo,
    Fable,
    Nova,
    Onyx,
    Shimmer,
}

impl Default for Voice {
    fn default() -> Self {
        Voice::Nova
    }
}

impl std::str::FromStr for Voice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alloy" => Ok(Voice::Alloy),
            "echo" => Ok(Voice::Echo),
            "fable" => Ok(Voice::Fable),
            "nova" => Ok(Voice::Nova),
            "onyx" => Ok(Voice::Onyx),
            "shimmer" => Ok(Voice::Shimmer),
            other => Err(format!("unknown voice: {}", other)),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
    voice: Voice,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    success: bool,
    #[serde(default)]
    audio_base64: String,
    #[serde(default)]
    mime_type: String,
}

/// Client for the text-to-speech collaborator.
#[derive(Clone)]
pub struct TtsClient {
    client: Client,
    endpoint: String,
}

impl TtsClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            endpoint: config.endpoint("generate-audio"),
        }
    }

    pub async fn generate(&self, text: &str, voice: Voice) -> Result<GeneratedAudio, ServiceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest { text, voice })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status()));
        }

        let body: GenerateResponse = response.json().await?;
        if !body.success {
            return Err(ServiceError::Backend("synthesis failed".to_string()));
        }

        Ok(GeneratedAudio {
            audio_base64: body.audio_base64,
            mime_type: if body.mime_type.is_empty() {
                "audio/mpeg".to_string()
            } else {
                body.mime_type
            },
        })
    }
}
