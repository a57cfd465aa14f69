use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::error::ServiceError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveRequest<'a> {
    audio_base64: &'a str,
    folder: &'a str,
    filename: &'a str,
}

#[derive(Deserialize)]
struct StoredResponse {
    success: bool,
    #[serde(default)]
    url: String,
}

/// Client for the durable-storage collaborator. Two entry points, both
/// returning a stable reference path: `save` for base64 payloads (synthesized
/// previews) and `upload` for raw blobs (file uploads and recorder output).
///
/// No automatic retries here; the caller refuses re-triggering while a call is
/// outstanding, and uniqueness suffixes in filenames make a repeated save a
/// new object rather than an overwrite.
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    save_endpoint: String,
    upload_endpoint: String,
}

impl StorageClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            save_endpoint: config.endpoint("save-audio"),
            upload_endpoint: config.endpoint("upload-audio"),
        }
    }

    pub async fn save(
        &self,
        audio_base64: &str,
        folder: &str,
        filename: &str,
    ) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(&self.save_endpoint)
            .json(&SaveRequest {
                audio_base64,
                folder,
                filename,
            })
            .send()
            .await?;

        Self::into_url(response).await
    }

    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        folder: &str,
        filename: &str,
    ) -> Result<String, ServiceError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(ServiceError::Transport)?;

        let form = Form::new()
            .part("audio", part)
            .text("folder", folder.to_string())
            .text("filename", filename.to_string());

        let response = self
            .client
            .post(&self.upload_endpoint)
            .multipart(form)
            .send()
            .await?;

        Self::into_url(response).await
    }

    async fn into_url(response: reqwest::Response) -> Result<String, ServiceError> {
        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status()));
        }
        let body: StoredResponse = response.json().await?;
        if !body.success || body.url.is_empty() {
            return Err(ServiceError::Backend("storage rejected the audio".to_string()));
        }
        Ok(body.url)
    }
}
