//! Gemini API client
//!
//! Implements the [`Classifier`] gateway against Google's Gemini REST API:
//! - File API upload (resumable protocol) with state polling for
//!   content-based filename suggestions
//! - Text-only generateContent for filename-based categorization
//! - Rate-limit retries and API key validation
//!
//! All knobs live in [`GeminiConfig`]; nothing here reads ambient state.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::prompts::{build_category_prompt, FILENAME_PROMPT};
use super::Classifier;
use crate::error::ClassifyError;
use crate::naming::UNCATEGORIZED;

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const STATE_PROCESSING: &str = "PROCESSING";
const STATE_ACTIVE: &str = "ACTIVE";

/// Configuration for [`GeminiClient`]
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent in the `x-goog-api-key` header
    pub api_key: String,

    /// Model name, e.g. `gemini-2.5-flash`
    pub model: String,

    /// API base URL (no trailing slash)
    pub base_url: String,

    /// Delay between polls of an uploaded file's state
    pub poll_interval: Duration,

    /// Polls to tolerate before giving up on a PROCESSING upload
    pub max_poll_attempts: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: 120,
        }
    }
}

/// Gemini-backed classification gateway
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new client from an explicit configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, ClassifyError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    /// Check that the API key and model name are usable by fetching the
    /// model's metadata. Costs no generation quota.
    pub async fn validate(&self) -> Result<(), ClassifyError> {
        let url = format!(
            "{}/v1beta/models/{}",
            self.config.base_url, self.config.model
        );
        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(resp).await)
        }
    }

    /// Upload file bytes through the File API's resumable protocol.
    ///
    /// Two requests: a `start` carrying the metadata, which answers with a
    /// session URL, then the bytes against that URL with `upload, finalize`.
    async fn upload(
        &self,
        display_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<FileResource, ClassifyError> {
        let start_url = format!("{}/upload/v1beta/files", self.config.base_url);
        let metadata = UploadStartRequest {
            file: FileMetadata {
                display_name: display_name.to_string(),
            },
        };

        let resp = self
            .client
            .post(&start_url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&metadata)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let upload_url = resp
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(ClassifyError::MissingUploadUrl)?;

        let resp = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let uploaded: UploadResponse = resp.json().await?;
        Ok(uploaded.file)
    }

    /// Poll an uploaded file until it leaves PROCESSING, then require ACTIVE.
    async fn wait_until_active(
        &self,
        mut file: FileResource,
    ) -> Result<FileResource, ClassifyError> {
        let mut attempts = 0u32;
        while file.state == STATE_PROCESSING || file.state.is_empty() {
            if attempts >= self.config.max_poll_attempts {
                return Err(ClassifyError::ProcessingTimeout { attempts });
            }
            tokio::time::sleep(self.config.poll_interval).await;
            file = self.fetch_file(&file.name).await?;
            attempts += 1;
        }

        if file.state == STATE_ACTIVE {
            Ok(file)
        } else {
            Err(ClassifyError::UploadFailed { state: file.state })
        }
    }

    /// Fetch the current state of an uploaded file resource.
    async fn fetch_file(&self, name: &str) -> Result<FileResource, ClassifyError> {
        let url = format!("{}/v1beta/{}", self.config.base_url, name);
        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// Delete an uploaded file, best effort. Failures only get a debug line;
    /// the server expires uploads on its own anyway.
    async fn delete_file(&self, name: &str) {
        let url = format!("{}/v1beta/{}", self.config.base_url, name);
        match self
            .client
            .delete(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => debug!(file = name, status = %resp.status(), "Upload cleanup failed"),
            Err(e) => debug!(file = name, error = %e, "Upload cleanup failed"),
        }
    }

    /// Send a generateContent request, retrying on rate limits.
    async fn generate(&self, parts: Vec<Part>) -> Result<String, ClassifyError> {
        let request = GenerateRequest {
            contents: vec![Content { parts }],
        };
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        let mut retry_delay = Duration::from_secs(2);
        let max_retries = 2;

        for retry in 0..=max_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            let resp = self
                .client
                .post(&url)
                .header(API_KEY_HEADER, &self.config.api_key)
                .json(&request)
                .send()
                .await;

            match resp {
                Ok(r) if r.status().as_u16() == 429 => {
                    warn!("Rate limited, retry {}/{}", retry + 1, max_retries);
                    continue;
                }
                Ok(r) if r.status().is_success() => {
                    let body: GenerateResponse = r.json().await?;
                    return reply_text(body);
                }
                Ok(r) => return Err(error_from_response(r).await),
                Err(e) => {
                    if retry == max_retries {
                        return Err(e.into());
                    }
                    continue;
                }
            }
        }

        Err(ClassifyError::Api {
            status: 429,
            message: "rate limited after retries".to_string(),
        })
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    async fn suggest_filename(&self, path: &Path) -> Result<String, ClassifyError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClassifyError::ReadFile {
                path: path.display().to_string(),
                source: e,
            })?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        debug!(file = %display_name, mime = %mime_type, size = bytes.len(), "Uploading for analysis");

        let uploaded = self.upload(&display_name, &mime_type, bytes).await?;
        let active = self.wait_until_active(uploaded).await?;

        let parts = vec![
            Part::File {
                file_data: FileData {
                    mime_type,
                    file_uri: active.uri.clone(),
                },
            },
            Part::Text {
                text: FILENAME_PROMPT.to_string(),
            },
        ];
        let result = self.generate(parts).await;

        // The upload served its purpose either way.
        self.delete_file(&active.name).await;

        result
    }

    async fn categorize(&self, filename: &str) -> String {
        let parts = vec![Part::Text {
            text: build_category_prompt(filename),
        }];
        match self.generate(parts).await {
            Ok(category) => category,
            Err(e) => {
                warn!(file = filename, error = %e, "Categorization failed, using fallback");
                UNCATEGORIZED.to_string()
            }
        }
    }
}

/// Pull the reply text out of a generateContent response and normalize it.
fn reply_text(body: GenerateResponse) -> Result<String, ClassifyError> {
    let joined = body
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");

    let reply = normalize_reply(&joined);
    if reply.is_empty() {
        Err(ClassifyError::EmptyReply)
    } else {
        Ok(reply)
    }
}

/// Reduce a model reply to the bare label: drop code fences, surrounding
/// quotes, and everything past the first non-empty line.
fn normalize_reply(text: &str) -> String {
    let mut cleaned = text.trim();

    if let Some(rest) = cleaned.strip_prefix("```") {
        // Drop the fence line (which may carry a language tag) and the
        // closing fence.
        cleaned = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest,
        };
        cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();
    }

    let first_line = cleaned
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    first_line
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

/// Extract the message out of a standard `{"error": {...}}` body.
fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
}

/// Turn a non-success response into a [`ClassifyError::Api`].
async fn error_from_response(resp: Response) -> ClassifyError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = parse_error_message(&body).unwrap_or(body);
    ClassifyError::Api { status, message }
}

// API request/response types

#[derive(Serialize)]
struct UploadStartRequest {
    file: FileMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata {
    display_name: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    state: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}
