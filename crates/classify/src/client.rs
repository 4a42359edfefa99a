use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::label::{normalize_label, SignLabel};
use crate::{ClassifyError, Result};

/// Hosted yes/no sign model.
pub const DEFAULT_ENDPOINT: &str = "https://sign-lang-api-7djy.onrender.com/predict";

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Multipart field carrying the image.
pub const UPLOAD_FIELD: &str = "file";

const JPEG_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub endpoint: String,
    /// Whole-request timeout, connect included.
    pub timeout_ms: u64,
    /// File name attached to the uploaded part.
    pub file_name: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            file_name: "frame.jpg".to_string(),
        }
    }
}

/// Outcome of one classification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The `result` field as sent by the endpoint, if it was a string.
    pub raw: Option<String>,
    pub label: SignLabel,
}

impl Classification {
    pub fn from_raw(raw: Option<String>) -> Self {
        let label = normalize_label(raw.as_deref());
        Self { raw, label }
    }
}

/// Classifies a single JPEG frame.
///
/// Implementations make exactly one attempt per call.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, jpeg: Vec<u8>) -> Result<Classification>;
}

pub type ClassifierRef = Arc<dyn Classifier>;

/// [`Classifier`] backed by the HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl HttpClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("signspeak/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, jpeg: Vec<u8>) -> Result<Classification> {
        let size = jpeg.len();
        let part = reqwest::multipart::Part::bytes(jpeg)
            .file_name(self.config.file_name.clone())
            .mime_str(JPEG_MIME)
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);

        tracing::debug!(endpoint = %self.config.endpoint, bytes = size, "uploading frame");

        let resp = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        // The status is not consulted while the body is JSON.
        let classification = match parse_response(&body) {
            Ok(classification) => classification,
            Err(_) if !status.is_success() => {
                return Err(ClassifyError::Status(status.as_u16()));
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(
            status = status.as_u16(),
            raw = ?classification.raw,
            label = %classification.label,
            "classified"
        );
        Ok(classification)
    }
}

/// Pull the `result` string out of a response body.
///
/// The body must be JSON; a missing or non-string `result` is not an error.
fn parse_response(body: &[u8]) -> Result<Classification> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ClassifyError::Parse(e.to_string()))?;

    let raw = value
        .get("result")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);

    Ok(Classification::from_raw(raw))
}
