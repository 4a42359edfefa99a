//! Remote sign classification.
//!
//! A captured JPEG frame is uploaded to the classification endpoint, whose
//! JSON reply carries a `result` label. The label is normalized to
//! [`SignLabel`]; anything other than a case-insensitive "YES" or "NO" is
//! [`SignLabel::Uncertain`]. Retrying is the caller's business.

mod client;
mod label;

pub use client::{
    Classification, Classifier, ClassifierConfig, ClassifierRef, HttpClassifier,
    DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS, UPLOAD_FIELD,
};
pub use label::{normalize_label, SignLabel};

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("request failed: {0}")]
    Transport(String),
    /// Non-success status with a body that is not JSON.
    #[error("classifier returned HTTP {0}")]
    Status(u16),
    #[error("unreadable classifier response: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
