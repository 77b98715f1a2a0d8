use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything the arbitration service sees about one conflict: both
/// versions of the file, their timestamps when known, and surrounding
/// diff context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrationRequest {
    pub file_path: String,
    pub parent_content: String,
    pub child_content: String,
    pub parent_ts: Option<DateTime<Utc>>,
    pub child_ts: Option<DateTime<Utc>>,
    pub diff_context: Option<String>,
}

/// Raw arbitration verdict. The choice is a string on purpose: the
/// service is an opaque model call and may answer with anything, so the
/// engine validates it and falls back rather than trusting the shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrationResponse {
    pub choice: String,
    pub reasoning: String,
    /// Full replacement content; required when choice is "merged".
    pub content: Option<String>,
}

#[derive(Debug, Error)]
pub enum ArbitrationError {
    #[error("Arbitration transport error: {0}")]
    Transport(String),

    #[error("Arbitration timed out after {0}ms")]
    Timeout(u64),
}

/// The external service that decides how to resolve a content conflict.
/// Fallible and possibly slow; implementations wrap whatever provider is
/// in use.
#[async_trait]
pub trait Arbitrator: Send + Sync {
    async fn arbitrate(
        &self,
        request: &ArbitrationRequest,
    ) -> Result<ArbitrationResponse, ArbitrationError>;
}
