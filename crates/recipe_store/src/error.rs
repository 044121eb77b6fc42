use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeStoreError {
    #[error("recipe endpoint returned HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("recipe request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid header for recipe request: {0}")]
    InvalidHeader(String),
}

/// Pulls the `{"error": ...}` message the persistence routes emit, falling
/// back to the raw body or the canonical status reason.
pub(crate) fn status_error(status: StatusCode, body: &str) -> RecipeStoreError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });

    RecipeStoreError::Status { status, message }
}
