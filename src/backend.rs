use std::fmt;
use std::sync::{atomic::AtomicBool, Arc};

use async_trait::async_trait;
use serde::Serialize;

use crate::events::StreamEvent;

/// Shared cancellation flag for one in-flight submission.
pub type CancelSignal = Arc<AtomicBool>;

/// Wire body of one chat submission: text, an attached image, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatSubmission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl ChatSubmission {
    #[must_use]
    pub fn from_text(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            image_base64: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image_base64: impl Into<String>) -> Self {
        self.image_base64 = Some(image_base64.into());
        self
    }

    /// True when neither a non-blank message nor an image is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let message_blank = self
            .message
            .as_deref()
            .is_none_or(|message| message.trim().is_empty());
        let image_blank = self
            .image_base64
            .as_deref()
            .is_none_or(|image| image.is_empty());
        message_blank && image_blank
    }
}

/// Failure surfaced at the backend seam.
///
/// Carries operator-facing detail only; presentation layers substitute the
/// generic failure copy before anything reaches the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    message: String,
}

impl BackendError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendError {}

impl From<String> for BackendError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for BackendError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Streaming agent contract for one submission.
///
/// Implementations deliver decoded events through `on_event` strictly in
/// stream order, check `cancel` at every suspension point, and return only
/// after the stream is drained, fails, or is cancelled. The callback is
/// synchronous and non-reentrant: callers may fold events into owned state
/// without further synchronization.
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    async fn run(
        &self,
        submission: ChatSubmission,
        cancel: CancelSignal,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::{BackendError, ChatSubmission};

    #[test]
    fn submission_emptiness_requires_text_or_image() {
        assert!(ChatSubmission::default().is_empty());
        assert!(ChatSubmission::from_text("   ").is_empty());
        assert!(!ChatSubmission::from_text("chicken pasta").is_empty());
        assert!(!ChatSubmission::default().with_image("aGVsbG8=").is_empty());
    }

    #[test]
    fn submission_serializes_without_absent_fields() {
        let value =
            serde_json::to_value(ChatSubmission::from_text("dinner ideas")).expect("serialize");
        assert_eq!(value["message"], "dinner ideas");
        assert!(value.get("image_base64").is_none());
    }

    #[test]
    fn backend_error_preserves_message() {
        let error = BackendError::new("connection reset");
        assert_eq!(error.message(), "connection reset");
        assert_eq!(error.to_string(), "connection reset");
    }
}
