use base64::{engine::general_purpose, Engine as _};

use sous::ChatSubmission;

use crate::error::AgentApiError;

/// Builds a text-only submission, rejecting blank input before any network
/// work happens.
pub fn text_submission(message: &str) -> Result<ChatSubmission, AgentApiError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(AgentApiError::InvalidRequest(
            "message must not be blank".to_owned(),
        ));
    }
    Ok(ChatSubmission::from_text(trimmed))
}

/// Builds a submission carrying an attached image, with optional text.
pub fn image_submission(
    image_bytes: &[u8],
    message: Option<&str>,
) -> Result<ChatSubmission, AgentApiError> {
    if image_bytes.is_empty() {
        return Err(AgentApiError::InvalidRequest(
            "attached image is empty".to_owned(),
        ));
    }

    let mut submission = ChatSubmission::default().with_image(encode_image(image_bytes));
    if let Some(message) = message.map(str::trim).filter(|message| !message.is_empty()) {
        submission.message = Some(message.to_owned());
    }
    Ok(submission)
}

/// Encodes raw image bytes to the wire's standard base64 alphabet.
#[must_use]
pub fn encode_image(image_bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(image_bytes)
}

/// Preflight check mirrored from the endpoint contract: at least one of
/// message or image must be present.
pub fn validate_submission(submission: &ChatSubmission) -> Result<(), AgentApiError> {
    if submission.is_empty() {
        return Err(AgentApiError::InvalidRequest(
            "submission requires a message or an image".to_owned(),
        ));
    }
    Ok(())
}
