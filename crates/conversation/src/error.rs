use thiserror::Error;

/// Rejection of a submission attempt before any message is appended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("draft has no message text or attached image")]
    EmptyDraft,

    #[error("a request is already in flight for this conversation")]
    RequestInFlight,
}
