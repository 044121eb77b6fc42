use sous::{ChatSubmission, StreamEvent, GENERIC_FAILURE_TEXT};

use crate::error::SubmitError;
use crate::message::{ConversationMessage, Role};

/// Image staged in the draft: a local preview reference for the transcript
/// plus the encoded bytes for the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftImage {
    pub preview: String,
    pub base64: String,
}

/// Submission handed to the transport after a successful
/// [`Conversation::begin_submission`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub assistant_id: String,
    pub submission: ChatSubmission,
}

/// Ordered message list plus draft input for one chat session.
///
/// Messages are mutated only through this store's own operations, keeping
/// ordering and identity stable for keyed consumers. While a request is in
/// flight exactly one assistant message is active; every incoming event
/// folds into that message's workflow.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    draft_text: String,
    draft_image: Option<DraftImage>,
    active_assistant_id: Option<String>,
    in_flight: bool,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    #[must_use]
    pub fn message(&self, id: &str) -> Option<&ConversationMessage> {
        self.messages.iter().find(|message| message.id == id)
    }

    #[must_use]
    pub fn is_request_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft_text = text.into();
    }

    #[must_use]
    pub fn draft_text(&self) -> &str {
        &self.draft_text
    }

    pub fn attach_image(&mut self, image: DraftImage) {
        self.draft_image = Some(image);
    }

    pub fn remove_image(&mut self) {
        self.draft_image = None;
    }

    #[must_use]
    pub fn draft_image(&self) -> Option<&DraftImage> {
        self.draft_image.as_ref()
    }

    /// True when submitting now would be accepted.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.in_flight && (!self.draft_text.trim().is_empty() || self.draft_image.is_some())
    }

    /// Starts one submission from the current draft.
    ///
    /// Rejection leaves the store untouched: no messages are appended and
    /// the draft survives for the user to amend. On success the draft is
    /// cleared synchronously, the user message and assistant placeholder
    /// are appended as one atomic pair, and the request is marked in
    /// flight.
    pub fn begin_submission(&mut self) -> Result<PendingSubmission, SubmitError> {
        if self.in_flight {
            return Err(SubmitError::RequestInFlight);
        }

        let text = self.draft_text.trim().to_string();
        if text.is_empty() && self.draft_image.is_none() {
            return Err(SubmitError::EmptyDraft);
        }

        self.draft_text.clear();
        let image = self.draft_image.take();

        let message_text = if text.is_empty() { None } else { Some(text) };
        let user = ConversationMessage::user(
            message_text.clone(),
            image.as_ref().map(|image| image.preview.clone()),
        );
        let assistant = ConversationMessage::assistant_placeholder();
        let assistant_id = assistant.id.clone();

        self.messages.push(user);
        self.messages.push(assistant);

        self.active_assistant_id = Some(assistant_id.clone());
        self.in_flight = true;

        Ok(PendingSubmission {
            assistant_id,
            submission: ChatSubmission {
                message: message_text,
                image_base64: image.map(|image| image.base64),
            },
        })
    }

    /// Folds one stream event into the active assistant message.
    ///
    /// The first event of any kind clears the placeholder's loading marker.
    /// Events arriving with no active request are dropped; they belong to a
    /// request this store no longer owns.
    pub fn apply_stream_event(&mut self, event: &StreamEvent) {
        let Some(message) = self.active_assistant_mut() else {
            tracing::debug!("dropping stream event without an active request");
            return;
        };

        message.is_loading = false;
        if let Some(workflow) = message.workflow.as_mut() {
            workflow.apply(event);
        }
    }

    /// Terminal path for a drained stream.
    pub fn finish_stream(&mut self) {
        self.clear_active_request();
    }

    /// Terminal path for a transport or fatal failure: the active message
    /// receives a synthetic conversation-level error carrying the generic
    /// user-facing copy, then the request is released.
    pub fn fail_stream(&mut self) {
        let terminal = StreamEvent::Error {
            step: None,
            message: Some(GENERIC_FAILURE_TEXT.to_string()),
        };
        self.apply_stream_event(&terminal);
        self.clear_active_request();
    }

    /// Terminal path for a cancelled or torn-down request: no synthetic
    /// error, the partial workflow simply stops advancing.
    pub fn abandon_stream(&mut self) {
        self.clear_active_request();
    }

    /// Releases the in-flight request. Every terminal path funnels through
    /// here so input controls are never left disabled after a failure.
    fn clear_active_request(&mut self) {
        if let Some(message) = self.active_assistant_mut() {
            message.is_loading = false;
        }
        self.active_assistant_id = None;
        self.in_flight = false;
    }

    fn active_assistant_mut(&mut self) -> Option<&mut ConversationMessage> {
        let id = self.active_assistant_id.clone()?;
        self.messages
            .iter_mut()
            .find(|message| message.id == id && message.role == Role::Assistant)
    }
}
