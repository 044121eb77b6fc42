use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use sous::WorkflowState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation transcript.
///
/// The assistant placeholder is created with an empty workflow and
/// `is_loading` set; both fields are mutated only through the owning
/// [`Conversation`](crate::Conversation) while its request is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationMessage {
    pub id: String,
    pub role: Role,
    pub text: Option<String>,
    /// Local preview reference of a user-attached image; immutable after
    /// creation.
    pub image_preview: Option<String>,
    /// Assistant-only workflow progress; always `None` for user messages.
    pub workflow: Option<WorkflowState>,
    /// True from creation until the first stream event or a terminal
    /// failure arrives.
    pub is_loading: bool,
    pub created_at: String,
}

impl ConversationMessage {
    #[must_use]
    pub fn user(text: Option<String>, image_preview: Option<String>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::User,
            text,
            image_preview,
            workflow: None,
            is_loading: false,
            created_at: now_rfc3339(),
        }
    }

    #[must_use]
    pub fn assistant_placeholder() -> Self {
        Self {
            id: new_message_id(),
            role: Role::Assistant,
            text: None,
            image_preview: None,
            workflow: Some(WorkflowState::default()),
            is_loading: true,
            created_at: now_rfc3339(),
        }
    }
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{ConversationMessage, Role};

    #[test]
    fn user_message_carries_no_workflow() {
        let message = ConversationMessage::user(Some("hi".to_string()), None);
        assert_eq!(message.role, Role::User);
        assert!(message.workflow.is_none());
        assert!(!message.is_loading);
        assert!(!message.id.is_empty());
    }

    #[test]
    fn assistant_placeholder_starts_loading_with_empty_workflow() {
        let message = ConversationMessage::assistant_placeholder();
        assert_eq!(message.role, Role::Assistant);
        assert!(message.is_loading);
        let workflow = message.workflow.expect("placeholder owns a workflow");
        assert!(!workflow.has_workflow());
    }

    #[test]
    fn message_ids_are_unique() {
        let a = ConversationMessage::assistant_placeholder();
        let b = ConversationMessage::assistant_placeholder();
        assert_ne!(a.id, b.id);
    }
}
