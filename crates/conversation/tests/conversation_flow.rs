use std::sync::atomic::Ordering;

use agent_api_mock::{ScriptAction, ScriptedAgent};
use conversation::{run_submission, Conversation, DraftImage, SubmitError};
use sous::{
    project, CancelSignal, Recipe, StepCatalog, StepEventStatus, StepStatus, StreamEvent,
    WorkflowState, GENERIC_FAILURE_TEXT,
};

fn assistant_workflow(conversation: &Conversation) -> &WorkflowState {
    conversation
        .messages()
        .last()
        .expect("assistant message present")
        .workflow
        .as_ref()
        .expect("assistant owns a workflow")
}

#[tokio::test]
async fn query_submission_streams_to_a_completed_workflow() {
    let backend = ScriptedAgent::completing(vec![
        StreamEvent::Step {
            step: "search".to_string(),
            status: StepEventStatus::InProgress,
            message: None,
            data: None,
            summary: None,
        },
        StreamEvent::Step {
            step: "search".to_string(),
            status: StepEventStatus::Complete,
            message: None,
            data: None,
            summary: None,
        },
        StreamEvent::Complete {
            message: Some("Found 3 recipes".to_string()),
            recipes: Some(vec![Recipe {
                id: 101,
                ..Recipe::default()
            }]),
            summary: None,
        },
    ]);

    let mut conversation = Conversation::new();
    conversation.set_draft_text("chicken pasta");
    run_submission(&mut conversation, &backend, CancelSignal::default())
        .await
        .expect("submission accepted");

    let workflow = assistant_workflow(&conversation);
    assert_eq!(workflow.status_of("search"), StepStatus::Completed);
    assert_eq!(workflow.final_message(), Some("Found 3 recipes"));
    assert_eq!(workflow.final_recipes().len(), 1);
    assert!(!conversation.messages().last().expect("assistant").is_loading);
    assert!(!conversation.is_request_in_flight());
}

#[tokio::test]
async fn backend_error_event_surfaces_generic_copy_without_steps() {
    let backend = ScriptedAgent::completing(vec![StreamEvent::Error {
        step: None,
        message: Some("vision service unavailable".to_string()),
    }]);

    let mut conversation = Conversation::new();
    conversation.attach_image(DraftImage {
        preview: "blob:fridge-1".to_string(),
        base64: "aGVsbG8=".to_string(),
    });
    run_submission(&mut conversation, &backend, CancelSignal::default())
        .await
        .expect("submission accepted");

    let workflow = assistant_workflow(&conversation);
    assert!(!workflow.has_workflow());
    assert_eq!(
        workflow.conversation_error(),
        Some("vision service unavailable")
    );
    assert!(!conversation.messages().last().expect("assistant").is_loading);

    // Presentation substitutes the generic copy for the raw backend text.
    let view = project(workflow, &StepCatalog::default_catalog());
    assert_eq!(view.error_text.as_deref(), Some(GENERIC_FAILURE_TEXT));
    assert!(view.rows.is_empty());
}

#[tokio::test]
async fn transport_failure_before_streaming_fails_the_placeholder() {
    let backend = ScriptedAgent::failing("HTTP 500 Internal Server Error");

    let mut conversation = Conversation::new();
    conversation.set_draft_text("chicken pasta");
    run_submission(&mut conversation, &backend, CancelSignal::default())
        .await
        .expect("submission accepted");

    let workflow = assistant_workflow(&conversation);
    assert!(!workflow.has_workflow());
    assert_eq!(workflow.conversation_error(), Some(GENERIC_FAILURE_TEXT));
    assert!(!conversation.messages().last().expect("assistant").is_loading);
    assert!(!conversation.is_request_in_flight());
}

#[tokio::test]
async fn mid_stream_failure_keeps_partial_progress_and_recovers_input() {
    let backend = ScriptedAgent::new(vec![
        ScriptAction::Emit(StreamEvent::Step {
            step: "analyze_image".to_string(),
            status: StepEventStatus::InProgress,
            message: None,
            data: None,
            summary: None,
        }),
        ScriptAction::Fail("connection reset".to_string()),
    ]);

    let mut conversation = Conversation::new();
    conversation.set_draft_text("what is in my fridge");
    run_submission(&mut conversation, &backend, CancelSignal::default())
        .await
        .expect("submission accepted");

    let workflow = assistant_workflow(&conversation);
    assert_eq!(workflow.status_of("analyze_image"), StepStatus::InProgress);
    assert_eq!(workflow.conversation_error(), Some(GENERIC_FAILURE_TEXT));

    conversation.set_draft_text("try again");
    assert!(conversation.can_submit());
}

#[tokio::test]
async fn cancelled_submission_is_abandoned_quietly() {
    let backend = ScriptedAgent::default();
    let cancel = CancelSignal::default();
    cancel.store(true, Ordering::Release);

    let mut conversation = Conversation::new();
    conversation.set_draft_text("dinner");
    run_submission(&mut conversation, &backend, cancel)
        .await
        .expect("submission accepted");

    let workflow = assistant_workflow(&conversation);
    assert!(workflow.conversation_error().is_none());
    assert!(!conversation.is_request_in_flight());
    assert!(!conversation.messages().last().expect("assistant").is_loading);
}

#[tokio::test]
async fn empty_draft_never_reaches_the_backend() {
    let backend = ScriptedAgent::default();
    let mut conversation = Conversation::new();

    let result = run_submission(&mut conversation, &backend, CancelSignal::default()).await;

    assert_eq!(result, Err(SubmitError::EmptyDraft));
    assert!(conversation.messages().is_empty());
}

#[tokio::test]
async fn default_fridge_script_completes_end_to_end() {
    let backend = ScriptedAgent::default();
    let mut conversation = Conversation::new();
    conversation.attach_image(DraftImage {
        preview: "blob:fridge-2".to_string(),
        base64: "Zm9vZA==".to_string(),
    });

    run_submission(&mut conversation, &backend, CancelSignal::default())
        .await
        .expect("submission accepted");

    let workflow = assistant_workflow(&conversation);
    for step in [
        "analyze_image",
        "format_ingredients",
        "search_recipes",
        "get_details",
    ] {
        assert_eq!(workflow.status_of(step), StepStatus::Completed, "{step}");
    }
    assert_eq!(workflow.final_recipes().len(), 2);

    let view = project(workflow, &StepCatalog::default_catalog());
    assert_eq!(view.rows.len(), 4);
    assert!(view.error_text.is_none());
    assert_eq!(
        view.rows[0].detail, "5 ingredients found",
        "analysis row reflects payload"
    );
}
