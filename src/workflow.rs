use std::collections::BTreeMap;

use crate::events::{RunSummary, StepEventStatus, StepPayload, StreamEvent};
use crate::recipe::Recipe;

/// Lifecycle of one named workflow step as observed on the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Error,
}

/// Accumulated progress of one assistant response.
///
/// Owned exclusively by its assistant message; every mutation goes through
/// [`WorkflowState::apply`], which folds stream events in arrival order.
/// Every field is last-write-wins: the transport guarantees nothing beyond
/// line order within one response body, and repeated or out-of-order
/// records must land idempotently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    step_status: BTreeMap<String, StepStatus>,
    step_payloads: BTreeMap<String, StepPayload>,
    final_message: Option<String>,
    final_recipes: Vec<Recipe>,
    run_summary: Option<RunSummary>,
    conversation_error: Option<String>,
}

impl WorkflowState {
    /// Folds one stream event into this state.
    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Step {
                step,
                status,
                data,
                summary,
                ..
            } => {
                match status {
                    StepEventStatus::InProgress => {
                        // Overwrites an earlier error for the step: the last
                        // signal for a step id wins.
                        self.step_status
                            .insert(step.clone(), StepStatus::InProgress);
                    }
                    StepEventStatus::Complete => {
                        self.step_status.insert(step.clone(), StepStatus::Completed);
                        if let Some(data) = data {
                            self.step_payloads.insert(step.clone(), data.clone());
                        }
                    }
                }
                if let Some(summary) = summary {
                    self.run_summary = Some(summary.clone());
                }
            }
            StreamEvent::Complete {
                message,
                recipes,
                summary,
            } => {
                if let Some(message) = message {
                    self.final_message = Some(message.clone());
                }
                if let Some(recipes) = recipes {
                    // Full replace, not merge.
                    self.final_recipes = recipes.clone();
                }
                if let Some(summary) = summary {
                    self.run_summary = Some(summary.clone());
                }
            }
            StreamEvent::Error {
                step: Some(step), ..
            } => {
                self.step_status.insert(step.clone(), StepStatus::Error);
            }
            StreamEvent::Error {
                step: None,
                message,
            } => {
                // Conversation-level failure: terminal for the response, but
                // it never touches per-step status. Raw backend text stays
                // here for operators; presentation layers substitute generic
                // copy.
                self.conversation_error = Some(
                    message
                        .clone()
                        .unwrap_or_else(|| "unspecified agent error".to_string()),
                );
            }
        }
    }

    /// Status for a step id; `Pending` when the stream never mentioned it.
    #[must_use]
    pub fn status_of(&self, step: &str) -> StepStatus {
        self.step_status.get(step).copied().unwrap_or_default()
    }

    /// Payload recorded by the event that completed `step`, if any.
    #[must_use]
    pub fn payload_of(&self, step: &str) -> Option<&StepPayload> {
        self.step_payloads.get(step)
    }

    /// Step ids observed on the stream, with their current status.
    pub fn observed_steps(&self) -> impl Iterator<Item = (&str, StepStatus)> {
        self.step_status
            .iter()
            .map(|(step, status)| (step.as_str(), *status))
    }

    #[must_use]
    pub fn final_message(&self) -> Option<&str> {
        self.final_message.as_deref()
    }

    #[must_use]
    pub fn final_recipes(&self) -> &[Recipe] {
        &self.final_recipes
    }

    #[must_use]
    pub fn run_summary(&self) -> Option<&RunSummary> {
        self.run_summary.as_ref()
    }

    /// Raw conversation-level error text, for diagnostics only.
    #[must_use]
    pub fn conversation_error(&self) -> Option<&str> {
        self.conversation_error.as_deref()
    }

    /// Derived, never stored: true iff any step has left `Pending`.
    #[must_use]
    pub fn has_workflow(&self) -> bool {
        self.step_status
            .values()
            .any(|status| !matches!(status, StepStatus::Pending))
    }
}

#[cfg(test)]
mod tests {
    use super::{StepStatus, WorkflowState};
    use crate::events::{StepEventStatus, StepPayload, StreamEvent};
    use crate::recipe::Recipe;

    fn step(step: &str, status: StepEventStatus) -> StreamEvent {
        StreamEvent::Step {
            step: step.to_string(),
            status,
            message: None,
            data: None,
            summary: None,
        }
    }

    fn step_complete_with(step: &str, data: StepPayload) -> StreamEvent {
        StreamEvent::Step {
            step: step.to_string(),
            status: StepEventStatus::Complete,
            message: None,
            data: Some(data),
            summary: None,
        }
    }

    #[test]
    fn fresh_state_has_no_workflow_and_pending_steps() {
        let state = WorkflowState::default();
        assert!(!state.has_workflow());
        assert_eq!(state.status_of("search_recipes"), StepStatus::Pending);
        assert!(state.final_message().is_none());
        assert!(state.final_recipes().is_empty());
    }

    #[test]
    fn in_progress_then_complete_records_payload() {
        let mut state = WorkflowState::default();
        state.apply(&step("search_recipes", StepEventStatus::InProgress));
        assert!(state.has_workflow());
        assert_eq!(state.status_of("search_recipes"), StepStatus::InProgress);

        state.apply(&step_complete_with(
            "search_recipes",
            StepPayload::RecipeSearch { recipe_count: 4 },
        ));
        assert_eq!(state.status_of("search_recipes"), StepStatus::Completed);
        assert_eq!(
            state.payload_of("search_recipes"),
            Some(&StepPayload::RecipeSearch { recipe_count: 4 })
        );
    }

    #[test]
    fn repeated_completion_is_idempotent() {
        let event = step_complete_with(
            "search_recipes",
            StepPayload::RecipeSearch { recipe_count: 4 },
        );

        let mut once = WorkflowState::default();
        once.apply(&event);

        let mut twice = WorkflowState::default();
        twice.apply(&event);
        twice.apply(&event);

        assert_eq!(once, twice);
    }

    #[test]
    fn last_complete_event_wins() {
        let mut state = WorkflowState::default();
        state.apply(&StreamEvent::Complete {
            message: Some("Found 3 recipes".to_string()),
            recipes: Some(vec![Recipe {
                id: 1,
                ..Recipe::default()
            }]),
            summary: None,
        });
        state.apply(&StreamEvent::Complete {
            message: Some("Found 5 recipes".to_string()),
            recipes: Some(vec![
                Recipe {
                    id: 2,
                    ..Recipe::default()
                },
                Recipe {
                    id: 3,
                    ..Recipe::default()
                },
            ]),
            summary: None,
        });

        assert_eq!(state.final_message(), Some("Found 5 recipes"));
        let ids: Vec<i64> = state.final_recipes().iter().map(|recipe| recipe.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn complete_event_without_fields_preserves_existing_values() {
        let mut state = WorkflowState::default();
        state.apply(&StreamEvent::Complete {
            message: Some("Found 3 recipes".to_string()),
            recipes: None,
            summary: None,
        });
        state.apply(&StreamEvent::Complete {
            message: None,
            recipes: None,
            summary: None,
        });

        assert_eq!(state.final_message(), Some("Found 3 recipes"));
    }

    #[test]
    fn step_error_does_not_block_other_steps() {
        let mut state = WorkflowState::default();
        state.apply(&step("analyze_image", StepEventStatus::InProgress));
        state.apply(&StreamEvent::Error {
            step: Some("analyze_image".to_string()),
            message: Some("vision model timed out".to_string()),
        });
        state.apply(&step("search_recipes", StepEventStatus::InProgress));
        state.apply(&step("search_recipes", StepEventStatus::Complete));

        assert_eq!(state.status_of("analyze_image"), StepStatus::Error);
        assert_eq!(state.status_of("search_recipes"), StepStatus::Completed);
        assert!(state.conversation_error().is_none());
    }

    #[test]
    fn in_progress_clears_an_earlier_step_error() {
        let mut state = WorkflowState::default();
        state.apply(&StreamEvent::Error {
            step: Some("get_details".to_string()),
            message: None,
        });
        state.apply(&step("get_details", StepEventStatus::InProgress));

        assert_eq!(state.status_of("get_details"), StepStatus::InProgress);
    }

    #[test]
    fn later_step_error_regresses_a_completed_step() {
        let mut state = WorkflowState::default();
        state.apply(&step("get_details", StepEventStatus::Complete));
        state.apply(&StreamEvent::Error {
            step: Some("get_details".to_string()),
            message: None,
        });

        assert_eq!(state.status_of("get_details"), StepStatus::Error);
    }

    #[test]
    fn conversation_error_leaves_steps_untouched() {
        let mut state = WorkflowState::default();
        state.apply(&step("search", StepEventStatus::InProgress));
        state.apply(&StreamEvent::Error {
            step: None,
            message: Some("vision service unavailable".to_string()),
        });

        assert_eq!(state.status_of("search"), StepStatus::InProgress);
        assert_eq!(
            state.conversation_error(),
            Some("vision service unavailable")
        );
    }
}
