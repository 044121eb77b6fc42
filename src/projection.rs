use crate::events::{StepPayload, STEP_FORMAT_INGREDIENTS};
use crate::recipe::Recipe;
use crate::steps::StepCatalog;
use crate::workflow::{StepStatus, WorkflowState};

/// User-facing copy shown for any terminal failure. Raw backend error text
/// never reaches the user; it goes to the operator log channel instead.
pub const GENERIC_FAILURE_TEXT: &str =
    "Something went wrong while preparing your answer. Please try again.";

/// One renderable workflow row.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRow {
    pub id: String,
    pub label: String,
    pub status: StepStatus,
    pub detail: String,
}

/// Everything a rendering layer needs for one assistant response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowView {
    pub rows: Vec<StepRow>,
    pub message: Option<String>,
    pub recipes: Vec<Recipe>,
    pub error_text: Option<String>,
}

/// Derives the visible view of a workflow from its state and a step catalog.
///
/// Pure: same state + catalog always yields the same view. Rows appear in
/// catalog order with pending steps omitted; steps the catalog does not know
/// are appended afterwards with their raw id as the label, so backend-added
/// step kinds still render.
#[must_use]
pub fn project(state: &WorkflowState, catalog: &StepCatalog) -> WorkflowView {
    let mut rows = Vec::new();

    for info in catalog.iter() {
        let status = state.status_of(info.id);
        if matches!(status, StepStatus::Pending) {
            continue;
        }
        rows.push(StepRow {
            id: info.id.to_string(),
            label: info.label.to_string(),
            status,
            detail: step_detail(state, info.id, status, Some(info)),
        });
    }

    for (step, status) in state.observed_steps() {
        if catalog.info(step).is_some() {
            continue;
        }
        rows.push(StepRow {
            id: step.to_string(),
            label: step.to_string(),
            status,
            detail: step_detail(state, step, status, None),
        });
    }

    let error_text = state
        .conversation_error()
        .map(|_| GENERIC_FAILURE_TEXT.to_string());

    WorkflowView {
        rows,
        message: state.final_message().map(str::to_string),
        recipes: state.final_recipes().to_vec(),
        error_text,
    }
}

fn step_detail(
    state: &WorkflowState,
    step: &str,
    status: StepStatus,
    info: Option<&crate::steps::StepInfo>,
) -> String {
    match status {
        StepStatus::Pending => String::new(),
        StepStatus::InProgress => info
            .map(|info| info.in_progress_text.to_string())
            .unwrap_or_default(),
        StepStatus::Error => "Error".to_string(),
        StepStatus::Completed => completed_detail(state, step, info),
    }
}

fn completed_detail(
    state: &WorkflowState,
    step: &str,
    info: Option<&crate::steps::StepInfo>,
) -> String {
    match state.payload_of(step) {
        Some(StepPayload::IngredientAnalysis {
            ingredients_count, ..
        }) => return format!("{ingredients_count} ingredients found"),
        Some(StepPayload::RecipeSearch { recipe_count }) => {
            return format!("{recipe_count} recipes found")
        }
        _ => {}
    }

    if step == STEP_FORMAT_INGREDIENTS {
        if let Some(selected) = state
            .run_summary()
            .and_then(|summary| summary.ingredients_used_for_search.as_deref())
        {
            return format!("Selected ingredients: {selected}");
        }
    }

    info.map(|info| info.completed_text.to_string())
        .unwrap_or_else(|| "Done".to_string())
}
