//! Deterministic mock implementation of the shared `sous` backend contract.
//!
//! This crate contains no transport logic and is intended for local
//! development and contract-level integration testing of conversation
//! flows.

use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;

use sous::{
    BackendError, CancelSignal, ChatBackend, ChatSubmission, Ingredient, InstructionStep,
    NutritionInfo, Recipe, RunSummary, StepEventStatus, StepPayload, StreamEvent,
};

/// Stable backend identifier used for explicit startup selection.
pub const MOCK_BACKEND_ID: &str = "mock";

/// One scripted action of a mock run.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptAction {
    /// Deliver this event to the caller.
    Emit(StreamEvent),
    /// Abort the run with a transport-style failure.
    Fail(String),
}

/// Scripted chat backend replaying a fixed action sequence per submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedAgent {
    script: Vec<ScriptAction>,
    step_delay: Option<Duration>,
}

impl ScriptedAgent {
    /// Replays the caller-provided script verbatim.
    #[must_use]
    pub fn new(script: Vec<ScriptAction>) -> Self {
        Self {
            script,
            step_delay: None,
        }
    }

    /// Convenience constructor for an event-only script.
    #[must_use]
    pub fn completing(events: Vec<StreamEvent>) -> Self {
        Self::new(events.into_iter().map(ScriptAction::Emit).collect())
    }

    /// Backend whose run fails immediately with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(vec![ScriptAction::Fail(message.into())])
    }

    /// Sleep between actions so interactive runs feel like a live agent.
    #[must_use]
    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = Some(step_delay);
        self
    }
}

impl Default for ScriptedAgent {
    /// Full fridge workflow: analyze, format, search, details, completion
    /// with two canned recipes.
    fn default() -> Self {
        let ingredients = vec![
            "eggs".to_string(),
            "kale".to_string(),
            "feta".to_string(),
            "cherry tomatoes".to_string(),
            "leftover rice".to_string(),
        ];

        Self::completing(vec![
            step("analyze_image", StepEventStatus::InProgress, None, None),
            step(
                "analyze_image",
                StepEventStatus::Complete,
                Some(StepPayload::IngredientAnalysis {
                    ingredients_count: ingredients.len() as u32,
                    ingredients: ingredients.clone(),
                }),
                None,
            ),
            step("format_ingredients", StepEventStatus::InProgress, None, None),
            step(
                "format_ingredients",
                StepEventStatus::Complete,
                None,
                Some(RunSummary {
                    ingredients_used_for_search: Some("eggs, kale, feta".to_string()),
                    ..RunSummary::default()
                }),
            ),
            step("search_recipes", StepEventStatus::InProgress, None, None),
            step(
                "search_recipes",
                StepEventStatus::Complete,
                Some(StepPayload::RecipeSearch { recipe_count: 2 }),
                None,
            ),
            step("get_details", StepEventStatus::InProgress, None, None),
            step("get_details", StepEventStatus::Complete, None, None),
            StreamEvent::Complete {
                message: Some(
                    "Found 2 delicious recipes you can make with your ingredients!".to_string(),
                ),
                recipes: Some(vec![
                    canned_recipe(
                        640803,
                        "Crustless Kale and Feta Quiche",
                        25,
                        vec!["eggs", "kale", "feta"],
                    ),
                    canned_recipe(
                        715769,
                        "Broccolini Quinoa Pilaf",
                        30,
                        vec!["cherry tomatoes", "leftover rice"],
                    ),
                ]),
                summary: Some(RunSummary {
                    total_ingredients_found: Some(5),
                    ingredients_used_for_search: Some("eggs, kale, feta".to_string()),
                    total_recipes: Some(2),
                    query: None,
                }),
            },
        ])
    }
}

#[async_trait]
impl ChatBackend for ScriptedAgent {
    async fn run(
        &self,
        _submission: ChatSubmission,
        cancel: CancelSignal,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> Result<(), BackendError> {
        for action in &self.script {
            if cancel.load(Ordering::Acquire) {
                return Err(BackendError::new("mock run cancelled"));
            }

            if let Some(step_delay) = self.step_delay {
                tokio::time::sleep(step_delay).await;
                if cancel.load(Ordering::Acquire) {
                    return Err(BackendError::new("mock run cancelled"));
                }
            }

            match action {
                ScriptAction::Emit(event) => on_event(event.clone()),
                ScriptAction::Fail(message) => return Err(BackendError::new(message.clone())),
            }
        }

        Ok(())
    }
}

fn step(
    id: &str,
    status: StepEventStatus,
    data: Option<StepPayload>,
    summary: Option<RunSummary>,
) -> StreamEvent {
    StreamEvent::Step {
        step: id.to_string(),
        status,
        message: None,
        data,
        summary,
    }
}

fn canned_recipe(id: i64, title: &str, ready_in_minutes: u32, ingredients: Vec<&str>) -> Recipe {
    Recipe {
        id,
        title: title.to_string(),
        image: format!("https://img.spoonacular.com/recipes/{id}-312x231.jpg"),
        ready_in_minutes,
        nutrition: NutritionInfo {
            calories: Some(420.0),
            protein: Some(21.0),
            ..NutritionInfo::default()
        },
        ingredients: ingredients
            .into_iter()
            .map(|name| Ingredient {
                name: name.to_string(),
                amount: 1.0,
                unit: "serving".to_string(),
            })
            .collect(),
        analyzed_instructions: vec![
            InstructionStep {
                number: 1,
                step: "Preheat the oven and prep the ingredients.".to_string(),
                length: 10,
            },
            InstructionStep {
                number: 2,
                step: "Combine everything and cook until done.".to_string(),
                length: ready_in_minutes.saturating_sub(10),
            },
        ],
        ..Recipe::default()
    }
}
