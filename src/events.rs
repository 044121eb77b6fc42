use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::recipe::Recipe;

/// Step identifiers the agent is known to emit payload-bearing data for.
pub const STEP_ANALYZE_IMAGE: &str = "analyze_image";
pub const STEP_FORMAT_INGREDIENTS: &str = "format_ingredients";
pub const STEP_SEARCH_RECIPES: &str = "search_recipes";
pub const STEP_GET_DETAILS: &str = "get_details";
pub const STEP_SEARCH: &str = "search";

/// Progress marker carried by a `step` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepEventStatus {
    InProgress,
    Complete,
}

/// Typed step data keyed by the emitting step, with an opaque fallback so
/// backend-added step kinds degrade instead of failing the line.
#[derive(Debug, Clone, PartialEq)]
pub enum StepPayload {
    IngredientAnalysis {
        ingredients_count: u32,
        ingredients: Vec<String>,
    },
    RecipeSearch {
        recipe_count: u32,
    },
    Opaque(Value),
}

impl StepPayload {
    /// Maps a raw `data` object onto the typed payload for `step`.
    ///
    /// A payload that fails its typed decode is preserved opaquely rather
    /// than dropped; unknown steps are always opaque.
    fn from_wire(step: &str, data: Value) -> Self {
        match step {
            STEP_ANALYZE_IMAGE => match serde_json::from_value::<IngredientAnalysisData>(data.clone()) {
                Ok(parsed) => Self::IngredientAnalysis {
                    ingredients_count: parsed.ingredients_count,
                    ingredients: parsed.ingredients,
                },
                Err(_) => Self::Opaque(data),
            },
            STEP_SEARCH_RECIPES | STEP_SEARCH => {
                match serde_json::from_value::<RecipeSearchData>(data.clone()) {
                    Ok(parsed) => Self::RecipeSearch {
                        recipe_count: parsed.recipe_count,
                    },
                    Err(_) => Self::Opaque(data),
                }
            }
            _ => Self::Opaque(data),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IngredientAnalysisData {
    #[serde(default)]
    ingredients_count: u32,
    #[serde(default)]
    ingredients: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RecipeSearchData {
    recipe_count: u32,
}

/// Run-level summary the agent attaches to late-stage records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ingredients_found: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients_used_for_search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_recipes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// One decoded record of the agent's NDJSON progress stream.
///
/// The top-level `type` field is the canonical discriminant; `step` is only
/// ever a step identifier. An `Error` without a step id is a
/// conversation-level failure, not a step failure.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Step {
        step: String,
        status: StepEventStatus,
        message: Option<String>,
        data: Option<StepPayload>,
        summary: Option<RunSummary>,
    },
    Complete {
        message: Option<String>,
        recipes: Option<Vec<Recipe>>,
        summary: Option<RunSummary>,
    },
    Error {
        step: Option<String>,
        message: Option<String>,
    },
}

impl StreamEvent {
    /// Decodes one trimmed, non-empty stream line.
    ///
    /// Failure covers this line only; callers log the diagnostic and keep
    /// consuming subsequent lines.
    pub fn parse_line(line: &str) -> Result<Self, ParseError> {
        let raw: RawRecord =
            serde_json::from_str(line).map_err(|source| ParseError::new(line, source))?;

        Ok(match raw {
            RawRecord::Step {
                step,
                status,
                message,
                data,
                summary,
            } => {
                let data = data.map(|value| StepPayload::from_wire(&step, value));
                Self::Step {
                    step,
                    status,
                    message,
                    data,
                    summary,
                }
            }
            RawRecord::Complete {
                message,
                recipes,
                summary,
            } => Self::Complete {
                message,
                recipes,
                summary,
            },
            RawRecord::Error { step, message } => Self::Error { step, message },
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawRecord {
    Step {
        step: String,
        status: StepEventStatus,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        data: Option<Value>,
        #[serde(default)]
        summary: Option<RunSummary>,
    },
    Complete {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        recipes: Option<Vec<Recipe>>,
        #[serde(default)]
        summary: Option<RunSummary>,
    },
    Error {
        #[serde(default)]
        step: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

/// Rejection of a single malformed stream line.
#[derive(Debug)]
pub struct ParseError {
    line: String,
    source: serde_json::Error,
}

const PARSE_ERROR_PREVIEW_LEN: usize = 120;

impl ParseError {
    fn new(line: &str, source: serde_json::Error) -> Self {
        Self {
            line: line.to_string(),
            source,
        }
    }

    /// Returns the offending line, truncated for log output.
    #[must_use]
    pub fn line_preview(&self) -> &str {
        match self.line.char_indices().nth(PARSE_ERROR_PREVIEW_LEN) {
            Some((index, _)) => &self.line[..index],
            None => &self.line,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "malformed stream record ({}): {}",
            self.line_preview(),
            self.source
        )
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::{StepEventStatus, StepPayload, StreamEvent};

    #[test]
    fn parse_line_maps_step_records() {
        let event = StreamEvent::parse_line(
            r#"{"type":"step","step":"search_recipes","status":"complete","data":{"recipe_count":4}}"#,
        )
        .expect("step record should parse");

        assert_eq!(
            event,
            StreamEvent::Step {
                step: "search_recipes".to_string(),
                status: StepEventStatus::Complete,
                message: None,
                data: Some(StepPayload::RecipeSearch { recipe_count: 4 }),
                summary: None,
            }
        );
    }

    #[test]
    fn parse_line_maps_ingredient_analysis_payload() {
        let event = StreamEvent::parse_line(
            r#"{"type":"step","step":"analyze_image","status":"complete","message":"Found 2 ingredients","data":{"ingredients_count":2,"ingredients":["eggs","kale"]}}"#,
        )
        .expect("analysis record should parse");

        let StreamEvent::Step { data, .. } = event else {
            panic!("expected step event");
        };
        assert_eq!(
            data,
            Some(StepPayload::IngredientAnalysis {
                ingredients_count: 2,
                ingredients: vec!["eggs".to_string(), "kale".to_string()],
            })
        );
    }

    #[test]
    fn parse_line_keeps_unknown_step_payload_opaque() {
        let event = StreamEvent::parse_line(
            r#"{"type":"step","step":"rank_recipes","status":"complete","data":{"scored":12}}"#,
        )
        .expect("unknown step should still parse");

        let StreamEvent::Step { step, data, .. } = event else {
            panic!("expected step event");
        };
        assert_eq!(step, "rank_recipes");
        assert!(matches!(data, Some(StepPayload::Opaque(_))));
    }

    #[test]
    fn parse_line_falls_back_to_opaque_on_shape_mismatch() {
        let event = StreamEvent::parse_line(
            r#"{"type":"step","step":"search_recipes","status":"complete","data":{"recipe_count":"four"}}"#,
        )
        .expect("mismatched payload should degrade, not fail");

        let StreamEvent::Step { data, .. } = event else {
            panic!("expected step event");
        };
        assert!(matches!(data, Some(StepPayload::Opaque(_))));
    }

    #[test]
    fn parse_line_distinguishes_step_and_conversation_errors() {
        let step_error =
            StreamEvent::parse_line(r#"{"type":"error","step":"get_details","message":"bulk lookup failed"}"#)
                .expect("step error should parse");
        assert!(matches!(step_error, StreamEvent::Error { step: Some(_), .. }));

        let conversation_error =
            StreamEvent::parse_line(r#"{"type":"error","message":"vision service unavailable"}"#)
                .expect("conversation error should parse");
        assert!(matches!(
            conversation_error,
            StreamEvent::Error { step: None, .. }
        ));
    }

    #[test]
    fn parse_line_rejects_missing_discriminant_and_broken_json() {
        assert!(StreamEvent::parse_line(r#"{"step":"search","status":"complete"}"#).is_err());
        assert!(StreamEvent::parse_line(r#"{"type":"banquet"}"#).is_err());
        assert!(StreamEvent::parse_line("{broken").is_err());
    }

    #[test]
    fn parse_error_preview_truncates_long_lines() {
        let long_line = format!("{{\"type\":\"step\",\"junk\":\"{}\"", "x".repeat(500));
        let error = StreamEvent::parse_line(&long_line).expect_err("line should fail");
        assert_eq!(error.line_preview().chars().count(), 120);
        assert!(error.to_string().contains("malformed stream record"));
    }
}
