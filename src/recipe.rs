use serde::{Deserialize, Serialize};

/// Displayable, savable recipe unit passed through the stream untouched.
///
/// The protocol core relies on `id` only (saved-membership identity); every
/// other field is tolerated-by-default so backend additions never fail a
/// stream mid-flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ready_in_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooking_minutes: Option<u32>,
    #[serde(default)]
    pub nutrition: NutritionInfo,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub analyzed_instructions: Vec<InstructionStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_ingredients: Option<Vec<IngredientMatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_ingredients: Option<Vec<IngredientMatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_ingredient_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_ingredient_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrates: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
}

/// One numbered instruction, pre-flattened by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionStep {
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub step: String,
    /// Duration in minutes; zero when the backend reports none.
    #[serde(default)]
    pub length: u32,
}

/// Ingredient-search match entry attached by ingredient-based discovery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientMatch {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
}
