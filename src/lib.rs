//! Protocol core for the Sous recipe-discovery chat.
//!
//! Invariant: a [`WorkflowState`] is owned by exactly one assistant message
//! and mutated only through [`WorkflowState::apply`], which folds stream
//! events strictly in line-arrival order.
//!
//! # Public API Overview
//! - Decode NDJSON records into [`StreamEvent`]s with
//!   [`StreamEvent::parse_line`]; malformed lines reject individually and
//!   never fail a stream.
//! - Fold events into [`WorkflowState`] and read derived progress from it.
//! - Implement [`ChatBackend`] to supply a stream source (HTTP transport,
//!   scripted mock).
//! - Derive user-visible rows with [`project`] against a [`StepCatalog`].
//!
//! This crate intentionally excludes transport, persistence, and rendering
//! concerns; those live in the workspace member crates.

pub mod backend;
pub mod events;
pub mod projection;
pub mod recipe;
pub mod steps;
pub mod workflow;

pub use backend::{BackendError, CancelSignal, ChatBackend, ChatSubmission};
pub use events::{ParseError, RunSummary, StepEventStatus, StepPayload, StreamEvent};
pub use projection::{project, StepRow, WorkflowView, GENERIC_FAILURE_TEXT};
pub use recipe::{Ingredient, IngredientMatch, InstructionStep, NutritionInfo, Recipe};
pub use steps::{StepCatalog, StepInfo};
pub use workflow::{StepStatus, WorkflowState};
