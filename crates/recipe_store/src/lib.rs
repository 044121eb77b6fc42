//! Client for the recipe persistence collaborator plus local
//! saved-membership tracking.
//!
//! The chat core needs nothing from a saved recipe beyond its id; this
//! crate keeps that boundary explicit with [`SavedRecipes`] and treats the
//! persistence contract (`GET/POST /api/recipe`, `DELETE /api/recipe/{id}`)
//! as opaque JSON.

mod client;
mod error;
mod saved;

pub use client::{RecipeStoreClient, RecipeStoreConfig, DEFAULT_STORE_BASE_URL};
pub use error::RecipeStoreError;
pub use saved::SavedRecipes;
