use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use sous::Recipe;

use crate::error::{status_error, RecipeStoreError};

/// Default base URL for the recipe persistence service.
pub const DEFAULT_STORE_BASE_URL: &str = "http://localhost:3000";

/// Configuration for the recipe persistence client.
#[derive(Debug, Clone)]
pub struct RecipeStoreConfig {
    pub base_url: String,
    /// Session cookie forwarded verbatim; persistence is gated on auth,
    /// which this client treats as opaque.
    pub session_cookie: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for RecipeStoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STORE_BASE_URL.to_string(),
            session_cookie: None,
            timeout: None,
        }
    }
}

impl RecipeStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_session_cookie(mut self, session_cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(session_cookie.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Deserialize)]
struct SavedRecipesPage {
    #[serde(default)]
    recipes: Vec<Recipe>,
    #[serde(default)]
    count: usize,
}

/// Thin client for the `GET/POST /api/recipe` and `DELETE /api/recipe/{id}`
/// collaborator endpoints.
#[derive(Debug)]
pub struct RecipeStoreClient {
    http: Client,
    config: RecipeStoreConfig,
}

impl RecipeStoreClient {
    pub fn new(config: RecipeStoreConfig) -> Result<Self, RecipeStoreError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(RecipeStoreError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RecipeStoreConfig {
        &self.config
    }

    /// Base-relative endpoint for the recipe collection.
    pub fn collection_endpoint(&self) -> String {
        format!(
            "{}/api/recipe",
            self.config.base_url.trim().trim_end_matches('/')
        )
    }

    /// Base-relative endpoint for one saved recipe.
    pub fn recipe_endpoint(&self, id: i64) -> String {
        format!("{}/{id}", self.collection_endpoint())
    }

    /// Fetches the caller's saved recipes.
    pub async fn list(&self) -> Result<Vec<Recipe>, RecipeStoreError> {
        let response = self
            .http
            .get(self.collection_endpoint())
            .headers(self.headers()?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, &response.text().await.unwrap_or_default()));
        }

        let page = response.json::<SavedRecipesPage>().await?;
        tracing::debug!(count = page.count, "fetched saved recipes");
        Ok(page.recipes)
    }

    /// Saves one recipe. A conflict means the recipe is already saved and
    /// counts as success for membership purposes.
    pub async fn save(&self, recipe: &Recipe) -> Result<(), RecipeStoreError> {
        let response = self
            .http
            .post(self.collection_endpoint())
            .headers(self.headers()?)
            .json(recipe)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::CONFLICT {
            return Ok(());
        }

        Err(status_error(status, &response.text().await.unwrap_or_default()))
    }

    /// Deletes one saved recipe by id.
    pub async fn delete(&self, id: i64) -> Result<(), RecipeStoreError> {
        let response = self
            .http
            .delete(self.recipe_endpoint(id))
            .headers(self.headers()?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, &response.text().await.unwrap_or_default()));
        }

        Ok(())
    }

    fn headers(&self) -> Result<HeaderMap, RecipeStoreError> {
        let mut raw = BTreeMap::new();
        raw.insert("accept".to_string(), "application/json".to_string());
        if let Some(session_cookie) = &self.config.session_cookie {
            if !session_cookie.trim().is_empty() {
                raw.insert("cookie".to_string(), session_cookie.trim().to_string());
            }
        }

        let mut headers = HeaderMap::new();
        for (key, value) in raw {
            headers.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| RecipeStoreError::InvalidHeader(key.clone()))?,
                HeaderValue::from_str(&value)
                    .map_err(|_| RecipeStoreError::InvalidHeader(key.clone()))?,
            );
        }
        Ok(headers)
    }
}
