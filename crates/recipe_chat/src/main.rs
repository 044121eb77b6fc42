use std::io::{self, BufRead, Write};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use agent_api::{AgentApiClient, AgentApiConfig};
use agent_api_mock::ScriptedAgent;
use conversation::{run_submission, Conversation, DraftImage};
use recipe_store::{RecipeStoreClient, RecipeStoreConfig, SavedRecipes};
use sous::{
    project, BackendError, CancelSignal, ChatBackend, ChatSubmission, Recipe, StepCatalog,
    StreamEvent,
};

mod commands;
mod render;

use commands::{parse_slash_command, SlashCommand};

pub const BACKEND_ENV_VAR: &str = "RECIPE_CHAT_BACKEND";
pub const AGENT_URL_ENV_VAR: &str = "RECIPE_CHAT_AGENT_URL";
pub const STORE_URL_ENV_VAR: &str = "RECIPE_CHAT_STORE_URL";
pub const SESSION_COOKIE_ENV_VAR: &str = "RECIPE_CHAT_SESSION_COOKIE";
pub const LOG_ENV_VAR: &str = "RECIPE_CHAT_LOG";

const HELP_TEXT: &str = "Commands: /help, /image <path>, /remove-image, /save <number>, /unsave <id>, /saved, /quit";
const MOCK_STEP_DELAY: Duration = Duration::from_millis(350);

/// Forwards a backend's events unchanged while echoing progress lines, so
/// the terminal shows steps as they stream.
struct ProgressEcho {
    inner: Arc<dyn ChatBackend>,
    catalog: StepCatalog,
}

#[async_trait]
impl ChatBackend for ProgressEcho {
    async fn run(
        &self,
        submission: ChatSubmission,
        cancel: CancelSignal,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> Result<(), BackendError> {
        let catalog = self.catalog;
        self.inner
            .run(submission, cancel, &mut |event| {
                if let Some(line) = render::event_line(&catalog, &event) {
                    println!("{line}");
                }
                on_event(event);
            })
            .await
    }
}

fn backend_from_env() -> Result<Arc<dyn ChatBackend>, String> {
    match std::env::var(BACKEND_ENV_VAR).as_deref() {
        Ok("mock") => Ok(Arc::new(
            ScriptedAgent::default().with_step_delay(MOCK_STEP_DELAY),
        )),
        Ok("http") => {
            let base_url = std::env::var(AGENT_URL_ENV_VAR).unwrap_or_default();
            let mut config = if base_url.trim().is_empty() {
                AgentApiConfig::default()
            } else {
                AgentApiConfig::new(base_url)
            };
            if let Ok(session_cookie) = std::env::var(SESSION_COOKIE_ENV_VAR) {
                config = config.with_session_cookie(session_cookie);
            }
            let client = AgentApiClient::new(config).map_err(|error| error.to_string())?;
            Ok(Arc::new(client))
        }
        Ok(other) => Err(format!(
            "Unknown {BACKEND_ENV_VAR} '{other}'; expected 'mock' or 'http'"
        )),
        Err(_) => Err(format!("{BACKEND_ENV_VAR} must be set to 'mock' or 'http'")),
    }
}

fn store_from_env() -> Result<Option<RecipeStoreClient>, String> {
    let Ok(base_url) = std::env::var(STORE_URL_ENV_VAR) else {
        return Ok(None);
    };

    let mut config = RecipeStoreConfig::new(base_url);
    if let Ok(session_cookie) = std::env::var(SESSION_COOKIE_ENV_VAR) {
        config = config.with_session_cookie(session_cookie);
    }

    RecipeStoreClient::new(config)
        .map(Some)
        .map_err(|error| error.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let backend = backend_from_env().map_err(io::Error::other)?;
    let backend = ProgressEcho {
        inner: backend,
        catalog: StepCatalog::default_catalog(),
    };
    let store = store_from_env().map_err(io::Error::other)?;

    let mut conversation = Conversation::new();
    let mut saved = SavedRecipes::new();
    let mut last_recipes: Vec<Recipe> = Vec::new();
    let catalog = StepCatalog::default_catalog();

    println!("Sous recipe chat. {HELP_TEXT}");

    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim().to_string();
        // An empty line still sends when an image is staged (image-only ask).
        if input.is_empty() && conversation.draft_image().is_none() {
            continue;
        }

        if let Some(command) = parse_slash_command(&input) {
            match command {
                SlashCommand::Help => println!("{HELP_TEXT}"),
                SlashCommand::Image(path) => match std::fs::read(&path) {
                    Ok(bytes) if bytes.is_empty() => println!("{path} is empty"),
                    Ok(bytes) => {
                        conversation.attach_image(DraftImage {
                            preview: path.clone(),
                            base64: agent_api::encode_image(&bytes),
                        });
                        println!(
                            "Attached {path}; type a question, or press enter to send the image alone"
                        );
                    }
                    Err(error) => println!("Could not read {path}: {error}"),
                },
                SlashCommand::RemoveImage => {
                    conversation.remove_image();
                    println!("Image removed");
                }
                SlashCommand::Save(position) => {
                    save_recipe(&mut saved, store.as_ref(), &last_recipes, position).await;
                }
                SlashCommand::Unsave(id) => {
                    unsave_recipe(&mut saved, store.as_ref(), id).await;
                }
                SlashCommand::Saved => list_saved(&saved, store.as_ref()).await,
                SlashCommand::Quit => break,
                SlashCommand::Unknown(command) => {
                    println!("Unknown command: {command}. {HELP_TEXT}")
                }
            }
            continue;
        }

        if !input.is_empty() {
            conversation.set_draft_text(input);
        }
        if !conversation.can_submit() {
            println!("Nothing to send");
            continue;
        }

        let cancel = CancelSignal::default();
        let submitted = {
            let driver = run_submission(&mut conversation, &backend, Arc::clone(&cancel));
            tokio::pin!(driver);
            loop {
                tokio::select! {
                    result = &mut driver => break result,
                    _ = tokio::signal::ctrl_c() => {
                        cancel.store(true, Ordering::Release);
                        println!("(cancelling...)");
                    }
                }
            }
        };

        if let Err(error) = submitted {
            println!("{error}");
            continue;
        }
        if cancel.load(Ordering::Acquire) {
            println!("(request cancelled)");
            continue;
        }

        let Some(workflow) = conversation
            .messages()
            .last()
            .and_then(|message| message.workflow.as_ref())
        else {
            continue;
        };
        let view = project(workflow, &catalog);
        last_recipes = view.recipes.clone();
        print!("{}", render::final_block(&view));
    }

    Ok(())
}

async fn save_recipe(
    saved: &mut SavedRecipes,
    store: Option<&RecipeStoreClient>,
    last_recipes: &[Recipe],
    position: usize,
) {
    let Some(recipe) = position.checked_sub(1).and_then(|index| last_recipes.get(index)) else {
        println!("No recipe #{position} in the last answer");
        return;
    };

    if let Some(client) = store {
        if let Err(error) = client.save(recipe).await {
            tracing::error!(%error, recipe_id = recipe.id, "failed to persist recipe");
            println!("Could not save \"{}\" right now", recipe.title);
            return;
        }
    }

    if saved.mark_saved(recipe.id) {
        println!("Saved \"{}\" ({})", recipe.title, recipe.id);
    } else {
        println!("\"{}\" is already saved", recipe.title);
    }
}

async fn unsave_recipe(saved: &mut SavedRecipes, store: Option<&RecipeStoreClient>, id: i64) {
    if let Some(client) = store {
        if let Err(error) = client.delete(id).await {
            tracing::error!(%error, recipe_id = id, "failed to delete recipe");
            println!("Could not remove recipe {id} right now");
            return;
        }
    }

    if saved.mark_removed(id) {
        println!("Removed recipe {id}");
    } else {
        println!("Recipe {id} was not saved");
    }
}

async fn list_saved(saved: &SavedRecipes, store: Option<&RecipeStoreClient>) {
    if let Some(client) = store {
        match client.list().await {
            Ok(recipes) => {
                if recipes.is_empty() {
                    println!("No saved recipes yet");
                }
                for recipe in &recipes {
                    println!("  {} ({})", recipe.title, recipe.id);
                }
                return;
            }
            Err(error) => {
                tracing::error!(%error, "failed to list saved recipes");
                println!("Could not reach the recipe store; showing local state");
            }
        }
    }

    if saved.is_empty() {
        println!("No saved recipes yet");
    } else {
        let ids: Vec<String> = saved.ids().map(|id| id.to_string()).collect();
        println!("{} saved: {}", saved.len(), ids.join(", "));
    }
}
