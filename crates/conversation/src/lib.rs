//! Conversation store for the Sous chat: ordered transcript, draft input,
//! and the per-submission stream lifecycle.
//!
//! Ownership contract: each assistant placeholder's workflow state belongs
//! to exactly one in-flight request and is mutated only by this store's
//! event routing, on the single task that owns the request. Terminal paths
//! (finish, fail, abandon) all release the request, so the input surface is
//! never left permanently disabled.

mod driver;
mod error;
mod message;
mod store;

pub use driver::run_submission;
pub use error::SubmitError;
pub use message::{ConversationMessage, Role};
pub use store::{Conversation, DraftImage, PendingSubmission};
