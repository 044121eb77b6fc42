//! Transport-only client for the recipe agent's streaming chat endpoint.
//!
//! This crate owns request building, NDJSON line framing, per-line event
//! decoding hand-off, retry, and cancellation for `POST {base}/api/chat`.
//! It intentionally contains no conversation state and no rendering
//! coupling; decoded [`sous::StreamEvent`]s are handed to the caller in
//! line-arrival order.
//!
//! Error containment contract: one malformed NDJSON line is dropped with a
//! logged diagnostic and never fails the stream; only transport-level
//! failures (non-2xx status, connection errors, an empty stream) reject the
//! request.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod ndjson;
pub mod payload;
pub mod retry;
pub mod url;

pub use client::AgentApiClient;
pub use config::AgentApiConfig;
pub use error::AgentApiError;
pub use ndjson::NdjsonStreamParser;
pub use payload::{encode_image, image_submission, text_submission, validate_submission};
pub use url::normalize_chat_url;
