use std::future::Future;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};

use sous::{BackendError, CancelSignal, ChatBackend, ChatSubmission, StreamEvent};

use crate::config::AgentApiConfig;
use crate::error::{parse_error_message, AgentApiError};
use crate::headers::build_headers;
use crate::ndjson::NdjsonStreamParser;
use crate::payload::validate_submission;
use crate::retry::{is_retryable_http_error, retry_delay, MAX_RETRIES};
use crate::url::normalize_chat_url;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Streaming HTTP client for the recipe agent's chat endpoint.
#[derive(Debug)]
pub struct AgentApiClient {
    http: Client,
    config: AgentApiConfig,
}

impl AgentApiClient {
    pub fn new(config: AgentApiConfig) -> Result<Self, AgentApiError> {
        let base = config.base_url.trim();
        if !base.is_empty() && !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(AgentApiError::InvalidBaseUrl(config.base_url.clone()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(AgentApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AgentApiConfig {
        &self.config
    }

    pub fn chat_endpoint(&self) -> String {
        normalize_chat_url(&self.config.base_url)
    }

    pub fn build_header_map(&self) -> Result<HeaderMap, AgentApiError> {
        let headers = build_headers(&self.config)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    AgentApiError::InvalidRequest(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    AgentApiError::InvalidRequest(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        submission: &ChatSubmission,
    ) -> Result<reqwest::RequestBuilder, AgentApiError> {
        validate_submission(submission)?;

        let headers = self.build_header_map()?;
        Ok(self
            .http
            .post(self.chat_endpoint())
            .headers(headers)
            .json(submission))
    }

    /// Sends the chat request, retrying transient failures until the first
    /// success. Applies only before streaming begins; an interrupted stream
    /// is never replayed.
    pub async fn send_with_retry(
        &self,
        submission: &ChatSubmission,
        cancellation: Option<&CancelSignal>,
    ) -> Result<Response, AgentApiError> {
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if is_cancelled(cancellation) {
                return Err(AgentApiError::Cancelled);
            }

            let response = self.build_request(submission)?.send();
            let response = await_or_cancel(response, cancellation)
                .await?
                .map_err(AgentApiError::from);

            match response {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let status = response.status();
                    last_status = Some(status);
                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_default();
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if attempt < MAX_RETRIES && is_retryable_http_error(status.as_u16(), &message) {
                        tracing::debug!(status = status.as_u16(), attempt, "retrying chat request");
                        await_or_cancel(tokio::time::sleep(retry_delay(attempt)), cancellation)
                            .await?;
                        continue;
                    }

                    return Err(AgentApiError::Status(status, message));
                }
                Err(error) => {
                    let message = error.to_string();
                    last_error = Some(message);
                    if attempt < MAX_RETRIES {
                        tracing::debug!(attempt, "retrying chat request after transport error");
                        await_or_cancel(tokio::time::sleep(retry_delay(attempt)), cancellation)
                            .await?;
                        continue;
                    }
                    return Err(AgentApiError::RetryExhausted {
                        status: last_status,
                        last_error,
                    });
                }
            }
        }

        Err(AgentApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    /// Streams the agent response, delivering each decoded event to
    /// `on_event` in line-arrival order.
    ///
    /// Malformed lines are dropped with a warning and never fail the stream;
    /// a stream that ends before any record was delivered is a transport
    /// failure (`EmptyStream`).
    pub async fn stream_with_handler<F>(
        &self,
        submission: &ChatSubmission,
        cancellation: Option<&CancelSignal>,
        mut on_event: F,
    ) -> Result<(), AgentApiError>
    where
        F: FnMut(StreamEvent),
    {
        let response = self.send_with_retry(submission, cancellation).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = NdjsonStreamParser::default();
        let mut delivered = 0usize;

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(AgentApiError::Cancelled);
            }
            let chunk = chunk.map_err(AgentApiError::from)?;
            for line in parser.feed(&chunk) {
                deliver_line(&line, &mut delivered, &mut on_event);
            }
        }

        if let Some(line) = parser.finish() {
            deliver_line(&line, &mut delivered, &mut on_event);
        }

        if is_cancelled(cancellation) {
            return Err(AgentApiError::Cancelled);
        }

        if delivered == 0 {
            return Err(AgentApiError::EmptyStream);
        }

        Ok(())
    }

    /// Collects the whole stream into a vector of events.
    pub async fn stream(
        &self,
        submission: &ChatSubmission,
        cancellation: Option<&CancelSignal>,
    ) -> Result<Vec<StreamEvent>, AgentApiError> {
        let mut events = Vec::new();
        self.stream_with_handler(submission, cancellation, |event| {
            events.push(event);
        })
        .await?;
        Ok(events)
    }
}

#[async_trait]
impl ChatBackend for AgentApiClient {
    async fn run(
        &self,
        submission: ChatSubmission,
        cancel: CancelSignal,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> Result<(), BackendError> {
        self.stream_with_handler(&submission, Some(&cancel), |event| on_event(event))
            .await
            .map_err(|error| BackendError::new(error.to_string()))
    }
}

fn deliver_line<F>(line: &str, delivered: &mut usize, on_event: &mut F)
where
    F: FnMut(StreamEvent),
{
    match StreamEvent::parse_line(line) {
        Ok(event) => {
            *delivered += 1;
            on_event(event);
        }
        Err(error) => {
            tracing::warn!(%error, "dropping malformed stream line");
        }
    }
}

fn is_cancelled(cancel: Option<&CancelSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancelSignal>,
) -> Result<F::Output, AgentApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(AgentApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(AgentApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
