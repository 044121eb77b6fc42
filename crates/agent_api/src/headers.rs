use std::collections::BTreeMap;

use crate::config::AgentApiConfig;
use crate::error::AgentApiError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_COOKIE: &str = "cookie";
pub const HEADER_USER_AGENT: &str = "user-agent";

const NDJSON_MEDIA_TYPE: &str = "application/x-ndjson";
const DEFAULT_USER_AGENT: &str = concat!("sous/", env!("CARGO_PKG_VERSION"));

/// Build a deterministic header map for agent chat requests.
pub fn build_headers(config: &AgentApiConfig) -> Result<BTreeMap<String, String>, AgentApiError> {
    let mut headers = BTreeMap::new();

    headers.insert(HEADER_ACCEPT.to_owned(), NDJSON_MEDIA_TYPE.to_owned());
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );

    let user_agent = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_USER_AGENT);
    headers.insert(HEADER_USER_AGENT.to_owned(), user_agent.to_owned());

    for (key, value) in &config.extra_headers {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(AgentApiError::InvalidRequest(
                "extra header with empty name".to_owned(),
            ));
        }
        headers.insert(key, value.trim().to_owned());
    }

    if let Some(session_cookie) = &config.session_cookie {
        if !session_cookie.trim().is_empty() {
            headers.insert(HEADER_COOKIE.to_owned(), session_cookie.trim().to_owned());
        }
    }

    Ok(headers)
}
