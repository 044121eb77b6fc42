use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::DEFAULT_AGENT_BASE_URL;

/// Transport configuration for recipe-agent requests.
///
/// The chat protocol itself is auth-agnostic; whatever credential the
/// deployment requires travels as an opaque cookie or extra header.
#[derive(Debug, Clone)]
pub struct AgentApiConfig {
    /// Base URL of the agent service.
    pub base_url: String,
    /// Optional session cookie forwarded verbatim in `Cookie`.
    pub session_cookie: Option<String>,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional whole-request timeout.
    ///
    /// Left unset by default: the stream has no protocol-level deadline and
    /// relies on transport error signaling instead.
    pub timeout: Option<Duration>,
}

impl Default for AgentApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AGENT_BASE_URL.to_string(),
            session_cookie: None,
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }
}

impl AgentApiConfig {
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

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_headers.extend(headers);
        self
    }
}
