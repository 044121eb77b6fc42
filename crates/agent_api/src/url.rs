/// Default base URL for the recipe agent service.
pub const DEFAULT_AGENT_BASE_URL: &str = "http://localhost:8000";

/// Normalize a base URL to the agent's streaming chat endpoint.
///
/// Normalization rules:
/// 1) keep `/api/chat` unchanged
/// 2) append `/chat` when path ends in `/api`
/// 3) append `/api/chat` otherwise
pub fn normalize_chat_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_AGENT_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/api/chat") {
        return trimmed.to_string();
    }
    if trimmed.ends_with("/api") {
        return format!("{trimmed}/chat");
    }
    format!("{trimmed}/api/chat")
}
