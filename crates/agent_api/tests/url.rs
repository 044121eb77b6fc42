use agent_api::normalize_chat_url;
use agent_api::url::DEFAULT_AGENT_BASE_URL;

#[test]
fn bare_host_gains_the_api_chat_path() {
    assert_eq!(
        normalize_chat_url("http://localhost:8000"),
        "http://localhost:8000/api/chat"
    );
}

#[test]
fn trailing_slashes_are_collapsed() {
    assert_eq!(
        normalize_chat_url("http://localhost:8000///"),
        "http://localhost:8000/api/chat"
    );
}

#[test]
fn api_suffix_gains_only_chat() {
    assert_eq!(
        normalize_chat_url("https://agent.example.com/api"),
        "https://agent.example.com/api/chat"
    );
}

#[test]
fn full_endpoint_is_left_unchanged() {
    assert_eq!(
        normalize_chat_url("https://agent.example.com/api/chat"),
        "https://agent.example.com/api/chat"
    );
}

#[test]
fn blank_input_falls_back_to_the_default_base() {
    assert_eq!(
        normalize_chat_url("   "),
        format!("{DEFAULT_AGENT_BASE_URL}/api/chat")
    );
}
