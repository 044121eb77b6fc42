use std::time::Duration;

use agent_api::retry::{is_retryable_http_error, retry_delay, BASE_DELAY_MS, MAX_RETRIES};

#[test]
fn transient_statuses_are_retryable() {
    for status in [429, 500, 502, 503, 504] {
        assert!(is_retryable_http_error(status, ""), "status {status}");
    }
}

#[test]
fn client_errors_are_not_retryable() {
    for status in [400, 401, 403, 404, 422] {
        assert!(!is_retryable_http_error(status, "bad input"), "status {status}");
    }
}

#[test]
fn transient_error_text_is_retryable_regardless_of_status() {
    assert!(is_retryable_http_error(400, "upstream connect error"));
    assert!(is_retryable_http_error(400, "Connection reset by peer"));
    assert!(is_retryable_http_error(400, "service temporarily unavailable"));
}

#[test]
fn backoff_delay_doubles_per_attempt() {
    assert_eq!(retry_delay(0), Duration::from_millis(BASE_DELAY_MS));
    assert_eq!(retry_delay(1), Duration::from_millis(BASE_DELAY_MS * 2));
    assert_eq!(retry_delay(2), Duration::from_millis(BASE_DELAY_MS * 4));
}

#[test]
fn max_retries_is_bounded() {
    assert!(MAX_RETRIES <= 5);
}
