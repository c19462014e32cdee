use reqwest::StatusCode;

use chat_api::error::{parse_error_message, ChatApiError};

#[test]
fn parse_error_message_reads_backend_error_string() {
    let body = r#"{"error":"No file part"}"#;
    let message = parse_error_message(StatusCode::BAD_REQUEST, body);
    assert_eq!(message, "No file part");
}

#[test]
fn parse_error_message_reads_nested_message() {
    let body = r#"{"error":{"message":"document not found"}}"#;
    let message = parse_error_message(StatusCode::NOT_FOUND, body);
    assert_eq!(message, "document not found");
}

#[test]
fn parse_error_message_falls_back_to_raw_body() {
    let body = "raw failure text";
    let message = parse_error_message(StatusCode::INTERNAL_SERVER_ERROR, body);
    assert_eq!(message, "raw failure text");
}

#[test]
fn parse_error_message_falls_back_to_status_reason() {
    let message = parse_error_message(StatusCode::SERVICE_UNAVAILABLE, "  ");
    assert_eq!(message, "Service Unavailable");
}

#[test]
fn status_is_reported_only_for_response_failures() {
    let error = ChatApiError::Status(StatusCode::BAD_GATEWAY, "upstream gone".into());
    assert_eq!(error.status(), Some(StatusCode::BAD_GATEWAY));
    assert!(!error.is_body_error());

    let error = ChatApiError::InvalidRequest("empty message".into());
    assert_eq!(error.status(), None);
    assert!(!error.is_body_error());
}
