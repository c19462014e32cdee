use chat_api::{endpoint_url, Endpoint, DEFAULT_BASE_URL};

#[test]
fn url_resolution_appends_api_prefix_to_bare_host() {
    assert_eq!(
        endpoint_url("http://localhost:5006", Endpoint::ChatStream),
        "http://localhost:5006/api/chat/stream"
    );
}

#[test]
fn url_resolution_keeps_existing_api_prefix() {
    assert_eq!(
        endpoint_url("http://localhost:5006/api/", Endpoint::ChatRag),
        "http://localhost:5006/api/chat/rag"
    );
}

#[test]
fn url_resolution_falls_back_to_default_base() {
    assert_eq!(
        endpoint_url("  ", Endpoint::Upload),
        format!("{DEFAULT_BASE_URL}/api/upload")
    );
}

#[test]
fn url_resolution_covers_history_routes() {
    assert_eq!(
        endpoint_url("https://chat.example.com//", Endpoint::History),
        "https://chat.example.com/api/chat/history"
    );
    assert_eq!(
        endpoint_url("https://chat.example.com", Endpoint::Clear),
        "https://chat.example.com/api/chat/clear"
    );
}
