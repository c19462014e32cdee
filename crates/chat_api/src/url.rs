/// Default base URL of a locally running chat backend.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5006";

/// Backend routes known to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ChatStream,
    ChatRag,
    Upload,
    History,
    Clear,
}

impl Endpoint {
    /// Route path relative to the `/api` prefix.
    pub fn path(&self) -> &'static str {
        match self {
            Self::ChatStream => "chat/stream",
            Self::ChatRag => "chat/rag",
            Self::Upload => "upload",
            Self::History => "chat/history",
            Self::Clear => "chat/clear",
        }
    }
}

/// Resolve an endpoint against a base URL.
///
/// Normalization rules:
/// 1) an empty base falls back to [`DEFAULT_BASE_URL`]
/// 2) trailing slashes are dropped
/// 3) `/api` is appended unless the base already ends with it
pub fn endpoint_url(base: &str, endpoint: Endpoint) -> String {
    let base = if base.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        base.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/api") {
        return format!("{trimmed}/{}", endpoint.path());
    }
    format!("{trimmed}/api/{}", endpoint.path())
}
