use std::path::Path;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};

use crate::config::ChatApiConfig;
use crate::error::{parse_error_message, ChatApiError};
use crate::headers::{build_headers, ACCEPT_EVENT_STREAM, ACCEPT_JSON};
use crate::payload::ChatRequest;
use crate::responses::{ClearResponse, HistoryMessage, HistoryResponse, UploadReceipt};
use crate::url::{endpoint_url, Endpoint};

/// Raw response body chunks of a streamed generation request, in arrival order.
pub type ByteStream = BoxStream<'static, Result<Bytes, ChatApiError>>;

#[derive(Debug)]
pub struct ChatApiClient {
    http: Client,
    config: ChatApiConfig,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        let base = config.base_url.trim();
        if !base.is_empty() && !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ChatApiError::InvalidBaseUrl(config.base_url.clone()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ChatApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        endpoint_url(&self.config.base_url, endpoint)
    }

    pub fn build_headers(&self, accept: &str, json_body: bool) -> Result<HeaderMap, ChatApiError> {
        let headers = build_headers(&self.config, accept, json_body)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| ChatApiError::InvalidHeader(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    ChatApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    /// Build the streaming POST for one generation turn without sending it.
    pub fn build_stream_request(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::RequestBuilder, ChatApiError> {
        validate_chat_request(request)?;

        let headers = self.build_headers(ACCEPT_EVENT_STREAM, true)?;
        Ok(self
            .http
            .post(self.endpoint_url(request.endpoint()))
            .headers(headers)
            .json(request))
    }

    /// Send a generation request and hand back its body as raw chunks.
    ///
    /// A non-success status is returned as [`ChatApiError::Status`] without
    /// exposing the body as a stream.
    pub async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, ChatApiError> {
        let response = self.build_stream_request(request)?.send().await?;
        let response = ensure_success(response).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ChatApiError::from))
            .boxed())
    }

    /// Upload a document for retrieval-augmented chat.
    pub async fn upload_document(&self, path: &Path) -> Result<UploadReceipt, ChatApiError> {
        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| ChatApiError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ChatApiError::InvalidRequest(format!("{} has no file name", path.display()))
            })?;

        let form = Form::new().part("file", Part::bytes(contents).file_name(file_name));
        let response = self
            .http
            .post(self.endpoint_url(Endpoint::Upload))
            .headers(self.build_headers(ACCEPT_JSON, false)?)
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body = response.text().await?;
        serde_json::from_str::<UploadReceipt>(&body).map_err(ChatApiError::from)
    }

    /// Fetch the backend's server-side conversation history.
    pub async fn history(&self) -> Result<Vec<HistoryMessage>, ChatApiError> {
        let response = self
            .http
            .get(self.endpoint_url(Endpoint::History))
            .headers(self.build_headers(ACCEPT_JSON, false)?)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body = response.text().await?;
        let parsed = serde_json::from_str::<HistoryResponse>(&body)?;
        Ok(parsed.messages)
    }

    /// Clear the backend's server-side conversation history.
    pub async fn clear_history(&self) -> Result<(), ChatApiError> {
        let response = self
            .http
            .post(self.endpoint_url(Endpoint::Clear))
            .headers(self.build_headers(ACCEPT_JSON, false)?)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body = response.text().await?;
        let parsed = serde_json::from_str::<ClearResponse>(&body)?;
        match parsed.status.as_deref() {
            Some("success") => Ok(()),
            other => Err(ChatApiError::UnexpectedResponse(format!(
                "clear returned status {other:?}"
            ))),
        }
    }
}

fn validate_chat_request(request: &ChatRequest) -> Result<(), ChatApiError> {
    if request.message.trim().is_empty() {
        return Err(ChatApiError::InvalidRequest(
            "'message' must not be empty".to_owned(),
        ));
    }

    if let Some(doc_id) = request.doc_id.as_deref() {
        if doc_id.trim().is_empty() {
            return Err(ChatApiError::InvalidRequest(
                "'doc_id' must not be empty when present".to_owned(),
            ));
        }
    }

    Ok(())
}

async fn ensure_success(response: Response) -> Result<Response, ChatApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_else(|_| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    Err(ChatApiError::Status(status, parse_error_message(status, &body)))
}
