//! HTTP execution of backend operations.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::StatusCode;
use serde::Deserialize;

use super::Backend;
use super::query::Page;
use super::query::QueryParams;
use super::query::decode_page;
use crate::GridClient;
use crate::error::ApiError;
use crate::model::Row;
use crate::model::RowId;
use crate::model::RowPatch;

/// Error body sent by the backend with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[async_trait]
impl Backend for GridClient {
    async fn fetch_page(&self, params: &QueryParams) -> Result<Page, ApiError> {
        let query = params.to_query_string();
        let url = if query.is_empty() {
            self.collection_url().to_string()
        } else {
            format!("{}?{}", self.collection_url(), query)
        };

        let response = self.request(Method::GET, &url, None).await?;
        let body = response.text().await?;
        decode_page(&body, params.page_size())
    }

    async fn create(&self, fields: &RowPatch) -> Result<Row, ApiError> {
        let response = self
            .request(Method::POST, self.collection_url(), Some(fields.to_json()))
            .await?;
        let body = response.text().await?;

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ApiError::malformed_with_body(format!("invalid JSON: {}", e), &body))?;
        Row::from_json(value)
            .map_err(|e| ApiError::malformed_with_body(format!("created row: {}", e), &body))
    }

    async fn update(&self, row: &Row) -> Result<Option<Row>, ApiError> {
        let body = serde_json::to_value(row)
            .map_err(|e| ApiError::malformed(format!("cannot encode row {}: {}", row.id(), e)))?;
        let response = self
            .request(Method::PUT, &self.row_url(row.id()), Some(body))
            .await?;
        let body = response.text().await?;

        if body.trim().is_empty() {
            return Ok(None);
        }

        // The echo is optional; an unreadable one falls back to the local merge.
        match serde_json::from_str::<Row>(&body) {
            Ok(echo) if echo.id() == row.id() => Ok(Some(echo)),
            Ok(echo) => {
                log::warn!("update of {} echoed row {}; ignoring echo", row.id(), echo.id());
                Ok(None)
            }
            Err(e) => {
                log::warn!("update of {} returned an unreadable echo: {}", row.id(), e);
                Ok(None)
            }
        }
    }

    async fn delete(&self, id: &RowId) -> Result<(), ApiError> {
        self.request(Method::DELETE, &self.row_url(id), None).await?;
        Ok(())
    }
}

impl GridClient {
    /// Makes an HTTP request under the concurrency limit.
    ///
    /// Non-2xx responses become [`ApiError::Server`]. No retries.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let _permit = self.inner.concurrency_limiter.acquire().await?;

        log::debug!("{} {}", method, url);

        let mut request = self.inner.http_client.request(method.clone(), url);
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| match self.inner.timeout {
            Some(timeout) if e.is_timeout() => ApiError::Timeout(timeout),
            _ => ApiError::Transport(e),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        log::debug!("{} {} failed: {} {}", method, url, status.as_u16(), message);
        Err(ApiError::server(status.as_u16(), message))
    }
}

/// Extracts `{"message": ...}` from an error body, falling back to the raw
/// body or the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}
