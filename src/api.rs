//! HTTP client for the CSV / ratio backend.
//!
//! Every call is a single attempt. Transport failures, timeouts and non-2xx
//! responses all surface as [`ApiError`]; when the body of a failed response
//! is JSON with an `error` field, that message is kept for display.

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::config::Config;
use crate::error::ApiError;
use crate::form::{ExportKind, ExportPayload, RatioRow, Ticker};

/// The backend calls the controller needs.
pub trait ExportApi {
    /// POST the payload to the kind's CSV endpoint and return the raw bytes.
    fn export_csv(
        &self,
        kind: ExportKind,
        payload: &ExportPayload,
    ) -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;

    /// POST `/api/debt-to-equity` and return the yearly ratios.
    fn debt_to_equity(
        &self,
        ticker: &Ticker,
    ) -> impl Future<Output = Result<Vec<RatioRow>, ApiError>> + Send;

    /// GET `/api/health`.
    fn health(&self) -> impl Future<Output = Result<HealthResponse, ApiError>> + Send;
}

#[derive(Debug, Serialize)]
struct TickerRequest<'a> {
    ticker: &'a Ticker,
}

/// Body of `/api/debt-to-equity`: either `data` or `error`.
#[derive(Debug, Deserialize)]
struct RatioResponse {
    data: Option<Vec<RatioRow>>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// `error` field of a JSON error body, if the body is one.
pub fn server_error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|message| !message.trim().is_empty())
}

/// [`ExportApi`] over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path);
        log::debug!("POST {url}");
        let response = self.http.post(&url).json(body).send().await?;
        read_body(response).await
    }
}

/// Body bytes of a 2xx response, or the status and server message otherwise.
async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        Ok(body.to_vec())
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
            message: server_error_message(&body),
        })
    }
}

impl ExportApi for HttpApi {
    async fn export_csv(
        &self,
        kind: ExportKind,
        payload: &ExportPayload,
    ) -> Result<Vec<u8>, ApiError> {
        let bytes = self.post_json(kind.endpoint(), payload).await?;
        log::debug!("{} returned {} bytes", kind.endpoint(), bytes.len());
        Ok(bytes)
    }

    async fn debt_to_equity(&self, ticker: &Ticker) -> Result<Vec<RatioRow>, ApiError> {
        let body = self
            .post_json("/api/debt-to-equity", &TickerRequest { ticker })
            .await?;
        parse_ratio_response(&body)
    }

    async fn health(&self) -> Result<HealthResponse, ApiError> {
        let url = self.url("/api/health");
        log::debug!("GET {url}");
        let response = self.http.get(&url).send().await?;
        let body = read_body(response).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn parse_ratio_response(body: &[u8]) -> Result<Vec<RatioRow>, ApiError> {
    let response: RatioResponse = serde_json::from_slice(body)?;
    match (response.data, response.error) {
        (_, Some(error)) if !error.trim().is_empty() => Err(ApiError::Server(error)),
        (Some(data), _) => Ok(data),
        (None, _) => Err(ApiError::MissingData),
    }
}
