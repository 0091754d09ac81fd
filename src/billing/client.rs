//! HTTP client for the enterprise billing REST API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use tracing::{debug, instrument};

use super::{ApiRequest, ApiResponse, BillingApi};
use crate::error::{ProvisionError, ProvisionResult};
use crate::settings::Settings;

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";

enum Mode {
    Live { client: Client, token: String },
    DryRun,
}

/// Billing API client.
///
/// In dry-run mode no request ever leaves the process; each call is
/// described on stderr instead, keeping stdout for the summary.
pub struct BillingClient {
    api_url: String,
    api_version: String,
    mode: Mode,
}

impl BillingClient {
    /// Create a client that sends real requests.
    pub fn live(settings: &Settings, token: impl Into<String>) -> ProvisionResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ProvisionError::Auth("an API token is required".to_string()));
        }

        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_version: settings.api_version.clone(),
            mode: Mode::Live { client, token },
        })
    }

    /// Create a client that only describes what it would send.
    pub fn dry_run(settings: &Settings) -> Self {
        Self {
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_version: settings.api_version.clone(),
            mode: Mode::DryRun,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self.mode, Mode::DryRun)
    }

    /// Full URL for a path relative to the API root.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn headers(&self, token: &str) -> ProvisionResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GITHUB_JSON));
        headers.insert(
            API_VERSION_HEADER,
            HeaderValue::from_str(&self.api_version).map_err(|e| {
                ProvisionError::InvalidInput(format!("invalid api_version header: {}", e))
            })?,
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ProvisionError::Auth("token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }
}

#[async_trait]
impl BillingApi for BillingClient {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: &ApiRequest) -> ProvisionResult<ApiResponse> {
        let (client, token) = match &self.mode {
            Mode::DryRun => {
                eprintln!("[dry-run] {}", request.describe());
                return Ok(ApiResponse::dry_run());
            }
            Mode::Live { client, token } => (client, token),
        };

        let url = self.url_for(&request.path);
        debug!(url = %url, "Sending billing API request");

        let mut builder = client
            .request(request.method.clone(), &url)
            .headers(self.headers(token)?);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Billing API responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProvisionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;

        Ok(ApiResponse {
            status: Some(status.as_u16()),
            body,
        })
    }
}
