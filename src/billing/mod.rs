//! Billing API access.
//!
//! The workflow talks to the enterprise billing REST API only through the
//! [`BillingApi`] trait. [`BillingClient`] is the real implementation; it
//! also carries the dry-run short-circuit so every call site behaves the
//! same way.

pub mod auth;
pub mod client;
pub mod models;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::ProvisionResult;

pub use auth::{resolve_token, TokenSource};
pub use client::BillingClient;
pub use models::{AssignmentResponse, BudgetCreatedResponse, CostCenterCreatedResponse};

/// One call to the billing API, relative to the API root.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }

    /// Human-readable description used for dry runs.
    pub fn describe(&self) -> String {
        let mut text = format!("{} {}", self.method, self.path);
        if let Some(body) = &self.body {
            let pretty = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
            text.push('\n');
            text.push_str(&pretty);
        }
        text
    }
}

/// Raw outcome of a billing call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status, `None` for dry runs.
    pub status: Option<u16>,
    /// Response body as received.
    pub body: String,
}

impl ApiResponse {
    /// The empty successful result a dry run hands back.
    pub fn dry_run() -> Self {
        Self {
            status: None,
            body: String::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.status.is_none()
    }

    /// Body parsed as JSON; an empty body reads as `{}`.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        if self.body.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&self.body)
    }
}

/// Transport used by the provisioning workflow.
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Perform one call. Non-success statuses are returned as errors.
    async fn send(&self, request: &ApiRequest) -> ProvisionResult<ApiResponse>;
}

/// `/enterprises/{enterprise}/settings/billing` prefix shared by every call.
pub fn enterprise_billing_path(enterprise: &str) -> String {
    format!("/enterprises/{}/settings/billing", enterprise)
}
